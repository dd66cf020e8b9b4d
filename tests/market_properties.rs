//! Invariants of the market and of agent settlement, checked over random
//! action sequences and whole seeded runs.

use cardmarket::history::MemoryHistory;
use cardmarket::market::MIN_PRICE;
use cardmarket::prelude::{Action, Agent, Market, SimConfig, Simulation};
use proptest::prelude::*;

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::Buy), Just(Action::Sell), Just(Action::Hold)]
}

fn open_market(price: f64, stock: u64) -> Market {
    Market::new(price, stock, 1000, Box::new(MemoryHistory::new())).unwrap()
}

proptest! {
    #[test]
    fn prop_price_follows_order_flow(
        price in 0.05f64..1000.0,
        stock in 0u64..20,
        actions in prop::collection::vec(action(), 1..200),
    ) {
        let mut market = open_market(price, stock);

        for action in actions {
            let (price_before, stock_before) = (market.price(), market.stock());
            let pending_before = market.pending_transactions().len();
            let filled = market.execute_action(action, "Prop_1");

            match (action, filled) {
                (Action::Buy, true) => {
                    prop_assert_eq!(market.stock(), stock_before - 1);
                    prop_assert!(market.price() > price_before);
                }
                (Action::Sell, true) => {
                    prop_assert_eq!(market.stock(), stock_before + 1);
                    prop_assert!(market.price() < price_before || price_before == MIN_PRICE);
                }
                (Action::Hold, true) => prop_assert!(false, "HOLD must never fill"),
                (_, false) => {
                    prop_assert!(action == Action::Hold || stock_before == 0);
                    prop_assert_eq!(market.stock(), stock_before);
                    prop_assert_eq!(market.price(), price_before);
                    prop_assert_eq!(market.pending_transactions().len(), pending_before);
                }
            }
            prop_assert!(market.price() >= MIN_PRICE);
        }
    }

    #[test]
    fn prop_settlement_moves_balance_by_trade_price(
        balance in 0.0f64..2000.0,
        actions in prop::collection::vec(action(), 1..100),
    ) {
        let mut market = open_market(100.0, 30);
        let mut agent = Agent::random("Prop_1", (balance * 100.0).round() / 100.0);

        for action in actions {
            let (balance_before, holdings_before) = (agent.balance(), agent.holdings());
            let filled = agent.base_act(action, &mut market);

            if filled {
                let price = market.price();
                match action {
                    Action::Buy => {
                        prop_assert!((agent.balance() - (balance_before - price)).abs() < 1e-6);
                        prop_assert_eq!(agent.holdings(), holdings_before + 1);
                    }
                    Action::Sell => {
                        prop_assert!((agent.balance() - (balance_before + price)).abs() < 1e-6);
                        prop_assert_eq!(agent.holdings(), holdings_before - 1);
                    }
                    Action::Hold => prop_assert!(false, "HOLD must never fill"),
                }
            } else {
                prop_assert_eq!(agent.balance(), balance_before);
                prop_assert_eq!(agent.holdings(), holdings_before);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_units_are_conserved(seed in any::<u64>(), stock in 0u64..60) {
        let history = MemoryHistory::new();
        let mut config = SimConfig::default().with_seed(seed).with_iterations(60);
        config.market.initial_stock = stock;

        let mut sim = Simulation::new(config, Box::new(history.clone())).unwrap();
        let report = sim.run().unwrap();

        let held: u64 = report.agents.iter().map(|a| a.holdings).sum();
        prop_assert_eq!(held + report.final_stock, stock);

        prop_assert_eq!(history.flush_count(), 60);
        prop_assert_eq!(history.transactions().len(), history.snapshots().len());
        prop_assert!(sim.market().pending_transactions().is_empty());
    }
}

#[test]
fn scenario_buy_from_fresh_market() {
    let mut market = open_market(100.0, 50);

    assert!(market.execute_action(Action::Buy, "A1"));
    assert_eq!(market.stock(), 49);
    assert_eq!(market.price(), 100.5);
    assert_eq!(market.pending_transactions().len(), 1);
    assert_eq!(market.pending_snapshots().len(), 1);
}

#[test]
fn scenario_history_matches_each_iteration() {
    let history = MemoryHistory::new();
    let config = SimConfig::default().with_seed(77).with_iterations(30);
    let mut sim = Simulation::new(config, Box::new(history.clone())).unwrap();
    sim.run().unwrap();

    // Records arrive grouped by iteration, in order.
    let iterations: Vec<u64> = history.transactions().iter().map(|t| t.iteration).collect();
    assert!(iterations.windows(2).all(|w| w[0] <= w[1]));
    assert!(iterations.iter().all(|&it| it < 30));
    assert!(
        history
            .transactions()
            .iter()
            .all(|t| t.run_id == sim.market().run_id())
    );
}
