pub mod config;
pub use config::{MarketConfig, PopulationConfig, SimConfig};

use crate::agent::{Agent, AgentSummary};
use crate::error::Result;
use crate::history::{HistorySink, RunId};
use crate::market::Market;
use crate::random::{self, RandomSource};
use crate::strategies::Action;
use indicatif::{ProgressBar, ProgressStyle};
use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Anything the loop can schedule against the market.
pub trait Participant {
    /// Called right before `act`, with the slot in this iteration's order.
    fn set_position(&mut self, position: usize);
    fn act(&mut self, market: &mut Market, rng: &mut dyn RngCore) -> Action;
}

/// One iteration's turns: a fresh random order, every participant acts once,
/// each seeing the price left by the ones before it.
pub fn run_iteration<P, R>(market: &mut Market, agents: &mut [P], rng: &mut R)
where
    P: Participant,
    R: RngCore,
{
    let mut order: Vec<usize> = (0..agents.len()).collect();
    order.shuffle(rng);

    for (position, &idx) in order.iter().enumerate() {
        let agent = &mut agents[idx];
        agent.set_position(position);
        agent.act(market, rng);
    }
}

/// Runs `iterations` full iterations, closing each one on the market.
pub fn run_iterations<P, R>(
    market: &mut Market,
    agents: &mut [P],
    iterations: u64,
    rng: &mut R,
    progress: &ProgressBar,
) -> Result<()>
where
    P: Participant,
    R: RngCore,
{
    for _ in 0..iterations {
        run_iteration(market, agents, rng);
        market.new_iteration()?;

        progress.inc(1);
        progress.set_message(format!(
            "Price: {:.2} | Stock: {}",
            market.price(),
            market.stock()
        ));
        debug!(
            "Iteration {} closed at {:.2} with {} in stock",
            market.iteration(),
            market.price(),
            market.stock()
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub run_id: RunId,
    pub seed: u64,
    pub iterations: u64,
    pub final_price: f64,
    pub final_stock: u64,
    pub agents: Vec<AgentSummary>,
}

pub struct Simulation {
    config: SimConfig,
    seed: u64,
    market: Market,
    agents: Vec<Agent>,
    rng: RandomSource,
}

impl Simulation {
    pub fn new(config: SimConfig, sink: Box<dyn HistorySink>) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let market = Market::new(
            config.market.initial_price,
            config.market.initial_stock,
            config.iterations,
            sink,
        )?;
        let agents = config.agents.build();

        Ok(Self {
            config,
            seed,
            market,
            agents,
            rng: random::source(Some(seed)),
        })
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run(&mut self) -> Result<RunReport> {
        let iterations = self.market.iterations_remaining();

        info!("Starting simulation: {}", self.config.name);
        info!("Run {} with seed {}", self.market.run_id(), self.seed);
        info!("Agents: {}, Iterations: {}", self.agents.len(), iterations);

        if iterations == 0 {
            warn!("Run {} has no iterations left", self.market.run_id());
            return Ok(self.report());
        }

        let pb = if self.config.show_progress {
            ProgressBar::new(iterations)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} {msg}")?
                .progress_chars("█▓░"),
        );

        run_iterations(
            &mut self.market,
            &mut self.agents,
            iterations,
            &mut self.rng,
            &pb,
        )?;
        pb.finish_with_message("Simulation complete");

        info!(
            "Final price {:.2} (started at {:.2}), stock {}",
            self.market.price(),
            self.config.market.initial_price,
            self.market.stock()
        );
        Ok(self.report())
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            name: self.config.name.clone(),
            run_id: self.market.run_id(),
            seed: self.seed,
            iterations: self.market.iteration(),
            final_price: self.market.price(),
            final_stock: self.market.stock(),
            agents: self.agents.iter().map(Agent::summary).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;

    #[derive(Default)]
    struct HoldingAgent {
        position: Option<usize>,
        positions_seen: Vec<usize>,
        acts: usize,
    }

    impl Participant for HoldingAgent {
        fn set_position(&mut self, position: usize) {
            self.position = Some(position);
        }

        fn act(&mut self, _market: &mut Market, _rng: &mut dyn RngCore) -> Action {
            if let Some(position) = self.position.take() {
                self.positions_seen.push(position);
            }
            self.acts += 1;
            Action::Hold
        }
    }

    /// Buys once per turn, recording the price it saw.
    struct Buyer {
        seen: Vec<f64>,
    }

    impl Participant for Buyer {
        fn set_position(&mut self, _position: usize) {}

        fn act(&mut self, market: &mut Market, _rng: &mut dyn RngCore) -> Action {
            self.seen.push(market.price());
            market.execute_action(Action::Buy, "buyer");
            Action::Buy
        }
    }

    fn market(iterations: u64, history: &MemoryHistory) -> Market {
        Market::new(100.0, 10_000, iterations, Box::new(history.clone())).unwrap()
    }

    #[test]
    fn test_main_loop_counts() {
        let history = MemoryHistory::new();
        let mut market = market(1000, &history);
        let mut agents: Vec<HoldingAgent> = (0..10).map(|_| HoldingAgent::default()).collect();
        let mut rng = random::source(Some(42));

        run_iterations(&mut market, &mut agents, 1000, &mut rng, &ProgressBar::hidden()).unwrap();

        assert_eq!(market.iteration(), 1000);
        assert_eq!(history.flush_count(), 1000);
        assert_eq!(agents.iter().map(|a| a.acts).sum::<usize>(), 10_000);
        for agent in &agents {
            assert_eq!(agent.positions_seen.len(), 1000);
            assert!(agent.positions_seen.iter().all(|&p| p < 10));
        }
        assert!(history.transactions().is_empty());
    }

    #[test]
    fn test_positions_form_a_permutation() {
        let history = MemoryHistory::new();
        let mut market = market(10, &history);
        let mut agents: Vec<HoldingAgent> = (0..5).map(|_| HoldingAgent::default()).collect();
        let mut rng = random::source(Some(1));

        run_iteration(&mut market, &mut agents, &mut rng);

        let mut positions: Vec<usize> = agents.iter().map(|a| a.positions_seen[0]).collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
        assert!(agents.iter().all(|a| a.acts == 1));
    }

    #[test]
    fn test_later_agents_see_earlier_trades() {
        let history = MemoryHistory::new();
        let mut market = market(10, &history);
        let mut agents = vec![Buyer { seen: Vec::new() }, Buyer { seen: Vec::new() }];
        let mut rng = random::source(Some(5));

        run_iteration(&mut market, &mut agents, &mut rng);

        let mut seen: Vec<f64> = agents.iter().flat_map(|a| a.seen.clone()).collect();
        seen.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(seen, vec![100.0, 100.5]);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let config = SimConfig::default().with_seed(2024).with_iterations(200);

        let mut first = Simulation::new(config.clone(), Box::new(MemoryHistory::new())).unwrap();
        let mut second = Simulation::new(config, Box::new(MemoryHistory::new())).unwrap();

        let a = first.run().unwrap();
        let b = second.run().unwrap();

        assert_eq!(a.final_price, b.final_price);
        assert_eq!(a.final_stock, b.final_stock);
        assert_eq!(a.agents, b.agents);
        assert_eq!(a.iterations, 200);
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let config = SimConfig::default().with_seed(1).with_iterations(5);
        let mut sim = Simulation::new(config, Box::new(MemoryHistory::new())).unwrap();

        let first = sim.run().unwrap();
        let second = sim.run().unwrap();

        assert_eq!(first.iterations, 5);
        assert_eq!(second.iterations, 5);
        assert_eq!(first.agents, second.agents);
    }

    #[test]
    fn test_persistence_failure_ends_run() {
        let history = MemoryHistory::new();
        let config = SimConfig::default().with_seed(3).with_iterations(10);
        let mut sim = Simulation::new(config, Box::new(history.clone())).unwrap();

        history.fail_writes(true);
        assert!(sim.run().is_err());
    }
}
