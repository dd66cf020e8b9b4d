use crate::market::{Market, round_cents};
use crate::simulation::Participant;
use crate::strategies::{Account, Action, CustomTrader, RandomTrader, Strategy, TrendDirection, TrendTrader};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A trader with its own cash and units, driven by one [`Strategy`].
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    account: Account,
    strategy: Strategy,
}

/// Read-only view of an agent for end-of-run reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub name: String,
    pub strategy: String,
    pub balance: f64,
    pub holdings: u64,
}

impl Agent {
    pub fn new(name: impl Into<String>, balance: f64, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            account: Account::new(balance),
            strategy,
        }
    }

    pub fn random(name: impl Into<String>, balance: f64) -> Self {
        Self::new(name, balance, Strategy::Random(RandomTrader))
    }

    pub fn trend(name: impl Into<String>, balance: f64, direction: TrendDirection) -> Self {
        Self::new(name, balance, Strategy::Trend(TrendTrader::new(direction)))
    }

    pub fn custom(name: impl Into<String>, balance: f64) -> Self {
        Self::new(name, balance, Strategy::Custom(CustomTrader::new()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> f64 {
        self.account.balance
    }

    pub fn holdings(&self) -> u64 {
        self.account.holdings
    }

    pub fn position(&self) -> usize {
        self.account.position
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Lets the strategy decide, then tries to carry the decision out.
    /// Returns what the strategy asked for, filled or not.
    pub fn act<R: RngCore + ?Sized>(&mut self, market: &mut Market, rng: &mut R) -> Action {
        let decision = self.strategy.decide(&market.view(), &self.account, rng);
        self.base_act(decision, market);
        decision
    }

    /// Executes one unit of `action` and settles it at the price the trade
    /// left the market at. Any rejection leaves the agent untouched.
    pub fn base_act(&mut self, action: Action, market: &mut Market) -> bool {
        match action {
            Action::Hold => return false,
            Action::Buy if !self.account.can_afford(market.price()) => {
                trace!("{} cannot afford {:.2}", self.name, market.price());
                return false;
            }
            Action::Sell if self.account.holdings == 0 => {
                trace!("{} has nothing to sell", self.name);
                return false;
            }
            _ => {}
        }

        if !market.execute_action(action, &self.name) {
            return false;
        }

        let price = market.price();
        match action {
            Action::Buy => {
                self.account.balance = round_cents(self.account.balance - price);
                self.account.holdings += 1;
            }
            Action::Sell => {
                self.account.balance = round_cents(self.account.balance + price);
                self.account.holdings -= 1;
            }
            Action::Hold => {}
        }
        true
    }

    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            name: self.name.clone(),
            strategy: self.strategy.name().to_string(),
            balance: self.account.balance,
            holdings: self.account.holdings,
        }
    }
}

impl Participant for Agent {
    fn set_position(&mut self, position: usize) {
        self.account.position = position;
    }

    fn act(&mut self, market: &mut Market, rng: &mut dyn RngCore) -> Action {
        Agent::act(self, market, rng)
    }
}
