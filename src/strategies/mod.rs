pub mod custom;
pub mod random;
pub mod trend;

pub use custom::CustomTrader;
pub use random::RandomTrader;
pub use trend::{TrendDirection, TrendTrader};

use crate::market::MarketView;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// Change in market stock when this action is filled.
    pub fn stock_delta(self) -> i64 {
        match self {
            Action::Buy => -1,
            Action::Sell => 1,
            Action::Hold => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An agent's own books, as its strategy sees them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Account {
    pub balance: f64,
    pub holdings: u64,
    /// 0-based slot in this iteration's random turn order.
    pub position: usize,
}

impl Account {
    pub fn new(balance: f64) -> Self {
        Self {
            balance,
            holdings: 0,
            position: 0,
        }
    }

    pub fn can_afford(&self, price: f64) -> bool {
        self.balance >= price
    }
}

/// The fixed set of decision policies an agent can run.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Random(RandomTrader),
    Trend(TrendTrader),
    Custom(CustomTrader),
}

impl Strategy {
    /// Every value [`Strategy::name`] can return.
    pub const NAMES: [&'static str; 4] = ["random", "trend", "counter-trend", "custom"];

    pub fn decide<R: Rng + ?Sized>(
        &mut self,
        market: &MarketView,
        account: &Account,
        rng: &mut R,
    ) -> Action {
        match self {
            Strategy::Random(trader) => trader.decide(rng),
            Strategy::Trend(trader) => trader.decide(market, rng),
            Strategy::Custom(trader) => trader.decide(market, account, rng),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Random(_) => "random",
            Strategy::Trend(trader) => match trader.direction() {
                TrendDirection::Follow => "trend",
                TrendDirection::Counter => "counter-trend",
            },
            Strategy::Custom(_) => "custom",
        }
    }
}
