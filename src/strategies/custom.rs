//! Stateful heuristic trader.
//!
//! Rules are checked top to bottom and the first match wins:
//!
//! 1. iterations left == holdings: sell, so the book can be flat at the end
//! 2. iterations left == holdings + 1: hold, keeping the last trade in reserve
//! 3. price moved at least 1% either way: buy if a draw in `[0, 100)` lands
//!    below the turn position and the price is affordable, else sell if
//!    holding anything, else hold
//! 4. a fresh draw lands above the turn position and the price is affordable: buy
//! 5. holding and price > 1.7 x highest price ever bought at: sell
//! 6. holding, price affordable and price > 1.1 x highest buy: sell
//! 7. still in the first [`WARMUP_ITERATIONS`] iterations: buy
//! 8. otherwise hold
//!
//! Any BUY decision raises the remembered highest buy price, whether or not
//! the market fills it.

use super::{Account, Action};
use crate::market::MarketView;
use crate::random;
use rand::Rng;

const MOVE_THRESHOLD: f64 = 0.01;
const TAKE_PROFIT_HIGH: f64 = 1.7;
const TAKE_PROFIT_LOW: f64 = 1.1;
pub const WARMUP_ITERATIONS: u64 = 4;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomTrader {
    max_buy_price: f64,
}

impl CustomTrader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_buy_price(mut self, price: f64) -> Self {
        self.max_buy_price = price;
        self
    }

    pub fn max_buy_price(&self) -> f64 {
        self.max_buy_price
    }

    pub fn decide<R: Rng + ?Sized>(
        &mut self,
        market: &MarketView,
        account: &Account,
        rng: &mut R,
    ) -> Action {
        let action = self.choose(market, account, rng);
        if action == Action::Buy {
            self.max_buy_price = self.max_buy_price.max(market.price);
        }
        action
    }

    fn choose<R: Rng + ?Sized>(
        &self,
        market: &MarketView,
        account: &Account,
        rng: &mut R,
    ) -> Action {
        let remaining = market.iterations_remaining();
        let price = market.price;
        let affordable = account.can_afford(price);
        let holding = account.holdings > 0;

        if remaining == account.holdings {
            Action::Sell
        } else if remaining == account.holdings + 1 {
            Action::Hold
        } else if market.has_moved(MOVE_THRESHOLD) {
            if random::percentile(rng) < account.position && affordable {
                Action::Buy
            } else if holding {
                Action::Sell
            } else {
                Action::Hold
            }
        } else if random::percentile(rng) > account.position && affordable {
            Action::Buy
        } else if holding && price > self.max_buy_price * TAKE_PROFIT_HIGH {
            Action::Sell
        } else if holding && affordable && price > self.max_buy_price * TAKE_PROFIT_LOW {
            Action::Sell
        } else if market.iteration < WARMUP_ITERATIONS {
            Action::Buy
        } else {
            Action::Hold
        }
    }
}
