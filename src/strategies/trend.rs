//! Trend trader.
//!
//! Watches how far the price has travelled since the previous iteration closed.
//! A move of at least [`TREND_THRESHOLD`] in the trader's favoured direction
//! makes it lean towards buying; otherwise it mostly sits still and
//! occasionally takes profit.
//!
//! - `Follow` (+1) favours up-moves: momentum.
//! - `Counter` (-1) favours down-moves: buys the dip.

use super::Action;
use crate::error::SimError;
use crate::market::MarketView;
use crate::random;
use rand::Rng;

/// Minimum relative move that counts as a trend.
pub const TREND_THRESHOLD: f64 = 0.01;

/// Weight of BUY (vs HOLD) when the trend is favourable.
const BUY_ON_TREND_PERCENT: u32 = 75;
/// Weight of SELL (vs HOLD) otherwise.
const SELL_OFF_TREND_PERCENT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Follow,
    Counter,
}

impl TryFrom<i32> for TrendDirection {
    type Error = SimError;

    fn try_from(sign: i32) -> Result<Self, Self::Error> {
        match sign {
            1 => Ok(TrendDirection::Follow),
            -1 => Ok(TrendDirection::Counter),
            other => Err(SimError::config(format!(
                "trend direction must be 1 or -1, got {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendTrader {
    direction: TrendDirection,
}

impl TrendTrader {
    pub fn new(direction: TrendDirection) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> TrendDirection {
        self.direction
    }

    pub fn in_favour(&self, market: &MarketView) -> bool {
        match self.direction {
            TrendDirection::Follow => market.moved_up(TREND_THRESHOLD),
            TrendDirection::Counter => market.moved_down(TREND_THRESHOLD),
        }
    }

    pub fn decide<R: Rng + ?Sized>(&self, market: &MarketView, rng: &mut R) -> Action {
        if self.in_favour(market) {
            if random::chance(rng, BUY_ON_TREND_PERCENT) {
                Action::Buy
            } else {
                Action::Hold
            }
        } else if random::chance(rng, SELL_OFF_TREND_PERCENT) {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}
