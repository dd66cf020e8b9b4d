//! The market maker every agent trades against.
//!
//! There is no order book. Each unit bought or sold moves the price by a fixed
//! percentage: a BUY takes one unit out of stock and pushes the price up, a
//! SELL puts one back and pushes it down. Prices are kept in whole cents, and
//! every fill moves the price by at least one cent, never below [`MIN_PRICE`].

pub mod record;

pub use record::{MarketSnapshot, TransactionRecord};

use crate::error::{Result, SimError};
use crate::history::{HistorySink, RunId};
use crate::strategies::Action;
use tracing::{debug, info, trace};

/// Price move per traded unit, in percent.
pub const PRICE_STEP_PERCENT: f64 = 0.5;

/// Lowest quotable price: one cent.
pub const MIN_PRICE: f64 = 0.01;

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// What an agent gets to see when it makes a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketView {
    pub price: f64,
    /// Price at the end of the previous iteration.
    pub previous_price: f64,
    pub stock: u64,
    pub iteration: u64,
    pub iteration_limit: u64,
}

impl MarketView {
    pub fn iterations_remaining(&self) -> u64 {
        self.iteration_limit.saturating_sub(self.iteration)
    }

    pub fn moved_up(&self, fraction: f64) -> bool {
        self.price >= self.previous_price * (1.0 + fraction)
    }

    pub fn moved_down(&self, fraction: f64) -> bool {
        self.price <= self.previous_price * (1.0 - fraction)
    }

    /// Moved by at least `fraction` since the previous iteration, either way.
    pub fn has_moved(&self, fraction: f64) -> bool {
        self.moved_up(fraction) || self.moved_down(fraction)
    }
}

#[derive(Debug)]
pub struct Market {
    price: f64,
    previous_price: f64,
    stock: u64,
    iteration: u64,
    iteration_limit: u64,
    run_id: RunId,
    transactions: Vec<TransactionRecord>,
    snapshots: Vec<MarketSnapshot>,
    sink: Box<dyn HistorySink>,
}

impl Market {
    /// Opens a new run on `sink` and starts the market at `initial_price`.
    pub fn new(
        initial_price: f64,
        stock: u64,
        iteration_limit: u64,
        mut sink: Box<dyn HistorySink>,
    ) -> Result<Self> {
        if !(initial_price.is_finite() && initial_price >= MIN_PRICE) {
            return Err(SimError::config(format!(
                "initial price must be at least {:.2}, got {}",
                MIN_PRICE, initial_price
            )));
        }
        if iteration_limit == 0 {
            return Err(SimError::config("iteration limit must be at least 1"));
        }

        let run_id = sink.begin_run()?;
        info!(
            "Market opened for run {}: price {:.2}, stock {}, {} iterations",
            run_id, initial_price, stock, iteration_limit
        );

        Ok(Self {
            price: initial_price,
            previous_price: initial_price,
            stock,
            iteration: 0,
            iteration_limit,
            run_id,
            transactions: Vec::new(),
            snapshots: Vec::new(),
            sink,
        })
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn previous_price(&self) -> f64 {
        self.previous_price
    }

    pub fn stock(&self) -> u64 {
        self.stock
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn iteration_limit(&self) -> u64 {
        self.iteration_limit
    }

    pub fn iterations_remaining(&self) -> u64 {
        self.view().iterations_remaining()
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn pending_transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn pending_snapshots(&self) -> &[MarketSnapshot] {
        &self.snapshots
    }

    pub fn view(&self) -> MarketView {
        MarketView {
            price: self.price,
            previous_price: self.previous_price,
            stock: self.stock,
            iteration: self.iteration,
            iteration_limit: self.iteration_limit,
        }
    }

    /// Executes one unit of `action` for `agent_name`.
    ///
    /// Returns `false` without touching any state when the market cannot
    /// fill: a BUY against empty stock, or a HOLD (which has nothing to fill).
    pub fn execute_action(&mut self, action: Action, agent_name: &str) -> bool {
        if action == Action::Hold {
            return false;
        }
        let Some(stock) = self.stock.checked_add_signed(action.stock_delta()) else {
            trace!("{} tried to buy from an empty market", agent_name);
            return false;
        };

        self.stock = stock;
        self.adjust_price(action);
        self.log_transaction(agent_name, action);
        self.log_market_change();

        debug!(
            "[it {}] {} {} -> price {:.2}, stock {}",
            self.iteration, agent_name, action, self.price, self.stock
        );
        true
    }

    /// Closes the current iteration: the closing price becomes the trend
    /// baseline for the next one and the pending history is flushed.
    pub fn new_iteration(&mut self) -> Result<()> {
        self.iteration += 1;
        self.previous_price = self.price;
        self.save_and_clear_logs()
    }

    /// A unit taken out of stock raises the price, a unit put back lowers it.
    fn adjust_price(&mut self, action: Action) {
        let price = self.price;
        self.price = if action.stock_delta() < 0 {
            let stepped = round_cents(price * (1.0 + PRICE_STEP_PERCENT / 100.0));
            stepped.max(round_cents(price + MIN_PRICE))
        } else {
            let stepped = round_cents(price * (1.0 - PRICE_STEP_PERCENT / 100.0));
            stepped.min(round_cents(price - MIN_PRICE)).max(MIN_PRICE)
        };
    }

    fn log_transaction(&mut self, agent_name: &str, action: Action) {
        self.transactions.push(TransactionRecord {
            run_id: self.run_id,
            iteration: self.iteration,
            agent_name: agent_name.to_string(),
            action,
            price: self.price,
        });
    }

    fn log_market_change(&mut self) {
        self.snapshots.push(MarketSnapshot {
            run_id: self.run_id,
            iteration: self.iteration,
            price: self.price,
            stock: self.stock,
        });
    }

    fn save_and_clear_logs(&mut self) -> Result<()> {
        for snapshot in &self.snapshots {
            self.sink.record_snapshot(snapshot)?;
        }
        for transaction in &self.transactions {
            self.sink.record_transaction(transaction)?;
        }
        self.sink.flush(self.run_id)?;

        debug!(
            "Flushed {} trades for run {} (now at iteration {})",
            self.transactions.len(),
            self.run_id,
            self.iteration
        );

        self.snapshots.clear();
        self.transactions.clear();
        Ok(())
    }
}
