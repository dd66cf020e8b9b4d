use crate::history::RunId;
use crate::strategies::Action;
use serde::{Deserialize, Serialize};

/// One executed trade. `price` is the price after the trade moved the market,
/// which is also what the agent settled at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub run_id: RunId,
    pub iteration: u64,
    pub agent_name: String,
    pub action: Action,
    pub price: f64,
}

/// Market state right after a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub run_id: RunId,
    pub iteration: u64,
    pub price: f64,
    pub stock: u64,
}
