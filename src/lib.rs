//! Agent-based simulation of a single-commodity market.
//!
//! A population of traders buys and sells graphics cards against a market
//! maker whose price moves mechanically with order flow. Each iteration the
//! traders act once, in a fresh random order, and the market then closes the
//! period and hands its trade history to a [`history::HistorySink`].

pub mod agent;
pub mod error;
pub mod history;
pub mod market;
pub mod random;
pub mod simulation;
pub mod strategies;

pub use agent::{Agent, AgentSummary};
pub use error::{Result, SimError};
pub use market::Market;
pub use simulation::{RunReport, SimConfig, Simulation};
pub use strategies::{Action, Strategy};

pub mod prelude {
    pub use crate::agent::{Agent, AgentSummary};
    pub use crate::history::{CsvHistory, HistorySink, MemoryHistory, RunId};
    pub use crate::market::{Market, MarketView};
    pub use crate::simulation::{Participant, RunReport, SimConfig, Simulation};
    pub use crate::strategies::{Action, Strategy, TrendDirection};
}
