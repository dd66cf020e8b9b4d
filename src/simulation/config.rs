use crate::agent::Agent;
use crate::error::{Result, SimError};
use crate::market::MIN_PRICE;
use crate::strategies::TrendDirection;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    /// Fixed seed for a reproducible run; drawn at random when absent.
    pub seed: Option<u64>,
    pub iterations: u64,
    pub market: MarketConfig,
    pub agents: PopulationConfig,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub initial_price: f64,
    pub initial_stock: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub random_agents: u32,
    pub follow_trend_agents: u32,
    pub counter_trend_agents: u32,
    pub custom_agents: u32,
    /// Starting cash for every agent.
    pub balance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "graphics_cards".to_string(),
            seed: None,
            iterations: 1000,
            market: MarketConfig::default(),
            agents: PopulationConfig::default(),
            show_progress: false,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            initial_price: 200.0,
            initial_stock: 100,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            random_agents: 10,
            follow_trend_agents: 5,
            counter_trend_agents: 5,
            custom_agents: 1,
            balance: 1000.0,
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(SimError::config("iterations must be at least 1"));
        }
        if !(self.market.initial_price.is_finite() && self.market.initial_price >= MIN_PRICE) {
            return Err(SimError::config(format!(
                "initial price must be at least {:.2}, got {}",
                MIN_PRICE, self.market.initial_price
            )));
        }
        if !(self.agents.balance.is_finite() && self.agents.balance >= 0.0) {
            return Err(SimError::config(format!(
                "agent balance must be non-negative, got {}",
                self.agents.balance
            )));
        }
        if self.agents.total()? == 0 {
            return Err(SimError::config("population is empty"));
        }
        Ok(())
    }
}

impl PopulationConfig {
    pub fn total(&self) -> Result<u32> {
        [
            self.follow_trend_agents,
            self.counter_trend_agents,
            self.custom_agents,
        ]
        .into_iter()
        .try_fold(self.random_agents, u32::checked_add)
        .ok_or_else(|| SimError::config("population size overflows u32"))
    }

    /// Instantiates the population. Names are unique within the run.
    pub fn build(&self) -> Vec<Agent> {
        let balance = self.balance;
        let mut agents = Vec::with_capacity(self.total().unwrap_or(0) as usize);

        for i in 1..=self.random_agents {
            agents.push(Agent::random(format!("Random_{}", i), balance));
        }
        for i in 1..=self.follow_trend_agents {
            agents.push(Agent::trend(format!("Trend_{}", i), balance, TrendDirection::Follow));
        }
        for i in 1..=self.counter_trend_agents {
            agents.push(Agent::trend(format!("Counter_{}", i), balance, TrendDirection::Counter));
        }
        if self.custom_agents == 1 {
            agents.push(Agent::custom("CustomAgent", balance));
        } else {
            for i in 1..=self.custom_agents {
                agents.push(Agent::custom(format!("Custom_{}", i), balance));
            }
        }

        agents
    }
}
