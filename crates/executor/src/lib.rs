//! Market Buy Executor
//!
//! Runs the fixed-JPY buy flow (price → size → market order → log) against
//! each configured exchange adapter, one exchange after another.

pub mod config;
pub mod runner;
pub mod sizing;

pub use config::{load_buy_config, BuyConfig, Credentials, ExchangeSettings, RunMode};
pub use runner::{build_adapter, BuyRunner, FlowOutcome, FlowReport, RunReport};
pub use sizing::{compute_order_size, format_size};

use adapters::AdapterError;
use serde::Deserialize;
use std::str::FromStr;

/// Exchange identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Bitflyer,
    Gmo,
}

impl Exchange {
    /// Prefix of the `{PREFIX}_API_KEY` / `{PREFIX}_API_SECRET` variables
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Exchange::Bitflyer => "BITFLYER",
            Exchange::Gmo => "GMO",
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exchange::Bitflyer => write!(f, "bitflyer"),
            Exchange::Gmo => write!(f, "gmo"),
        }
    }
}

impl FromStr for Exchange {
    type Err = ExecutorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bitflyer" => Ok(Exchange::Bitflyer),
            "gmo" | "gmocoin" => Ok(Exchange::Gmo),
            other => Err(ExecutorError::Config(format!("Unknown exchange: {}", other))),
        }
    }
}

/// Error types for executor operations
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid budget: {0} JPY")]
    InvalidBudget(f64),

    #[error("Invalid price: {0} JPY")]
    InvalidPrice(f64),

    #[error("Order size out of range: {0} BTC")]
    InvalidSize(f64),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
