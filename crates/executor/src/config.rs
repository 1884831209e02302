//! Configuration loading for the buy run
//!
//! Defaults, then an optional TOML file, then environment overrides. The
//! binary applies command line flags last. Credentials only ever come from
//! the environment.
//!
//! # Example
//!
//! ```ignore
//! use executor::config::load_buy_config;
//!
//! let config = load_buy_config(Some("config/market_buy.toml"))?;
//! ```

use crate::{Exchange, ExecutorError, Result};
use adapters::traits::{AdapterConfig, ErrorPolicy};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Budget used when nothing overrides it
pub const DEFAULT_BUDGET_JPY: f64 = 10_000.0;

/// API key and secret for one exchange
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    /// Reads `{PREFIX}_API_KEY` and `{PREFIX}_API_SECRET`
    ///
    /// Missing variables become empty strings; the exchange rejects the
    /// request later with an authentication error.
    pub fn from_env(exchange: Exchange) -> Self {
        Self::from_lookup(exchange, |k| std::env::var(k).ok())
    }

    pub fn from_lookup(exchange: Exchange, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let prefix = exchange.env_prefix();
        Self {
            api_key: lookup(&format!("{}_API_KEY", prefix)).unwrap_or_default(),
            api_secret: lookup(&format!("{}_API_SECRET", prefix)).unwrap_or_default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// How exchange flows are wrapped in error boundaries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Every exchange runs in its own boundary; one failure never stops the next
    Isolated,
    /// One boundary around the whole run; the first failure ends it
    Guarded,
}

impl std::str::FromStr for RunMode {
    type Err = ExecutorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "isolated" => Ok(RunMode::Isolated),
            "guarded" => Ok(RunMode::Guarded),
            other => Err(ExecutorError::Config(format!("Unknown run mode: {}", other))),
        }
    }
}

/// Everything needed to build and run one exchange adapter
#[derive(Clone, Debug)]
pub struct ExchangeSettings {
    pub exchange: Exchange,
    pub credentials: Credentials,
    pub adapter: AdapterConfig,
}

impl ExchangeSettings {
    /// Production endpoints and the exchange's default error policy
    pub fn defaults(exchange: Exchange, credentials: Credentials) -> Self {
        let adapter = match exchange {
            Exchange::Bitflyer => adapters::bitflyer::account::default_config(),
            Exchange::Gmo => adapters::gmo::account::default_config(),
        };
        Self {
            exchange,
            credentials,
            adapter,
        }
    }
}

/// Immutable run configuration handed to the runner at construction
#[derive(Clone, Debug)]
pub struct BuyConfig {
    pub budget_jpy: f64,
    pub mode: RunMode,
    pub exchanges: Vec<ExchangeSettings>,
}

impl BuyConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.budget_jpy.is_finite() || self.budget_jpy <= 0.0 {
            return Err(ExecutorError::InvalidBudget(self.budget_jpy));
        }
        if self.exchanges.is_empty() {
            return Err(ExecutorError::Config("No exchanges configured".to_string()));
        }
        for (i, settings) in self.exchanges.iter().enumerate() {
            if settings.adapter.timeout.is_zero() {
                return Err(ExecutorError::Config(format!(
                    "Request timeout for {} must be greater than zero",
                    settings.exchange
                )));
            }
            if self.exchanges[..i].iter().any(|s| s.exchange == settings.exchange) {
                return Err(ExecutorError::Config(format!(
                    "Exchange listed twice: {}",
                    settings.exchange
                )));
            }
        }
        Ok(())
    }

    pub fn with_budget(mut self, budget_jpy: f64) -> Self {
        self.budget_jpy = budget_jpy;
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keeps only `exchanges`, in the given order
    ///
    /// Settings already present are reused; others get defaults and
    /// credentials from the environment.
    pub fn with_exchanges(mut self, exchanges: &[Exchange]) -> Self {
        let mut current = std::mem::take(&mut self.exchanges);
        self.exchanges = exchanges
            .iter()
            .map(|&exchange| match current.iter().position(|s| s.exchange == exchange) {
                Some(idx) => current.remove(idx),
                None => ExchangeSettings::defaults(exchange, Credentials::from_env(exchange)),
            })
            .collect();
        self
    }
}

// =============================================================================
// TOML
// =============================================================================

/// Raw TOML configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct BuyConfigToml {
    #[serde(default)]
    pub trading: TradingConfig,
    /// Keyed by exchange name, e.g. `[exchanges.bitflyer]`
    #[serde(default)]
    pub exchanges: HashMap<String, VenueConfig>,
}

#[derive(Debug, Deserialize)]
pub struct TradingConfig {
    #[serde(default = "default_budget")]
    pub budget_jpy: f64,
    #[serde(default = "default_mode")]
    pub mode: RunMode,
    #[serde(default = "default_exchanges")]
    pub exchanges: Vec<Exchange>,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            budget_jpy: default_budget(),
            mode: default_mode(),
            exchanges: default_exchanges(),
        }
    }
}

fn default_budget() -> f64 {
    DEFAULT_BUDGET_JPY
}

fn default_mode() -> RunMode {
    RunMode::Isolated
}

fn default_exchanges() -> Vec<Exchange> {
    vec![Exchange::Bitflyer, Exchange::Gmo]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyName {
    Propagate,
    ReturnSentinel,
}

impl From<PolicyName> for ErrorPolicy {
    fn from(name: PolicyName) -> Self {
        match name {
            PolicyName::Propagate => ErrorPolicy::Propagate,
            PolicyName::ReturnSentinel => ErrorPolicy::ReturnSentinel,
        }
    }
}

/// Per-exchange overrides; anything left out keeps the exchange default
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VenueConfig {
    pub public_url: Option<String>,
    pub private_url: Option<String>,
    pub error_policy: Option<PolicyName>,
    pub timeout_secs: Option<u64>,
}

impl VenueConfig {
    fn apply(&self, adapter: &mut AdapterConfig) {
        if let Some(url) = &self.public_url {
            adapter.public_url = url.clone();
        }
        if let Some(url) = &self.private_url {
            adapter.private_url = url.clone();
        }
        if let Some(policy) = self.error_policy {
            adapter.policy = policy.into();
        }
        if let Some(secs) = self.timeout_secs {
            adapter.timeout = Duration::from_secs(secs);
        }
    }
}

impl BuyConfigToml {
    /// Loads configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExecutorError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
            .map_err(|e| ExecutorError::Config(format!("{} ({})", e, path.display())))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let parsed: Self = toml::from_str(contents)
            .map_err(|e| ExecutorError::Config(format!("Failed to parse config: {}", e)))?;
        parsed.check_venues()?;
        Ok(parsed)
    }

    /// Every `[exchanges.<name>]` table must name a known exchange
    fn check_venues(&self) -> Result<()> {
        for (name, venue) in &self.exchanges {
            let exchange: Exchange = name.parse()?;
            if exchange.to_string() != *name {
                return Err(ExecutorError::Config(format!(
                    "Use [exchanges.{}] instead of [exchanges.{}]",
                    exchange, name
                )));
            }
            if venue.timeout_secs == Some(0) {
                return Err(ExecutorError::Config(format!(
                    "exchanges.{}.timeout_secs must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Resolves into a run configuration, taking credentials from `lookup`
    pub fn into_buy_config(self, lookup: impl Fn(&str) -> Option<String>) -> BuyConfig {
        let exchanges = self
            .trading
            .exchanges
            .iter()
            .map(|&exchange| {
                let mut settings =
                    ExchangeSettings::defaults(exchange, Credentials::from_lookup(exchange, &lookup));
                if let Some(venue) = self.exchanges.get(&exchange.to_string()) {
                    venue.apply(&mut settings.adapter);
                }
                settings
            })
            .collect();

        BuyConfig {
            budget_jpy: self.trading.budget_jpy,
            mode: self.trading.mode,
            exchanges,
        }
    }
}

/// Applies `BUY_BUDGET_JPY`, `BUY_MODE` and `BUY_EXCHANGES` overrides
///
/// `BUY_EXCHANGES` is a comma separated list, e.g. `bitflyer,gmo`.
pub fn apply_env_overrides(
    mut toml: BuyConfigToml,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<BuyConfigToml> {
    if let Some(budget) = lookup("BUY_BUDGET_JPY") {
        toml.trading.budget_jpy = budget
            .trim()
            .parse()
            .map_err(|_| ExecutorError::Config(format!("BUY_BUDGET_JPY is not a number: {}", budget)))?;
    }

    if let Some(mode) = lookup("BUY_MODE") {
        toml.trading.mode = mode.parse()?;
    }

    if let Some(list) = lookup("BUY_EXCHANGES") {
        toml.trading.exchanges = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Exchange>>>()?;
    }

    Ok(toml)
}

/// Loads the buy configuration from an optional file with environment overrides
pub fn load_buy_config<P: AsRef<Path>>(path: Option<P>) -> Result<BuyConfig> {
    let env = |key: &str| std::env::var(key).ok();

    let toml = match path {
        Some(p) => BuyConfigToml::from_file(p)?,
        None => BuyConfigToml::default(),
    };
    let config = apply_env_overrides(toml, env)?.into_buy_config(env);
    config.validate()?;

    for settings in &config.exchanges {
        info!(
            exchange = %settings.exchange,
            public_url = %settings.adapter.public_url,
            private_url = %settings.adapter.private_url,
            policy = ?settings.adapter.policy,
            credentials_present = settings.credentials.is_complete(),
            "Exchange configured"
        );
    }
    info!(
        budget_jpy = config.budget_jpy,
        mode = ?config.mode,
        "Configuration loaded"
    );

    Ok(config)
}
