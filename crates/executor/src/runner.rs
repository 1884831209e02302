//! Buy runner: drives the price → size → order flow per exchange
//!
//! Registered adapters are visited one after another in registration order.
//! Each visit fetches a fresh quote immediately before placing its order;
//! quotes are never shared between exchanges.

use crate::config::{BuyConfig, ExchangeSettings, RunMode};
use crate::sizing::{compute_order_size, format_size};
use crate::{Exchange, Result};
use adapters::bitflyer::BitflyerSpotAdapter;
use adapters::gmo::GmoSpotAdapter;
use adapters::traits::{OrderResult, SpotRest};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Builds the adapter for one configured exchange
pub fn build_adapter(settings: &ExchangeSettings) -> Arc<dyn SpotRest> {
    let key = settings.credentials.api_key.clone();
    let secret = settings.credentials.api_secret.clone();
    match settings.exchange {
        Exchange::Bitflyer => Arc::new(BitflyerSpotAdapter::with_config(key, secret, settings.adapter.clone())),
        Exchange::Gmo => Arc::new(GmoSpotAdapter::with_config(key, secret, settings.adapter.clone())),
    }
}

/// How a single exchange flow ended
#[derive(Clone, Debug)]
pub enum FlowOutcome {
    /// Order response without a failing status
    Accepted(OrderResult),
    /// Order response whose status marks it as refused
    Rejected(OrderResult),
    /// The adapter's error policy swallowed the failure
    NoResponse,
    /// The flow raised an error
    Failed(String),
    /// Never attempted because an earlier flow ended a guarded run
    Skipped,
}

impl FlowOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FlowOutcome::Failed(_))
    }

    fn label(&self) -> &'static str {
        match self {
            FlowOutcome::Accepted(_) => "accepted",
            FlowOutcome::Rejected(_) => "rejected",
            FlowOutcome::NoResponse => "no_response",
            FlowOutcome::Failed(_) => "failed",
            FlowOutcome::Skipped => "skipped",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FlowReport {
    pub exchange: Exchange,
    pub outcome: FlowOutcome,
}

/// Per-exchange outcomes of one run
#[derive(Clone, Debug)]
pub struct RunReport {
    pub mode: RunMode,
    pub flows: Vec<FlowReport>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.flows.iter().any(|f| f.outcome.is_failed())
    }

    pub fn outcome(&self, exchange: Exchange) -> Option<&FlowOutcome> {
        self.flows
            .iter()
            .find(|f| f.exchange == exchange)
            .map(|f| &f.outcome)
    }

    /// Whether the process should exit with a success status
    ///
    /// A guarded run always finishes cleanly; an isolated run reports
    /// failure if any exchange flow raised.
    pub fn exit_success(&self) -> bool {
        match self.mode {
            RunMode::Guarded => true,
            RunMode::Isolated => !self.has_failures(),
        }
    }

    fn summary(&self) -> String {
        self.flows
            .iter()
            .map(|f| format!("{}={}", f.exchange, f.outcome.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Runs the buy flow against each registered exchange
pub struct BuyRunner {
    budget_jpy: f64,
    adapters: Vec<(Exchange, Arc<dyn SpotRest>)>,
}

impl BuyRunner {
    pub fn new(budget_jpy: f64) -> Self {
        Self {
            budget_jpy,
            adapters: Vec::new(),
        }
    }

    /// Builds a runner with one adapter per configured exchange
    pub fn from_config(config: &BuyConfig) -> Self {
        let mut runner = Self::new(config.budget_jpy);
        for settings in &config.exchanges {
            runner.register_adapter(settings.exchange, build_adapter(settings));
        }
        runner
    }

    /// Registers an exchange adapter; flows run in registration order
    pub fn register_adapter(&mut self, exchange: Exchange, adapter: Arc<dyn SpotRest>) {
        info!(%exchange, venue = adapter.venue(), "Registering exchange adapter");
        self.adapters.push((exchange, adapter));
    }

    pub fn budget_jpy(&self) -> f64 {
        self.budget_jpy
    }

    pub async fn run(&self, mode: RunMode) -> RunReport {
        info!(budget_jpy = self.budget_jpy, ?mode, "Buy run started");

        let report = match mode {
            RunMode::Isolated => self.run_isolated().await,
            RunMode::Guarded => self.run_guarded().await,
        };

        info!(summary = %report.summary(), "Buy run finished");
        report
    }

    /// Each exchange in its own error boundary
    async fn run_isolated(&self) -> RunReport {
        let mut flows = Vec::with_capacity(self.adapters.len());

        for (exchange, adapter) in &self.adapters {
            let outcome = match self.execute_flow(*exchange, adapter.as_ref()).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(%exchange, error = %e, "Buy flow failed, continuing with next exchange");
                    FlowOutcome::Failed(e.to_string())
                }
            };
            flows.push(FlowReport {
                exchange: *exchange,
                outcome,
            });
        }

        RunReport {
            mode: RunMode::Isolated,
            flows,
        }
    }

    /// One error boundary around the whole run
    async fn run_guarded(&self) -> RunReport {
        let mut flows = Vec::with_capacity(self.adapters.len());
        let mut aborted = false;

        for (exchange, adapter) in &self.adapters {
            if aborted {
                flows.push(FlowReport {
                    exchange: *exchange,
                    outcome: FlowOutcome::Skipped,
                });
                continue;
            }

            let outcome = match self.execute_flow(*exchange, adapter.as_ref()).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(%exchange, error = %e, "Error during buy run");
                    aborted = true;
                    FlowOutcome::Failed(e.to_string())
                }
            };
            flows.push(FlowReport {
                exchange: *exchange,
                outcome,
            });
        }

        RunReport {
            mode: RunMode::Guarded,
            flows,
        }
    }

    /// Start → FetchPrice → ComputeAmount → PlaceOrder → LogResult
    pub async fn execute_flow(&self, exchange: Exchange, adapter: &dyn SpotRest) -> Result<FlowOutcome> {
        let quote = adapter.get_last_price().await?;
        let size = compute_order_size(self.budget_jpy, quote.last_price)?;

        info!(%exchange, price = quote.last_price, "Current BTC price (JPY)");
        info!(%exchange, amount = %format_size(size), "Planned buy amount (BTC)");

        let outcome = match adapter.create_market_buy(size).await? {
            Some(result) if result.is_accepted() => {
                info!(
                    %exchange,
                    order_id = ?result.order_id,
                    response = %result.raw,
                    "Order result"
                );
                FlowOutcome::Accepted(result)
            }
            Some(result) => {
                warn!(
                    %exchange,
                    status = ?result.status,
                    response = %result.raw,
                    "Order rejected"
                );
                FlowOutcome::Rejected(result)
            }
            None => {
                warn!(%exchange, "No order response received");
                FlowOutcome::NoResponse
            }
        };

        Ok(outcome)
    }
}
