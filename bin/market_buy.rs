//! Fixed-JPY market buy of BTC on bitFlyer and GMO Coin
//!
//! Fetches the last traded price on each configured exchange, sizes a
//! market buy so it costs the JPY budget, and submits it. Exchanges run
//! one after another.
//!
//! Usage:
//!   cargo run --bin market_buy -- --budget-jpy 10000 --exchange bitflyer --exchange gmo
//!
//! Credentials are read from BITFLYER_API_KEY / BITFLYER_API_SECRET and
//! GMO_API_KEY / GMO_API_SECRET (a `.env` file is honoured).

use anyhow::Result;
use clap::Parser;
use executor::{load_buy_config, BuyRunner, Exchange, RunMode};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "market_buy", about = "Market-buy BTC for a fixed JPY budget")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JPY to spend per exchange
    #[arg(long, env = "BUY_BUDGET_JPY")]
    budget_jpy: Option<f64>,

    /// Exchange to buy on; repeat for several, in run order
    #[arg(long = "exchange", value_parser = parse_exchange)]
    exchanges: Vec<Exchange>,

    /// isolated or guarded
    #[arg(long, value_parser = parse_mode)]
    mode: Option<RunMode>,
}

fn parse_exchange(s: &str) -> std::result::Result<Exchange, String> {
    s.parse().map_err(|e: executor::ExecutorError| e.to_string())
}

fn parse_mode(s: &str) -> std::result::Result<RunMode, String> {
    s.parse().map_err(|e: executor::ExecutorError| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = load_buy_config(cli.config.as_deref())?;
    if let Some(budget) = cli.budget_jpy {
        config = config.with_budget(budget);
    }
    if !cli.exchanges.is_empty() {
        config = config.with_exchanges(&cli.exchanges);
    }
    if let Some(mode) = cli.mode {
        config = config.with_mode(mode);
    }
    config.validate()?;

    for settings in &config.exchanges {
        if !settings.credentials.is_complete() {
            warn!(exchange = %settings.exchange, "API credentials missing; orders will be refused");
        }
    }

    info!(
        budget_jpy = config.budget_jpy,
        mode = ?config.mode,
        exchanges = config.exchanges.len(),
        "Starting market buy"
    );

    let runner = BuyRunner::from_config(&config);
    let report = runner.run(config.mode).await;

    Ok(if report.exit_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
