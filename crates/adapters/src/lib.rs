//! Exchange Adapters
//!
//! Signed REST adapters for the two venues a fixed-JPY market buy can run on.
//! Each adapter bundles a request signer, a public ticker reader and a market
//! order placer behind the [`traits::SpotRest`] trait.
//!
//! # Available Adapters
//!
//! - [`bitflyer::BitflyerSpotAdapter`] - bitFlyer Lightning (`BTC_JPY`)
//! - [`gmo::GmoSpotAdapter`] - GMO Coin (`BTC`)

pub mod bitflyer;
pub mod gmo;
pub mod traits;
pub mod utils;

pub use traits::{AdapterConfig, ErrorPolicy, MarketOrder, OrderResult, PriceQuote, RequestSigner, SignedRequest, SpotRest};

/// Coarse classification of adapter failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure (DNS, connection refused, timeout)
    Network,
    /// Non-2xx HTTP status or a body that is not valid JSON
    Protocol,
    /// Well-formed response that rejects the request or lacks expected data
    ExchangeBusiness,
}

/// Error types for adapter operations
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Network error talking to {venue}: {source}")]
    Network {
        venue: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {venue}: {body}")]
    HttpStatus {
        venue: &'static str,
        status: u16,
        body: String,
    },

    #[error("Malformed JSON from {venue}: {source}")]
    MalformedJson {
        venue: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{venue} rejected request (status {}): {messages}", display_status(.status))]
    Rejected {
        venue: &'static str,
        status: Option<i64>,
        messages: serde_json::Value,
    },

    #[error("Missing field `{field}` in {venue} response")]
    MissingField {
        venue: &'static str,
        field: &'static str,
    },

    #[error("Invalid price from {venue}: {price}")]
    InvalidPrice { venue: &'static str, price: f64 },

    #[error("No response received from {0}")]
    NoResponse(&'static str),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Network { .. } => ErrorKind::Network,
            AdapterError::HttpStatus { .. } | AdapterError::MalformedJson { .. } => {
                ErrorKind::Protocol
            }
            AdapterError::Rejected { .. }
            | AdapterError::MissingField { .. }
            | AdapterError::InvalidPrice { .. }
            | AdapterError::NoResponse(_) => ErrorKind::ExchangeBusiness,
        }
    }
}

fn display_status(status: &Option<i64>) -> String {
    match status {
        Some(s) => s.to_string(),
        None => "missing".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;
