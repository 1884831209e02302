use crate::Result;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

pub type Price = f64;
pub type Quantity = f64;
pub type UnixMillis = u64;

// ============================================================================
// Orders & Trading
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Buy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderType {
    Market,
}

/// How an adapter reacts to transport and protocol failures
///
/// Business rejections (non-zero status envelopes, missing fields) are
/// always returned as errors regardless of policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return every failure to the caller
    #[default]
    Propagate,
    /// Log network/protocol failures and hand back `None`
    ReturnSentinel,
}

/// Endpoints and failure policy an adapter is constructed with
#[derive(Clone, Debug)]
pub struct AdapterConfig {
    /// Base URL for unauthenticated market data
    pub public_url: String,
    /// Base URL for signed trading endpoints
    pub private_url: String,
    pub policy: ErrorPolicy,
    pub timeout: Duration,
}

/// Last traded price for a pair, as of fetch time
#[derive(Clone, Debug)]
pub struct PriceQuote {
    pub pair: &'static str,
    pub last_price: Price,
    pub fetched_ms: UnixMillis,
}

/// A market order sized in base-currency units
#[derive(Clone, Debug)]
pub struct MarketOrder {
    pub symbol: String,
    pub side: Side,
    pub ord_type: OrderType,
    pub size: Quantity,
}

impl MarketOrder {
    pub fn buy(symbol: impl Into<String>, size: Quantity) -> Self {
        Self {
            symbol: symbol.into(),
            side: Side::Buy,
            ord_type: OrderType::Market,
            size,
        }
    }

    /// Unrounded decimal form of the size, as sent on the wire
    pub fn size_string(&self) -> String {
        self.size.to_string()
    }
}

/// Exchange response to an order submission
///
/// The payload is kept whole; only a status indicator and an order id are
/// picked out of it. Whether the status marks acceptance is decided by the
/// venue's parser.
#[derive(Clone, Debug)]
pub struct OrderResult {
    pub venue: &'static str,
    pub status: Option<i64>,
    pub order_id: Option<String>,
    pub accepted: bool,
    pub raw: Value,
}

impl OrderResult {
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// A request together with the authentication values computed for it
#[derive(Clone, Debug)]
pub struct SignedRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: String,
    pub timestamp: String,
    pub signature: String,
}

/// Produces HMAC signatures binding a secret to one exact request
pub trait RequestSigner {
    /// Current time in the unit the exchange expects
    fn timestamp(&self) -> String;

    /// Signs `timestamp + method + path + query + body`
    fn sign_with_timestamp(
        &self,
        timestamp: &str,
        method: &Method,
        path: &str,
        query: &str,
        body: &str,
    ) -> String;

    fn sign(&self, method: Method, path: &str, query: &str, body: &str) -> SignedRequest {
        let timestamp = self.timestamp();
        let signature = self.sign_with_timestamp(&timestamp, &method, path, query, body);
        SignedRequest {
            method,
            path: path.to_string(),
            query: query.to_string(),
            body: body.to_string(),
            timestamp,
            signature,
        }
    }
}

// ============================================================================
// REST
// ============================================================================

#[async_trait::async_trait]
pub trait SpotRest: Send + Sync {
    /// Short venue identifier used in logs
    fn venue(&self) -> &'static str;

    /// Public ticker read for the BTC/JPY pair
    async fn get_last_price(&self) -> Result<PriceQuote>;

    /// Submits a market buy for `size` BTC
    ///
    /// `Ok(None)` is only returned by adapters running with
    /// [`ErrorPolicy::ReturnSentinel`].
    async fn create_market_buy(&self, size: Quantity) -> Result<Option<OrderResult>>;
}
