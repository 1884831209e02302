//! GMO Coin Authentication and REST Client
//!
//! Provides shared authentication, HTTP client, response envelope and type
//! converters for the GMO Coin HTTP API.
//!
//! # Authentication
//!
//! - Timestamp: Unix time in milliseconds
//! - String to sign: `timestamp + method + path + query + body`, where `path`
//!   excludes the `/private` prefix of the base URL
//! - Signature: HMAC-SHA256, hex-encoded (lowercase)
//! - Required headers: API-KEY, API-TIMESTAMP, API-SIGN
//!
//! # API Documentation
//!
//! - <https://api.coin.z.com/docs/>

use crate::traits::{AdapterConfig, ErrorPolicy, RequestSigner};
use crate::utils::{hmac_sha256_hex, unix_millis, RestTransport, DEFAULT_TIMEOUT};
use crate::{AdapterError, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

// =============================================================================
// API Endpoints
// =============================================================================

/// GMO Coin public REST API base URL
pub const GMO_PUBLIC_URL: &str = "https://api.coin.z.com/public";

/// GMO Coin private REST API base URL
pub const GMO_PRIVATE_URL: &str = "https://api.coin.z.com/private";

pub const TICKER_PATH: &str = "/v1/ticker";

pub const ORDER_PATH: &str = "/v1/order";

/// Spot symbol for BTC/JPY
pub const SYMBOL: &str = "BTC";

/// Endpoints and policy used when nothing else is configured
///
/// GMO transport and protocol failures are logged and swallowed by default.
pub fn default_config() -> AdapterConfig {
    AdapterConfig {
        public_url: GMO_PUBLIC_URL.to_string(),
        private_url: GMO_PRIVATE_URL.to_string(),
        policy: ErrorPolicy::ReturnSentinel,
        timeout: DEFAULT_TIMEOUT,
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// GMO Coin API authentication credentials
#[derive(Clone)]
pub struct GmoAuth {
    pub api_key: String,
    pub api_secret: String,
}

impl GmoAuth {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self { api_key, api_secret }
    }
}

impl fmt::Debug for GmoAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GmoAuth")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl RequestSigner for GmoAuth {
    fn timestamp(&self) -> String {
        unix_millis().to_string()
    }

    fn sign_with_timestamp(
        &self,
        timestamp: &str,
        method: &Method,
        path: &str,
        query: &str,
        body: &str,
    ) -> String {
        let text = format!("{}{}{}{}{}", timestamp, method.as_str(), path, query, body);
        hmac_sha256_hex(self.api_secret.as_bytes(), text.as_bytes())
    }
}

// =============================================================================
// REST Client
// =============================================================================

/// HTTP client for the GMO Coin REST API
#[derive(Clone)]
pub struct GmoRestClient {
    transport: RestTransport,
    auth: GmoAuth,
    public_url: String,
    private_url: String,
}

impl GmoRestClient {
    pub fn new(auth: GmoAuth, config: &AdapterConfig) -> Self {
        Self {
            transport: RestTransport::new("gmo", config.policy, config.timeout),
            auth,
            public_url: config.public_url.trim_end_matches('/').to_string(),
            private_url: config.private_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.transport.policy()
    }

    /// Makes a public GET request (no authentication)
    pub async fn get_public(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Option<Value>> {
        let url = format!("{}{}", self.public_url, endpoint);
        let request = self.transport.client().get(&url).query(params);
        self.transport.execute(request).await
    }

    /// Makes an authenticated POST request with a JSON body
    pub async fn post_private(&self, endpoint: &str, body: &impl serde::Serialize) -> Result<Option<Value>> {
        let json_body = serde_json::to_string(body)
            .map_err(|source| AdapterError::MalformedJson { venue: "gmo", source })?;
        let signed = self.auth.sign(Method::POST, endpoint, "", &json_body);

        let url = format!("{}{}{}", self.private_url, signed.path, signed.query);
        let request = self
            .transport
            .client()
            .request(signed.method, &url)
            .header("API-KEY", &self.auth.api_key)
            .header("API-TIMESTAMP", &signed.timestamp)
            .header("API-SIGN", &signed.signature)
            .header("Content-Type", "application/json")
            .body(signed.body);

        self.transport.execute(request).await
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Standard GMO Coin response wrapper
#[derive(Debug, Deserialize)]
pub struct GmoResponse {
    pub status: Option<i64>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub messages: Value,
    pub responsetime: Option<String>,
}

impl GmoResponse {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|source| AdapterError::MalformedJson { venue: "gmo", source })
    }

    pub fn is_ok(&self) -> bool {
        self.status == Some(0)
    }

    /// Extracts `data` or returns the embedded message list as an error
    pub fn into_result(self) -> Result<Value> {
        if !self.is_ok() {
            return Err(AdapterError::Rejected {
                venue: "gmo",
                status: self.status,
                messages: self.messages,
            });
        }
        Ok(self.data)
    }
}

// =============================================================================
// Type Converters
// =============================================================================

pub mod converters {
    use crate::traits::{OrderType, Side};

    pub fn to_gmo_side(side: Side) -> &'static str {
        match side {
            Side::Buy => "BUY",
        }
    }

    pub fn to_gmo_execution_type(order_type: OrderType) -> &'static str {
        match order_type {
            OrderType::Market => "MARKET",
        }
    }
}
