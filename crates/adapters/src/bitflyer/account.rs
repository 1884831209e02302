//! bitFlyer Authentication and REST Client
//!
//! Provides shared authentication, HTTP client, and type converters for the
//! bitFlyer Lightning HTTP API.
//!
//! # Authentication
//!
//! - Timestamp: Unix time in whole seconds
//! - String to sign: `timestamp + method + path(+query) + body`
//! - Signature: HMAC-SHA256, hex-encoded (lowercase)
//! - Required headers: ACCESS-KEY, ACCESS-TIMESTAMP, ACCESS-SIGN
//!
//! # API Documentation
//!
//! - HTTP API: <https://lightning.bitflyer.com/docs>

use crate::traits::{AdapterConfig, ErrorPolicy, RequestSigner};
use crate::utils::{hmac_sha256_hex, unix_secs, RestTransport, DEFAULT_TIMEOUT};
use crate::Result;
use reqwest::Method;
use serde_json::Value;
use std::fmt;

// =============================================================================
// API Endpoints
// =============================================================================

/// bitFlyer REST API base URL (public and private endpoints share it)
pub const BITFLYER_REST_URL: &str = "https://api.bitflyer.com";

/// Public ticker endpoint
pub const TICKER_PATH: &str = "/v1/ticker";

/// Private child order endpoint
pub const SEND_CHILD_ORDER_PATH: &str = "/v1/me/sendchildorder";

/// Product code for the BTC/JPY spot pair
pub const PRODUCT_CODE: &str = "BTC_JPY";

/// Endpoints and policy used when nothing else is configured
///
/// bitFlyer failures propagate to the caller by default.
pub fn default_config() -> AdapterConfig {
    AdapterConfig {
        public_url: BITFLYER_REST_URL.to_string(),
        private_url: BITFLYER_REST_URL.to_string(),
        policy: ErrorPolicy::Propagate,
        timeout: DEFAULT_TIMEOUT,
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// bitFlyer API authentication credentials
#[derive(Clone)]
pub struct BitflyerAuth {
    pub api_key: String,
    pub api_secret: String,
}

impl BitflyerAuth {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self { api_key, api_secret }
    }
}

impl fmt::Debug for BitflyerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitflyerAuth")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl RequestSigner for BitflyerAuth {
    fn timestamp(&self) -> String {
        unix_secs().to_string()
    }

    fn sign_with_timestamp(
        &self,
        timestamp: &str,
        method: &Method,
        path: &str,
        query: &str,
        body: &str,
    ) -> String {
        let message = format!("{}{}{}{}{}", timestamp, method.as_str(), path, query, body);
        hmac_sha256_hex(self.api_secret.as_bytes(), message.as_bytes())
    }
}

// =============================================================================
// REST Client
// =============================================================================

/// HTTP client for the bitFlyer REST API
#[derive(Clone)]
pub struct BitflyerRestClient {
    transport: RestTransport,
    auth: BitflyerAuth,
    public_url: String,
    private_url: String,
}

impl BitflyerRestClient {
    pub fn new(auth: BitflyerAuth, config: &AdapterConfig) -> Self {
        Self {
            transport: RestTransport::new("bitflyer", config.policy, config.timeout),
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
    ///
    /// The body is serialized once; those exact bytes are both signed and sent.
    pub async fn post_private(&self, endpoint: &str, body: &impl serde::Serialize) -> Result<Option<Value>> {
        let json_body = serde_json::to_string(body).map_err(|source| crate::AdapterError::MalformedJson {
            venue: "bitflyer",
            source,
        })?;
        let signed = self.auth.sign(Method::POST, endpoint, "", &json_body);

        let url = format!("{}{}{}", self.private_url, signed.path, signed.query);
        let request = self
            .transport
            .client()
            .request(signed.method, &url)
            .header("ACCESS-KEY", &self.auth.api_key)
            .header("ACCESS-TIMESTAMP", &signed.timestamp)
            .header("ACCESS-SIGN", &signed.signature)
            .header("Content-Type", "application/json")
            .body(signed.body);

        self.transport.execute(request).await
    }
}

// =============================================================================
// Type Converters
// =============================================================================

pub mod converters {
    use crate::traits::{OrderType, Side};

    pub fn to_bitflyer_side(side: Side) -> &'static str {
        match side {
            Side::Buy => "BUY",
        }
    }

    pub fn to_bitflyer_order_type(order_type: OrderType) -> &'static str {
        match order_type {
            OrderType::Market => "MARKET",
        }
    }
}
