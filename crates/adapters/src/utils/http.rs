//! HTTP transport shared by the exchange REST clients
//!
//! Sends a prepared request, checks the HTTP status and parses the body as
//! JSON. Transport and protocol failures are then either returned or
//! swallowed depending on the configured [`ErrorPolicy`].

use crate::traits::ErrorPolicy;
use crate::{AdapterError, ErrorKind, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Default request timeout applied to every call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct RestTransport {
    client: Client,
    venue: &'static str,
    policy: ErrorPolicy,
}

impl RestTransport {
    /// Creates a transport for `venue` with the given failure policy
    pub fn new(venue: &'static str, policy: ErrorPolicy, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::error!("Failed to build HTTP client, using default: {}", e);
                Client::new()
            });
        Self {
            client,
            venue,
            policy,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn venue(&self) -> &'static str {
        self.venue
    }

    /// Sends the request and applies the error policy
    ///
    /// With [`ErrorPolicy::ReturnSentinel`] network and protocol failures are
    /// logged and `Ok(None)` is returned. Every other outcome is passed through.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Option<Value>> {
        match self.send(request).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.swallows(&e) => {
                error!(venue = self.venue, error = %e, "Request failed, no response returned");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn swallows(&self, err: &AdapterError) -> bool {
        self.policy == ErrorPolicy::ReturnSentinel
            && matches!(err.kind(), ErrorKind::Network | ErrorKind::Protocol)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let venue = self.venue;

        let response = request
            .send()
            .await
            .map_err(|source| AdapterError::Network { venue, source })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| AdapterError::Network { venue, source })?;

        debug!(venue, status = status.as_u16(), body = %body, "Response received");

        if !status.is_success() {
            return Err(AdapterError::HttpStatus {
                venue,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| AdapterError::MalformedJson { venue, source })
    }
}

/// Reads a JSON number or numeric string as `f64`
pub fn json_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
