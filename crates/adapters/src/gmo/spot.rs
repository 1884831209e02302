use crate::gmo::account::{converters, default_config, GmoAuth, GmoResponse, GmoRestClient, ORDER_PATH, SYMBOL, TICKER_PATH};
use crate::traits::*;
use crate::utils::{json_f64, unix_millis};
use crate::{AdapterError, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

const VENUE: &str = "gmo";

/// GMO Coin spot adapter for BTC/JPY market buys
#[derive(Clone)]
pub struct GmoSpotAdapter {
    client: GmoRestClient,
}

impl GmoSpotAdapter {
    /// Creates an adapter against the production API with the sentinel policy
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self::with_config(api_key, api_secret, default_config())
    }

    pub fn with_config(api_key: String, api_secret: String, config: AdapterConfig) -> Self {
        let auth = GmoAuth::new(api_key, api_secret);
        Self {
            client: GmoRestClient::new(auth, &config),
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.client.policy()
    }
}

// GMO-specific request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GmoOrderRequest<'a> {
    symbol: &'a str,
    side: &'a str,
    execution_type: &'a str,
    size: String,
}

impl<'a> GmoOrderRequest<'a> {
    fn from_order(order: &'a MarketOrder) -> Self {
        Self {
            symbol: &order.symbol,
            side: converters::to_gmo_side(order.side),
            execution_type: converters::to_gmo_execution_type(order.ord_type),
            size: order.size_string(),
        }
    }
}

/// Checks the envelope, then reads `data[0].last`
fn parse_ticker(payload: Value) -> Result<f64> {
    let data = GmoResponse::from_value(payload)?.into_result()?;

    let last = data
        .get(0)
        .and_then(|t| t.get("last"))
        .and_then(json_f64)
        .ok_or(AdapterError::MissingField {
            venue: VENUE,
            field: "data[0].last",
        })?;

    if !last.is_finite() || last <= 0.0 {
        return Err(AdapterError::InvalidPrice { venue: VENUE, price: last });
    }
    Ok(last)
}

/// Wraps an order response; a missing or non-zero status is a rejection,
/// not an error
fn parse_order_response(payload: Value) -> OrderResult {
    let status = payload.get("status").and_then(Value::as_i64);
    let order_id = match payload.get("data") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    OrderResult {
        venue: VENUE,
        status,
        order_id,
        accepted: status == Some(0),
        raw: payload,
    }
}

#[async_trait::async_trait]
impl SpotRest for GmoSpotAdapter {
    fn venue(&self) -> &'static str {
        VENUE
    }

    async fn get_last_price(&self) -> Result<PriceQuote> {
        // A swallowed failure still leaves nothing to size an order with
        let payload = self
            .client
            .get_public(TICKER_PATH, &[("symbol", SYMBOL)])
            .await?
            .ok_or(AdapterError::NoResponse(VENUE))?;

        let last_price = parse_ticker(payload)?;
        debug!(venue = VENUE, last_price, "Ticker fetched");

        Ok(PriceQuote {
            pair: "BTC/JPY",
            last_price,
            fetched_ms: unix_millis(),
        })
    }

    async fn create_market_buy(&self, size: Quantity) -> Result<Option<OrderResult>> {
        let order = MarketOrder::buy(SYMBOL, size);
        let body = GmoOrderRequest::from_order(&order);

        info!(venue = VENUE, size = %body.size, "Submitting market buy");

        let response = self.client.post_private(ORDER_PATH, &body).await?;
        Ok(response.map(parse_order_response))
    }
}
