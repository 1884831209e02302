use crate::bitflyer::account::{
    converters, default_config, BitflyerAuth, BitflyerRestClient, PRODUCT_CODE, SEND_CHILD_ORDER_PATH,
    TICKER_PATH,
};
use crate::traits::*;
use crate::utils::{json_f64, unix_millis};
use crate::{AdapterError, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

const VENUE: &str = "bitflyer";

/// bitFlyer spot adapter for BTC/JPY market buys
#[derive(Clone)]
pub struct BitflyerSpotAdapter {
    client: BitflyerRestClient,
}

impl BitflyerSpotAdapter {
    /// Creates an adapter against the production API with the propagate policy
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self::with_config(api_key, api_secret, default_config())
    }

    pub fn with_config(api_key: String, api_secret: String, config: AdapterConfig) -> Self {
        let auth = BitflyerAuth::new(api_key, api_secret);
        Self {
            client: BitflyerRestClient::new(auth, &config),
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.client.policy()
    }
}

// bitFlyer-specific request types
#[derive(Debug, Serialize)]
struct BitflyerChildOrderRequest<'a> {
    product_code: &'a str,
    child_order_type: &'a str,
    side: &'a str,
    size: f64,
}

impl<'a> BitflyerChildOrderRequest<'a> {
    fn from_order(order: &'a MarketOrder) -> Self {
        Self {
            product_code: &order.symbol,
            child_order_type: converters::to_bitflyer_order_type(order.ord_type),
            side: converters::to_bitflyer_side(order.side),
            size: order.size,
        }
    }
}

/// Extracts `ltp` from a ticker payload
fn parse_ticker(payload: &Value) -> Result<f64> {
    let ltp = payload.get("ltp").ok_or(AdapterError::MissingField {
        venue: VENUE,
        field: "ltp",
    })?;
    let price = json_f64(ltp).ok_or(AdapterError::MissingField {
        venue: VENUE,
        field: "ltp",
    })?;

    if !price.is_finite() || price <= 0.0 {
        return Err(AdapterError::InvalidPrice { venue: VENUE, price });
    }
    Ok(price)
}

/// Wraps a `sendchildorder` response
///
/// Success carries `child_order_acceptance_id`; rejections carry `status`
/// and `error_message`.
fn parse_order_response(payload: Value) -> OrderResult {
    let status = payload.get("status").and_then(Value::as_i64);
    let order_id = payload
        .get("child_order_acceptance_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    // success replies carry no status at all
    let accepted = status.map_or(true, |s| s == 0);

    OrderResult {
        venue: VENUE,
        status,
        order_id,
        accepted,
        raw: payload,
    }
}

#[async_trait::async_trait]
impl SpotRest for BitflyerSpotAdapter {
    fn venue(&self) -> &'static str {
        VENUE
    }

    async fn get_last_price(&self) -> Result<PriceQuote> {
        let payload = self
            .client
            .get_public(TICKER_PATH, &[("product_code", PRODUCT_CODE)])
            .await?
            .ok_or(AdapterError::NoResponse(VENUE))?;

        let last_price = parse_ticker(&payload)?;
        debug!(venue = VENUE, last_price, "Ticker fetched");

        Ok(PriceQuote {
            pair: "BTC/JPY",
            last_price,
            fetched_ms: unix_millis(),
        })
    }

    async fn create_market_buy(&self, size: Quantity) -> Result<Option<OrderResult>> {
        let order = MarketOrder::buy(PRODUCT_CODE, size);
        let body = BitflyerChildOrderRequest::from_order(&order);

        info!(venue = VENUE, size = %order.size_string(), "Submitting market buy");

        let response = self.client.post_private(SEND_CHILD_ORDER_PATH, &body).await?;
        Ok(response.map(parse_order_response))
    }
}
