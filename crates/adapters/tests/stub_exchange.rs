//! Adapter tests against a local stub exchange
//!
//! Each test spins up an axum server on an ephemeral port that returns
//! canned responses and records every request it receives, so signing,
//! request shaping and both error policies can be checked end to end.
//!
//! Run with: cargo test --package adapters --test stub_exchange

use adapters::bitflyer::BitflyerSpotAdapter;
use adapters::gmo::GmoSpotAdapter;
use adapters::traits::{AdapterConfig, ErrorPolicy, SpotRest};
use adapters::{AdapterError, ErrorKind};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::any;
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BITFLYER_TICKER: &str = include_str!("./fixtures/bitflyer_ticker.json");
const GMO_TICKER: &str = include_str!("./fixtures/gmo_ticker.json");
const GMO_MAINTENANCE: &str = include_str!("./fixtures/gmo_maintenance.json");

// =============================================================================
// Stub Exchange
// =============================================================================

#[derive(Clone, Debug)]
struct Captured {
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: String,
}

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl Recorder {
    fn record(&self, captured: Captured) -> usize {
        let mut requests = self.requests.lock().unwrap();
        requests.push(captured);
        requests.len()
    }

    fn to_path(&self, path: &str) -> Vec<Captured> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }
}

/// A canned route: `{n}` in the body is replaced with the request counter
struct Canned {
    path: &'static str,
    status: StatusCode,
    body: String,
}

fn canned(path: &'static str, status: u16, body: &str) -> Canned {
    Canned {
        path,
        status: StatusCode::from_u16(status).unwrap(),
        body: body.to_string(),
    }
}

async fn spawn_stub(routes: Vec<Canned>) -> (String, Recorder) {
    let recorder = Recorder::default();
    let mut router = Router::new();

    for route in routes {
        let recorder = recorder.clone();
        let status = route.status;
        let template = route.body;
        let handler = move |uri: Uri, headers: HeaderMap, body: String| {
            let recorder = recorder.clone();
            let template = template.clone();
            async move {
                let n = recorder.record(Captured {
                    path: uri.path().to_string(),
                    query: uri.query().map(str::to_string),
                    headers,
                    body,
                });
                (status, template.replace("{n}", &n.to_string()))
            }
        };
        router = router.route(route.path, any(handler));
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), recorder)
}

/// Address with nothing listening on it
async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn bitflyer(base: &str, policy: ErrorPolicy) -> BitflyerSpotAdapter {
    BitflyerSpotAdapter::with_config(
        "bf-key".to_string(),
        "bf-secret".to_string(),
        AdapterConfig {
            public_url: base.to_string(),
            private_url: base.to_string(),
            policy,
            timeout: Duration::from_secs(5),
        },
    )
}

fn gmo(base: &str, policy: ErrorPolicy) -> GmoSpotAdapter {
    GmoSpotAdapter::with_config(
        "gmo-key".to_string(),
        "gmo-secret".to_string(),
        AdapterConfig {
            public_url: format!("{}/public", base),
            private_url: format!("{}/private", base),
            policy,
            timeout: Duration::from_secs(5),
        },
    )
}

/// Recomputes the signature the way the exchange does
fn server_side_signature(secret: &str, timestamp: &str, method: &str, path: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(path.as_bytes());
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn header<'a>(captured: &'a Captured, name: &str) -> &'a str {
    captured
        .headers
        .get(name)
        .unwrap_or_else(|| panic!("missing header {name}"))
        .to_str()
        .unwrap()
}

// =============================================================================
// bitFlyer
// =============================================================================

#[tokio::test]
async fn bitflyer_ticker_reads_ltp() {
    let (base, recorder) = spawn_stub(vec![canned("/v1/ticker", 200, BITFLYER_TICKER)]).await;

    let quote = bitflyer(&base, ErrorPolicy::Propagate).get_last_price().await.unwrap();

    assert_eq!(quote.last_price, 5_000_000.0);
    assert_eq!(quote.pair, "BTC/JPY");
    let requests = recorder.to_path("/v1/ticker");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query.as_deref(), Some("product_code=BTC_JPY"));
    assert!(requests[0].headers.get("ACCESS-SIGN").is_none());
}

#[tokio::test]
async fn bitflyer_order_is_signed_over_exact_body() {
    let (base, recorder) = spawn_stub(vec![canned(
        "/v1/me/sendchildorder",
        200,
        r#"{"child_order_acceptance_id":"JRF20240101-000000-{n}"}"#,
    )])
    .await;

    let result = bitflyer(&base, ErrorPolicy::Propagate)
        .create_market_buy(0.002)
        .await
        .unwrap()
        .expect("propagate policy never returns the sentinel");

    assert!(result.is_accepted());
    assert_eq!(result.order_id.as_deref(), Some("JRF20240101-000000-1"));

    let requests = recorder.to_path("/v1/me/sendchildorder");
    let req = &requests[0];
    assert_eq!(header(req, "ACCESS-KEY"), "bf-key");
    assert_eq!(header(req, "Content-Type"), "application/json");

    let timestamp = header(req, "ACCESS-TIMESTAMP");
    assert_eq!(timestamp.len(), 10, "bitFlyer timestamps are seconds");

    let expected = server_side_signature("bf-secret", timestamp, "POST", "/v1/me/sendchildorder", &req.body);
    assert_eq!(header(req, "ACCESS-SIGN"), expected);

    let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body["product_code"], "BTC_JPY");
    assert_eq!(body["child_order_type"], "MARKET");
    assert_eq!(body["side"], "BUY");
    assert_eq!(body["size"].as_f64(), Some(0.002));
}

#[tokio::test]
async fn bitflyer_http_500_propagates() {
    let (base, _recorder) = spawn_stub(vec![canned("/v1/me/sendchildorder", 500, "internal error")]).await;

    let err = bitflyer(&base, ErrorPolicy::Propagate)
        .create_market_buy(0.002)
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::HttpStatus { status: 500, .. }));
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn bitflyer_network_failure_propagates() {
    let base = dead_address().await;

    let err = bitflyer(&base, ErrorPolicy::Propagate)
        .create_market_buy(0.002)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn bitflyer_malformed_json_propagates() {
    let (base, _recorder) = spawn_stub(vec![canned("/v1/ticker", 200, "<html>maintenance</html>")]).await;

    let err = bitflyer(&base, ErrorPolicy::Propagate).get_last_price().await.unwrap_err();

    assert!(matches!(err, AdapterError::MalformedJson { .. }));
}

#[tokio::test]
async fn bitflyer_with_sentinel_policy_swallows_500() {
    let (base, _recorder) = spawn_stub(vec![canned("/v1/me/sendchildorder", 500, "internal error")]).await;

    let adapter = bitflyer(&base, ErrorPolicy::ReturnSentinel);
    assert_eq!(adapter.policy(), ErrorPolicy::ReturnSentinel);

    let result = adapter.create_market_buy(0.002).await.unwrap();
    assert!(result.is_none());
}

// =============================================================================
// GMO Coin
// =============================================================================

#[tokio::test]
async fn gmo_ticker_reads_first_entry() {
    let (base, recorder) = spawn_stub(vec![canned("/public/v1/ticker", 200, GMO_TICKER)]).await;

    let quote = gmo(&base, ErrorPolicy::ReturnSentinel).get_last_price().await.unwrap();

    assert_eq!(quote.last_price, 5_000_000.0);
    let requests = recorder.to_path("/public/v1/ticker");
    assert_eq!(requests[0].query.as_deref(), Some("symbol=BTC"));
}

#[tokio::test]
async fn gmo_ticker_nonzero_status_carries_messages() {
    let (base, recorder) = spawn_stub(vec![
        canned("/public/v1/ticker", 200, GMO_MAINTENANCE),
        canned("/private/v1/order", 200, r#"{"status":0,"data":"{n}"}"#),
    ])
    .await;

    let err = gmo(&base, ErrorPolicy::ReturnSentinel).get_last_price().await.unwrap_err();

    match &err {
        AdapterError::Rejected { status, messages, .. } => {
            assert_eq!(*status, Some(5));
            assert_eq!(messages[0]["message_code"], "ERR-5201");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::ExchangeBusiness);
    assert!(recorder.to_path("/private/v1/order").is_empty());
}

#[tokio::test]
async fn gmo_order_is_signed_without_private_prefix() {
    let (base, recorder) = spawn_stub(vec![canned(
        "/private/v1/order",
        200,
        r#"{"status":0,"data":"63700{n}","responsetime":"2024-01-01T00:00:00.000Z"}"#,
    )])
    .await;

    let result = gmo(&base, ErrorPolicy::ReturnSentinel)
        .create_market_buy(0.002)
        .await
        .unwrap()
        .expect("successful call returns a payload");

    assert!(result.is_accepted());
    assert_eq!(result.order_id.as_deref(), Some("637001"));

    let requests = recorder.to_path("/private/v1/order");
    let req = &requests[0];
    assert_eq!(header(req, "API-KEY"), "gmo-key");
    assert_eq!(header(req, "Content-Type"), "application/json");

    let timestamp = header(req, "API-TIMESTAMP");
    assert_eq!(timestamp.len(), 13, "GMO timestamps are milliseconds");

    let expected = server_side_signature("gmo-secret", timestamp, "POST", "/v1/order", &req.body);
    assert_eq!(header(req, "API-SIGN"), expected);

    let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
    assert_eq!(body["symbol"], "BTC");
    assert_eq!(body["side"], "BUY");
    assert_eq!(body["executionType"], "MARKET");
    assert_eq!(body["size"], "0.002");
}

#[tokio::test]
async fn gmo_order_rejection_is_returned_not_raised() {
    let (base, _recorder) = spawn_stub(vec![canned(
        "/private/v1/order",
        200,
        r#"{"status":1,"messages":[{"message_code":"ERR-208","message_string":"Exceeds the available balance"}]}"#,
    )])
    .await;

    let result = gmo(&base, ErrorPolicy::ReturnSentinel)
        .create_market_buy(0.002)
        .await
        .unwrap()
        .unwrap();

    assert!(!result.is_accepted());
    assert_eq!(result.raw["messages"][0]["message_code"], "ERR-208");
}

#[tokio::test]
async fn gmo_http_500_returns_sentinel() {
    let (base, recorder) = spawn_stub(vec![canned("/private/v1/order", 500, "internal error")]).await;

    let result = gmo(&base, ErrorPolicy::ReturnSentinel)
        .create_market_buy(0.002)
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(recorder.to_path("/private/v1/order").len(), 1);
}

#[tokio::test]
async fn gmo_network_failure_returns_sentinel_for_orders() {
    let base = dead_address().await;
    let adapter = gmo(&base, ErrorPolicy::ReturnSentinel);

    assert!(adapter.create_market_buy(0.002).await.unwrap().is_none());

    // no price means nothing to size an order with
    let err = adapter.get_last_price().await.unwrap_err();
    assert!(matches!(err, AdapterError::NoResponse("gmo")));
}

#[tokio::test]
async fn gmo_with_propagate_policy_raises_500() {
    let (base, _recorder) = spawn_stub(vec![canned("/private/v1/order", 500, "internal error")]).await;

    let err = gmo(&base, ErrorPolicy::Propagate)
        .create_market_buy(0.002)
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::HttpStatus { status: 500, .. }));
}

// =============================================================================
// Idempotence
// =============================================================================

#[tokio::test]
async fn repeated_orders_are_not_deduplicated() {
    let (base, recorder) = spawn_stub(vec![
        canned("/v1/me/sendchildorder", 200, r#"{"child_order_acceptance_id":"JRF-{n}"}"#),
        canned("/private/v1/order", 200, r#"{"status":0,"data":"{n}"}"#),
    ])
    .await;

    let bf = bitflyer(&base, ErrorPolicy::Propagate);
    let first = bf.create_market_buy(0.002).await.unwrap().unwrap();
    let second = bf.create_market_buy(0.002).await.unwrap().unwrap();
    assert_ne!(first.order_id, second.order_id);
    assert_eq!(recorder.to_path("/v1/me/sendchildorder").len(), 2);

    let gm = gmo(&base, ErrorPolicy::ReturnSentinel);
    let first = gm.create_market_buy(0.002).await.unwrap().unwrap();
    let second = gm.create_market_buy(0.002).await.unwrap().unwrap();
    assert_ne!(first.order_id, second.order_id);
    assert_eq!(recorder.to_path("/private/v1/order").len(), 2);
}
