mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use common::*;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn get(app: axum::Router, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn session_rows() -> Vec<candle_server::storage::CandleRow> {
    minute_rows(Utc.with_ymd_and_hms(2025, 12, 1, 3, 45, 0).unwrap(), 3, &[1])
}

#[tokio::test]
async fn test_dashboard_route_returns_chart_candles() {
    let store = Arc::new(FakeStore::new().with_rows("RELIANCE", session_rows()));
    let gateway = Arc::new(FakeGateway::new(GatewayBehaviour::Failure));
    let app = build_app(store, gateway);

    let (status, body) = get(app, "/v1/dashboard/candles?symbol=RELIANCE&date=2025-12-01", &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["message"], "Candles fetched successfully");
    assert_eq!(body["data"]["source"], "db");
    assert_eq!(body["data"]["interval_in_minutes"], 1);
    assert_eq!(body["data"]["start_time"], "2025-12-01T03:45:00");
    assert_eq!(body["data"]["end_time"], "2025-12-01T10:00:00");
    assert_eq!(body["data"]["candles"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["data"]["candles"][0],
        json!({"time": 1764560700, "open": 100.0, "high": 101.0, "low": 99.0, "close": 100.0})
    );
}

#[tokio::test]
async fn test_candles_route_defaults_to_developer() {
    let store = Arc::new(FakeStore::new().with_rows("RELIANCE", session_rows()));
    let gateway = Arc::new(FakeGateway::new(GatewayBehaviour::Failure));
    let app = build_app(store, gateway);

    let (status, body) = get(
        app,
        "/v1/candles?symbol=RELIANCE&start_datetime=2025-12-01T09:15:00&end_datetime=2025-12-01T15:30:00",
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let candles = body["data"]["candles"].as_array().unwrap();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].as_array().unwrap().len(), 7);
    assert_eq!(candles[0][0], 1764560700);
    assert_eq!(candles[0][5], 100);
    assert_eq!(body["data"]["source"], "db");
    assert_eq!(body["data"]["closing_price"], Value::Null);
}

#[tokio::test]
async fn test_candles_route_honours_source_header() {
    let store = Arc::new(FakeStore::new().with_rows("RELIANCE", session_rows()));
    let gateway = Arc::new(FakeGateway::new(GatewayBehaviour::Failure));
    let app = build_app(store, gateway);

    let (status, body) = get(
        app.clone(),
        "/v1/candles?symbol=RELIANCE&date=2025-12-01",
        &[("x-source", "dashboard")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["candles"][0].is_object());

    let (status, body) = get(
        app,
        "/v1/candles?symbol=RELIANCE&date=2025-12-01",
        &[("x-source", "mobile")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn test_validation_errors_never_reach_collaborators() {
    let store = Arc::new(FakeStore::new());
    let gateway = Arc::new(FakeGateway::new(GatewayBehaviour::Failure));
    let app = build_app(store.clone(), gateway.clone());

    let cases = [
        "/v1/dashboard/candles?date=2025-12-01",
        "/v1/dashboard/candles?symbol=TCS&date=2025-02-30",
        "/v1/dashboard/candles?symbol=TCS&date=2025-12-01&interval=10minute",
        "/v1/dashboard/candles?symbol=TCS&date=2025-12-01&timezone=Moon/Base",
        "/v1/developer/candles?symbol=TCS&start_datetime=2025-12-01&end_datetime=2025-12-01T15:30:00",
        "/v1/developer/candles?symbol=TCS&start_datetime=2025-12-01T15:30:00&end_datetime=2025-12-01T09:15:00",
    ];

    for uri in cases {
        let (status, body) = get(app.clone(), uri, &[]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["statusCode"], 400, "{}", uri);
    }

    assert_eq!(store.calls(), 0);
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_backtest_timestamp_guard() {
    let store = Arc::new(FakeStore::new().with_rows("RELIANCE", session_rows()));
    let gateway = Arc::new(FakeGateway::new(GatewayBehaviour::Failure));
    let app = build_app(store.clone(), gateway);
    let uri = "/v1/developer/candles?symbol=RELIANCE&start_datetime=2025-12-01T09:15:00&end_datetime=2025-12-01T09:30:00";

    let (status, _) = get(app.clone(), uri, &[("x-current-timestamp", "2025-12-01T09:30:00")]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(app.clone(), uri, &[("x-current-timestamp", "2025-12-01T09:29:59")]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["statusCode"], 403);

    let (status, _) = get(app, uri, &[("x-current-timestamp", "not-a-time")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_broker_errors_map_to_status_codes() {
    let uri = "/v1/dashboard/candles?symbol=TCS&date=2026-01-10";

    let app = build_app(
        Arc::new(FakeStore::new()),
        Arc::new(FakeGateway::new(GatewayBehaviour::RateLimited)),
    );
    let (status, body) = get(app, uri, &[]).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["statusCode"], 429);

    let app = build_app(Arc::new(FakeStore::new()), Arc::new(FakeGateway::new(GatewayBehaviour::Failure)));
    let (status, body) = get(app, uri, &[]).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let gateway = Arc::new(FakeGateway::new(GatewayBehaviour::Slow(std::time::Duration::from_secs(3))));
    let app = build_app_with_timeout(Arc::new(FakeStore::new()), gateway.clone(), 1);

    let (status, _) = get(app, "/v1/dashboard/candles?symbol=TCS&date=2026-01-10", &[]).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn test_batch_route_isolates_symbols() {
    let store = Arc::new(
        FakeStore::new()
            .with_rows("RELIANCE", session_rows())
            .with_rows("TCS", session_rows()),
    );
    let gateway = Arc::new(FakeGateway::new(GatewayBehaviour::Failure));
    let app = build_app(store.clone(), gateway);

    let (status, body) = get(
        app,
        "/v1/developer/candles/batch?symbols=RELIANCE,TCS,UNKNOWN&start_datetime=2025-12-01T09:15:00&end_datetime=2025-12-01T15:30:00",
        &[],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let outcomes = body["data"].as_array().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0]["symbol"], "RELIANCE");
    assert_eq!(outcomes[0]["statusCode"], 200);
    assert_eq!(outcomes[0]["data"]["candles"].as_array().unwrap().len(), 2);
    assert_eq!(outcomes[2]["symbol"], "UNKNOWN");
    assert_eq!(outcomes[2]["data"]["candles"], json!([]));
    assert_eq!(store.calls(), 3);
}

#[tokio::test]
async fn test_health_reports_store_state() {
    let app = build_app(Arc::new(FakeStore::new()), Arc::new(FakeGateway::new(GatewayBehaviour::Failure)));
    let (status, body) = get(app, "/v1/system/health", &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let app = build_app(Arc::new(FakeStore::failing()), Arc::new(FakeGateway::new(GatewayBehaviour::Failure)));
    let (status, body) = get(app, "/v1/system/health", &[]).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["store"], "down");
}
