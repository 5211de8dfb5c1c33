#![allow(dead_code)]

use async_trait::async_trait;
use candle_server::api::{AppState, RestApi};
use candle_server::broker::BrokerGateway;
use candle_server::config::{RestApiConfig, ServerConfig};
use candle_server::domain_types::{Candle, CandleSeries, Granularity, TradingSession};
use candle_server::engine::{
    BoundaryPolicy, CandleResolver, FixedClock, StorageError, TimeZoneNormalizer, UpstreamError,
};
use candle_server::storage::repository::{rows_to_series, CandleStore, TimeRange};
use candle_server::storage::CandleRow;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 測試固定的「現在」：2026-01-10 12:00 IST
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 6, 30, 0).unwrap()
}

pub fn window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
}

/// 從某個 UTC 時刻起逐分鐘產生資料列，`gaps` 內的索引缺少 close
pub fn minute_rows(start: DateTime<Utc>, count: i64, gaps: &[i64]) -> Vec<CandleRow> {
    (0..count)
        .map(|i| {
            let price = Decimal::new(10000 + i, 2);
            CandleRow {
                instrument_id: 1,
                time: start + Duration::minutes(i),
                open: Some(price),
                high: Some(price + Decimal::ONE),
                low: Some(price - Decimal::ONE),
                close: if gaps.contains(&i) { None } else { Some(price) },
                volume: 100 + i,
                turnover: Some(price * Decimal::from(100 + i)),
            }
        })
        .collect()
}

pub fn broker_series(symbol: &str, start: DateTime<Utc>, count: i64) -> CandleSeries {
    let candles = (0..count)
        .map(|i| Candle {
            time: start + Duration::minutes(i),
            open: 200.0,
            high: 201.0,
            low: 199.0,
            close: 200.5,
            volume: Some(10 * i),
            turnover: None,
        })
        .collect();
    CandleSeries::new(symbol, candles).with_closing_price(Some(198.0))
}

/// 記憶體內的K線儲存，行為與 PostgreSQL 倉儲一致
#[derive(Default)]
pub struct FakeStore {
    rows: HashMap<String, Vec<CandleRow>>,
    failing: bool,
    calls: AtomicUsize,
    ranges: Mutex<Vec<TimeRange>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<CandleRow>) -> Self {
        self.rows.insert(symbol.to_string(), rows);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> Vec<TimeRange> {
        self.ranges.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandleStore for FakeStore {
    async fn fetch(&self, symbol: &str, range: TimeRange) -> Result<CandleSeries, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().unwrap().push(range);
        if self.failing {
            return Err(StorageError::Unavailable("connection refused".to_string()));
        }
        let rows: Vec<CandleRow> = self
            .rows
            .get(symbol)
            .map(|rows| rows.iter().filter(|r| range.contains(r.time)).cloned().collect())
            .unwrap_or_default();
        Ok(rows_to_series(symbol, &rows))
    }

    async fn health_check(&self) -> bool {
        !self.failing
    }
}

pub enum GatewayBehaviour {
    Series(CandleSeries),
    RateLimited,
    Failure,
    Slow(std::time::Duration),
}

/// 可控的券商網關
pub struct FakeGateway {
    behaviour: GatewayBehaviour,
    calls: AtomicUsize,
    granularities: Mutex<Vec<Granularity>>,
}

impl FakeGateway {
    pub fn new(behaviour: GatewayBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            granularities: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(series: CandleSeries) -> Self {
        Self::new(GatewayBehaviour::Series(series))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn granularities(&self) -> Vec<Granularity> {
        self.granularities.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrokerGateway for FakeGateway {
    async fn fetch(
        &self,
        symbol: &str,
        _range: TimeRange,
        granularity: Granularity,
    ) -> Result<CandleSeries, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.granularities.lock().unwrap().push(granularity);
        match &self.behaviour {
            GatewayBehaviour::Series(series) => Ok(CandleSeries {
                symbol: symbol.to_string(),
                ..series.clone()
            }),
            GatewayBehaviour::RateLimited => Err(UpstreamError::RateLimited),
            GatewayBehaviour::Failure => Err(UpstreamError::Failure(symbol.to_string())),
            GatewayBehaviour::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(CandleSeries::empty(symbol))
            }
        }
    }
}

pub fn build_resolver(
    store: Arc<FakeStore>,
    gateway: Arc<FakeGateway>,
    broker_timeout: std::time::Duration,
) -> CandleResolver {
    let normalizer = TimeZoneNormalizer::default();
    CandleResolver::new(
        store,
        gateway,
        BoundaryPolicy::new(window_start(), normalizer),
        normalizer,
        Arc::new(FixedClock(fixed_now())),
        broker_timeout,
    )
}

pub fn build_app(store: Arc<FakeStore>, gateway: Arc<FakeGateway>) -> axum::Router {
    build_app_with_timeout(store, gateway, 30)
}

pub fn build_app_with_timeout(store: Arc<FakeStore>, gateway: Arc<FakeGateway>, request_timeout: u64) -> axum::Router {
    let resolver = build_resolver(store, gateway, std::time::Duration::from_secs(5));
    let state = AppState::new(resolver, TradingSession::default());

    let server_config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        enable_compression: false,
        enable_cors: false,
        cors_allowed_origins: Vec::new(),
    };
    let api_config = RestApiConfig {
        base_path: "/v1".to_string(),
        request_timeout,
    };

    RestApi::new(server_config, api_config, state).build_app()
}
