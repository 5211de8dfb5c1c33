//! Groww 風格的歷史K線 REST 客戶端
//!
//! `GET {base_url}/v1/historical/candles`，起訖時間以交易所本地時間字串傳遞，
//! 回應中的時間戳同樣是交易所本地時間。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::broker::gateway::BrokerGateway;
use crate::config::BrokerConfig;
use crate::domain_types::{Candle, CandleSeries, Granularity};
use crate::engine::error::UpstreamError;
use crate::engine::timezone::TimeZoneNormalizer;
use crate::storage::repository::TimeRange;

const CANDLES_PATH: &str = "/v1/historical/candles";

/// 券商回應外層
#[derive(Debug, Deserialize)]
pub struct GrowwResponse {
    pub status: String,
    #[serde(default)]
    pub payload: Option<GrowwPayload>,
}

#[derive(Debug, Deserialize)]
pub struct GrowwPayload {
    /// [timestamp, open, high, low, close, volume, turnover]
    #[serde(default)]
    pub candles: Vec<Vec<Value>>,
    #[serde(default)]
    pub closing_price: Option<f64>,
}

/// Groww 券商網關
pub struct GrowwGateway {
    base_url: String,
    access_token: String,
    exchange: String,
    segment: String,
    timeout_secs: u64,
    normalizer: TimeZoneNormalizer,
    client: reqwest::Client,
}

impl GrowwGateway {
    pub fn new(config: &BrokerConfig, normalizer: TimeZoneNormalizer) -> Result<Self, UpstreamError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();

        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;

        info!(
            "建立券商網關: base_url='{}', exchange={}, segment={}",
            base_url, config.exchange, config.segment
        );

        Ok(Self {
            base_url,
            access_token: config.access_token.clone(),
            exchange: config.exchange.clone(),
            segment: config.segment.clone(),
            timeout_secs: config.timeout_secs,
            normalizer,
            client,
        })
    }

    fn query_params(&self, symbol: &str, range: TimeRange, granularity: Granularity) -> Vec<(&'static str, String)> {
        let zone = self.normalizer.home_zone();
        vec![
            ("candle_interval", granularity.as_str().to_string()),
            ("start_time", self.normalizer.from_utc_in(range.start, zone)),
            ("end_time", self.normalizer.from_utc_in(range.end, zone)),
            ("exchange", self.exchange.clone()),
            ("segment", self.segment.clone()),
            ("groww_symbol", format!("{}-{}", self.exchange, symbol)),
        ]
    }

    /// 解析回應主體為K線序列
    pub fn parse_response(&self, symbol: &str, body: &str) -> Result<CandleSeries, UpstreamError> {
        let response: GrowwResponse =
            serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(format!("無法解析回應: {}", e)))?;

        if !response.status.eq_ignore_ascii_case("SUCCESS") {
            return Err(UpstreamError::Failure(symbol.to_string()));
        }

        let payload = response
            .payload
            .ok_or_else(|| UpstreamError::Malformed("回應缺少 payload".to_string()))?;

        let mut candles = Vec::with_capacity(payload.candles.len());
        for row in &payload.candles {
            if let Some(candle) = self.parse_row(row)? {
                candles.push(candle);
            }
        }
        let dropped = payload.candles.len() - candles.len();
        if dropped > 0 {
            debug!("{} 剔除 {} 根不完整的K線", symbol, dropped);
        }

        let mut series = CandleSeries::new(symbol, candles).with_closing_price(payload.closing_price);
        series.sort_by_time();
        Ok(series)
    }

    /// 解析單列；OHLC 不完整時返回 None，時間戳無法解析時返回錯誤
    fn parse_row(&self, row: &[Value]) -> Result<Option<Candle>, UpstreamError> {
        let field = |i: usize| row.get(i).and_then(Value::as_f64);

        let time = match row.first() {
            Some(Value::String(literal)) => self.parse_timestamp(literal)?,
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .ok_or_else(|| UpstreamError::Malformed(format!("無效的時間戳: {}", n)))?,
            other => return Err(UpstreamError::Malformed(format!("缺少時間戳: {:?}", other))),
        };

        Ok(Candle::from_parts(
            time,
            field(1),
            field(2),
            field(3),
            field(4),
            field(5).map(|v| v as i64),
            field(6),
        ))
    }

    fn parse_timestamp(&self, literal: &str) -> Result<DateTime<Utc>, UpstreamError> {
        // 帶偏移的 RFC 3339 直接換算，否則視為交易所本地時間
        if let Ok(instant) = DateTime::parse_from_rfc3339(literal) {
            return Ok(instant.with_timezone(&Utc));
        }
        self.normalizer
            .to_utc(literal, None)
            .map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl BrokerGateway for GrowwGateway {
    async fn fetch(
        &self,
        symbol: &str,
        range: TimeRange,
        granularity: Granularity,
    ) -> Result<CandleSeries, UpstreamError> {
        let url = format!("{}{}", self.base_url, CANDLES_PATH);
        let params = self.query_params(symbol, range, granularity);

        debug!("向券商請求K線: url={}, params={:?}", url, params);

        let mut request = self.client.get(&url).query(&params);
        if !self.access_token.is_empty() {
            request = request.bearer_auth(&self.access_token);
        }

        let response = request.send().await.map_err(|e| {
            error!("券商請求失敗: {} (url: {}, symbol: {})", e, url, symbol);
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout_secs)
            } else {
                UpstreamError::Request(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let series = self.parse_response(symbol, &body)?;

        info!("券商返回 {} 的K線 {} 根 ({})", symbol, series.len(), granularity);
        Ok(series)
    }
}
