//! 響應組裝：同一個 CandleSeries 依對象輸出兩種形狀

use serde::Serialize;
use tracing::error;

use crate::domain_types::{Candle, CandleSeries, Granularity};
use crate::engine::boundary::Source;
use crate::engine::error::AssemblyError;
use crate::engine::request::Audience;
use crate::engine::timezone::format_utc;
use crate::storage::repository::TimeRange;

/// dashboard K線：`{time, open, high, low, close}`，time 為 Unix 秒
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DashboardCandle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl From<&Candle> for DashboardCandle {
    fn from(candle: &Candle) -> Self {
        Self {
            time: candle.unix_seconds(),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
        }
    }
}

/// developer K線：`[time, open, high, low, close, volume, turnover]`
///
/// 長度固定為 7，未知的 volume/turnover 輸出為 null。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeveloperCandle(pub i64, pub f64, pub f64, pub f64, pub f64, pub Option<i64>, pub Option<f64>);

impl From<&Candle> for DeveloperCandle {
    fn from(candle: &Candle) -> Self {
        Self(
            candle.unix_seconds(),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            candle.volume,
            candle.turnover,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardPayload {
    pub candles: Vec<DashboardCandle>,
    pub start_time: String,
    pub end_time: String,
    pub interval_in_minutes: u32,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperPayload {
    pub candles: Vec<DeveloperCandle>,
    pub source: Source,
    pub interval_in_minutes: u32,
    pub start_time: String,
    pub end_time: String,
    pub closing_price: Option<f64>,
}

/// 對外輸出的資料體
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Dashboard(DashboardPayload),
    Developer(DeveloperPayload),
}

impl Payload {
    pub fn candle_count(&self) -> usize {
        match self {
            Payload::Dashboard(p) => p.candles.len(),
            Payload::Developer(p) => p.candles.len(),
        }
    }
}

/// 響應組裝器
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn new() -> Self {
        Self
    }

    /// 組裝對外響應，不重新排序
    ///
    /// `window` 為 dashboard 的交易時段或 developer 的請求區間 (UTC)。
    pub fn assemble(
        &self,
        series: &CandleSeries,
        source: Source,
        audience: Audience,
        granularity: Granularity,
        window: TimeRange,
    ) -> Result<Payload, AssemblyError> {
        check_order(series)?;

        let start_time = format_utc(window.start);
        let end_time = format_utc(window.end);
        let interval_in_minutes = granularity.minutes();

        let payload = match audience {
            Audience::Dashboard => Payload::Dashboard(DashboardPayload {
                candles: series.candles.iter().map(DashboardCandle::from).collect(),
                start_time,
                end_time,
                interval_in_minutes,
                source,
            }),
            Audience::Developer => Payload::Developer(DeveloperPayload {
                candles: series.candles.iter().map(DeveloperCandle::from).collect(),
                source,
                interval_in_minutes,
                start_time,
                end_time,
                closing_price: series.closing_price,
            }),
        };

        Ok(payload)
    }
}

fn check_order(series: &CandleSeries) -> Result<(), AssemblyError> {
    let Some(index) = series.first_out_of_order() else {
        return Ok(());
    };

    let violation = AssemblyError::OutOfOrder {
        symbol: series.symbol.clone(),
        index,
    };
    if cfg!(debug_assertions) {
        return Err(violation);
    }
    error!("K線序列順序錯誤，照原樣輸出: {}", violation);
    Ok(())
}
