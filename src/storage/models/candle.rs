use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain_types::Candle;

/// 分鐘K線資料列
///
/// OHLC 可為 NULL：採集管線會為缺口寫入佔位列，這些列不是有效的市場數據。
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandleRow {
    pub instrument_id: i32,
    pub time: DateTime<Utc>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: i64,
    pub turnover: Option<Decimal>,
}

impl CandleRow {
    /// OHLC 是否齊全
    pub fn is_complete(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some() && self.close.is_some()
    }

    /// 轉換為領域K線，不完整的列返回 None
    pub fn to_candle(&self) -> Option<Candle> {
        Candle::from_parts(
            self.time,
            self.open.and_then(|d| d.to_f64()),
            self.high.and_then(|d| d.to_f64()),
            self.low.and_then(|d| d.to_f64()),
            self.close.and_then(|d| d.to_f64()),
            Some(self.volume),
            self.turnover.and_then(|d| d.to_f64()),
        )
    }
}
