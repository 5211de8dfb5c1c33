//! 數據來源邊界策略
//!
//! 純函數：根據請求範圍、粒度、忽略儲存旗標與「今天」決定從內部儲存
//! 還是券商取數。不讀取系統時鐘，「今天」必須由呼叫方傳入。

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain_types::Granularity;
use crate::engine::request::RequestRange;
use crate::engine::timezone::TimeZoneNormalizer;

/// 數據來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Db,
    Broker,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Db => "db",
            Source::Broker => "broker",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 內部儲存被信任的區間，兩端皆包含
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreWindow {
    /// 交易所本地日期
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// start_date 本地 00:00:00
    pub start_instant: DateTime<Utc>,
    /// end_date 本地 23:59:59
    pub end_instant: DateTime<Utc>,
}

impl StoreWindow {
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn contains_span(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start_instant && end <= self.end_instant
    }
}

/// 邊界策略
#[derive(Debug, Clone, Copy)]
pub struct BoundaryPolicy {
    window_start: NaiveDate,
    normalizer: TimeZoneNormalizer,
}

impl BoundaryPolicy {
    pub fn new(window_start: NaiveDate, normalizer: TimeZoneNormalizer) -> Self {
        Self {
            window_start,
            normalizer,
        }
    }

    pub fn window_start(&self) -> NaiveDate {
        self.window_start
    }

    /// 計算相對於 `today` (交易所本地日期) 的儲存窗口
    ///
    /// 窗口上限永遠是昨天，當天數據可能仍在寫入。窗口為空時返回 None。
    pub fn store_window(&self, today: NaiveDate) -> Option<StoreWindow> {
        let end_date = today.pred_opt()?;
        if self.window_start > end_date {
            return None;
        }
        let start_instant = self.normalizer.local_midnight(self.window_start)?;
        let end_instant = self.normalizer.local_midnight(today)? - Duration::seconds(1);

        Some(StoreWindow {
            start_date: self.window_start,
            end_date,
            start_instant,
            end_instant,
        })
    }

    /// 依序套用規則，第一條成立者勝出
    pub fn decide(
        &self,
        range: &RequestRange,
        granularity: Granularity,
        ignore_store: bool,
        today: NaiveDate,
    ) -> Source {
        if ignore_store {
            return Source::Broker;
        }
        if !granularity.is_one_minute() {
            return Source::Broker;
        }
        let Some(window) = self.store_window(today) else {
            return Source::Broker;
        };

        let inside = match range {
            RequestRange::SingleDay { date, .. } => window.contains_date(*date),
            RequestRange::Span { start, end } => window.contains_span(*start, *end),
        };
        if inside {
            Source::Db
        } else {
            Source::Broker
        }
    }
}
