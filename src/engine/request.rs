//! 解析請求：原始查詢參數 -> 已驗證的 ResolutionRequest
//!
//! 所有驗證都在邊界策略判斷之前完成，未通過驗證的請求不會觸及儲存或券商。

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain_types::{Granularity, TradingSession};
use crate::engine::error::ValidationError;
use crate::engine::timezone::{parse_date_literal, TimeZoneNormalizer};
use crate::storage::repository::TimeRange;

/// 響應對象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Dashboard,
    Developer,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Dashboard => "dashboard",
            Audience::Developer => "developer",
        }
    }
}

impl FromStr for Audience {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(Audience::Dashboard),
            "developer" => Ok(Audience::Developer),
            other => Err(ValidationError::InvalidSource(other.to_string())),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 請求的時間範圍
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRange {
    /// 單一交易日 (dashboard)，start/end 為該日交易時段的 UTC 時刻
    SingleDay {
        date: NaiveDate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// 明確的起訖時刻 (developer)
    Span {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl RequestRange {
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            RequestRange::SingleDay { start, .. } | RequestRange::Span { start, .. } => *start,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            RequestRange::SingleDay { end, .. } | RequestRange::Span { end, .. } => *end,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start(), self.end())
    }
}

/// 已驗證的解析請求
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRequest {
    pub symbol: String,
    pub granularity: Granularity,
    pub range: RequestRange,
    pub ignore_store: bool,
    pub audience: Audience,
    /// 呼叫方時區，用於回報與日誌
    pub zone: Tz,
    /// 回測執行時刻，請求不得讀取此時刻之後的數據
    pub as_of: Option<DateTime<Utc>>,
}

impl ResolutionRequest {
    pub fn with_as_of(mut self, as_of: Option<DateTime<Utc>>) -> Self {
        self.as_of = as_of;
        self
    }

    /// dashboard 查詢參數驗證
    pub fn from_dashboard(
        query: &DashboardQuery,
        normalizer: &TimeZoneNormalizer,
        session: &TradingSession,
    ) -> Result<Self, ValidationError> {
        let symbol = required(&query.symbol, "symbol")?;
        let date = parse_date_literal(required(&query.date, "date")?)?;
        let granularity = parse_interval(query.interval.as_deref())?;
        let ignore_store = parse_flag(query.ignore_db.as_deref(), "ignoreDb")?;
        let zone = normalizer.resolve_zone(query.timezone.as_deref())?;
        let (start, end) = normalizer.session_bounds(date, session)?;

        Ok(Self {
            symbol: symbol.to_string(),
            granularity,
            range: RequestRange::SingleDay { date, start, end },
            ignore_store,
            audience: Audience::Dashboard,
            zone,
            as_of: None,
        })
    }

    /// developer 查詢參數驗證
    pub fn from_developer(
        query: &DeveloperQuery,
        normalizer: &TimeZoneNormalizer,
    ) -> Result<Self, ValidationError> {
        let symbol = required(&query.symbol, "symbol")?;
        let start_literal = required(&query.start_datetime, "start_datetime")?;
        let end_literal = required(&query.end_datetime, "end_datetime")?;
        let granularity = parse_interval(query.interval.as_deref())?;
        let ignore_store = parse_flag(query.ignore_db.as_deref(), "ignoreDb")?;
        let zone = normalizer.resolve_zone(query.timezone.as_deref())?;

        let start = normalizer.to_utc_in(start_literal, zone)?;
        let end = normalizer.to_utc_in(end_literal, zone)?;
        if TimeRange::new(start, end).is_inverted() {
            return Err(ValidationError::InvertedRange {
                start: start_literal.to_string(),
                end: end_literal.to_string(),
            });
        }

        Ok(Self {
            symbol: symbol.to_string(),
            granularity,
            range: RequestRange::Span { start, end },
            ignore_store,
            audience: Audience::Developer,
            zone,
            as_of: None,
        })
    }
}

/// dashboard 查詢參數
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub symbol: Option<String>,
    pub date: Option<String>,
    pub interval: Option<String>,
    #[serde(rename = "ignoreDb")]
    pub ignore_db: Option<String>,
    pub timezone: Option<String>,
}

/// developer 查詢參數
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeveloperQuery {
    pub symbol: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub interval: Option<String>,
    #[serde(rename = "ignoreDb")]
    pub ignore_db: Option<String>,
    pub timezone: Option<String>,
}

/// developer 批次查詢參數，`symbols` 以逗號分隔
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeveloperBatchQuery {
    pub symbols: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub interval: Option<String>,
    #[serde(rename = "ignoreDb")]
    pub ignore_db: Option<String>,
    pub timezone: Option<String>,
}

impl DeveloperBatchQuery {
    /// 拆分代碼列表，去除空白與重複，保持原順序
    pub fn symbols(&self) -> Result<Vec<String>, ValidationError> {
        let raw = required(&self.symbols, "symbols")?;
        let mut symbols: Vec<String> = Vec::new();
        for symbol in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !symbols.iter().any(|s| s == symbol) {
                symbols.push(symbol.to_string());
            }
        }
        if symbols.is_empty() {
            return Err(ValidationError::MissingParameter("symbols"));
        }
        Ok(symbols)
    }

    /// 為每個代碼構建 developer 請求，共用參數只驗證一次
    pub fn requests(&self, normalizer: &TimeZoneNormalizer) -> Result<Vec<ResolutionRequest>, ValidationError> {
        let symbols = self.symbols()?;
        let template = ResolutionRequest::from_developer(
            &DeveloperQuery {
                symbol: symbols.first().cloned(),
                start_datetime: self.start_datetime.clone(),
                end_datetime: self.end_datetime.clone(),
                interval: self.interval.clone(),
                ignore_db: self.ignore_db.clone(),
                timezone: self.timezone.clone(),
            },
            normalizer,
        )?;

        Ok(symbols
            .into_iter()
            .map(|symbol| ResolutionRequest {
                symbol,
                ..template.clone()
            })
            .collect())
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingParameter(name)),
    }
}

/// 未提供時預設為 1minute
pub fn parse_interval(value: Option<&str>) -> Result<Granularity, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(Granularity::default()),
        Some(v) => v.parse().map_err(|_| ValidationError::InvalidInterval {
            value: v.to_string(),
            valid: Granularity::valid_names(),
        }),
    }
}

fn parse_flag(value: Option<&str>, field: &'static str) -> Result<bool, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(ValidationError::InvalidFlag {
            field,
            value: other.to_string(),
        }),
    }
}
