//! 時區正規化
//!
//! 呼叫方傳入的時間字串不帶時區偏移 (如 `2025-12-31T09:15:00`)，
//! 一律視為指定 IANA 時區的牆上時間。內部統一使用 UTC。
//! 對外輸出格式固定為 `YYYY-MM-DDTHH:mm:ss`，不帶 `Z`、毫秒或偏移。

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::domain_types::TradingSession;
use crate::engine::error::ValidationError;

/// 對外時間字串格式
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// 對外日期字串格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 時區正規化器，攜帶交易所預設時區
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneNormalizer {
    home: Tz,
}

impl TimeZoneNormalizer {
    pub fn new(home: Tz) -> Self {
        Self { home }
    }

    /// 以時區名稱構建
    pub fn from_zone_name(name: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(parse_zone(name)?))
    }

    /// 交易所預設時區
    pub fn home_zone(&self) -> Tz {
        self.home
    }

    /// 解析呼叫方時區，未提供時回退到交易所時區
    pub fn resolve_zone(&self, zone: Option<&str>) -> Result<Tz, ValidationError> {
        match zone.map(str::trim) {
            None | Some("") => Ok(self.home),
            Some(name) => parse_zone(name),
        }
    }

    /// 本地時間字串 + 時區名稱 -> UTC 時刻
    pub fn to_utc(&self, literal: &str, zone: Option<&str>) -> Result<DateTime<Utc>, ValidationError> {
        let tz = self.resolve_zone(zone)?;
        self.to_utc_in(literal, tz)
    }

    /// 本地時間字串在指定時區下轉為 UTC 時刻
    pub fn to_utc_in(&self, literal: &str, tz: Tz) -> Result<DateTime<Utc>, ValidationError> {
        let naive = parse_datetime_literal(literal)?;
        localize(naive, tz).ok_or_else(|| ValidationError::InvalidTimestamp(literal.to_string()))
    }

    /// UTC 時刻 -> 指定時區的本地時間字串
    pub fn from_utc(&self, instant: DateTime<Utc>, zone: Option<&str>) -> Result<String, ValidationError> {
        let tz = self.resolve_zone(zone)?;
        Ok(self.from_utc_in(instant, tz))
    }

    pub fn from_utc_in(&self, instant: DateTime<Utc>, tz: Tz) -> String {
        instant.with_timezone(&tz).format(DATETIME_FORMAT).to_string()
    }

    /// UTC 時刻在交易所時區下的日曆日期
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.home).date_naive()
    }

    /// 交易所時區下某日 00:00:00 對應的 UTC 時刻
    pub fn local_midnight(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        localize(date.and_hms_opt(0, 0, 0)?, self.home)
    }

    /// 交易日開收盤時刻 (UTC)
    pub fn session_bounds(
        &self,
        date: NaiveDate,
        session: &TradingSession,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let invalid = || ValidationError::InvalidDate(date.format(DATE_FORMAT).to_string());
        let start = localize(date.and_time(session.open), self.home).ok_or_else(invalid)?;
        let end = localize(date.and_time(session.close), self.home).ok_or_else(invalid)?;
        Ok((start, end))
    }
}

impl Default for TimeZoneNormalizer {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Kolkata)
    }
}

/// 解析 IANA 時區名稱
pub fn parse_zone(name: &str) -> Result<Tz, ValidationError> {
    name.parse::<Tz>()
        .map_err(|_| ValidationError::InvalidZone(name.to_string()))
}

/// 嚴格解析 `YYYY-MM-DDTHH:mm:ss`
pub fn parse_datetime_literal(literal: &str) -> Result<NaiveDateTime, ValidationError> {
    let invalid = || ValidationError::InvalidTimestamp(literal.to_string());
    if !matches_shape(literal, b"dddd-dd-ddTdd:dd:dd") {
        return Err(invalid());
    }
    let naive = NaiveDateTime::parse_from_str(literal, DATETIME_FORMAT).map_err(|_| invalid())?;
    // %S 接受 60 並以閏秒表示，對外格式不允許
    if naive.nanosecond() >= 1_000_000_000 {
        return Err(invalid());
    }
    Ok(naive)
}

/// 嚴格解析 `YYYY-MM-DD`
pub fn parse_date_literal(literal: &str) -> Result<NaiveDate, ValidationError> {
    let invalid = || ValidationError::InvalidDate(literal.to_string());
    if !matches_shape(literal, b"dddd-dd-dd") {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(literal, DATE_FORMAT).map_err(|_| invalid())
}

/// UTC 時刻格式化為對外字串
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format(DATETIME_FORMAT).to_string()
}

// chrono 的 %Y/%m 接受可變寬度與正負號，先按固定字元形狀過濾
fn matches_shape(value: &str, shape: &[u8]) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == shape.len()
        && bytes.iter().zip(shape).all(|(b, s)| match s {
            b'd' => b.is_ascii_digit(),
            other => b == other,
        })
}

// 夏令時重疊取較早時刻，跳空時段不存在則返回 None
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
