//! 交易時段定義

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// 交易所每日開收盤時間 (交易所本地時間)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingSession {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl TradingSession {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    /// 以 "HH:MM:SS" 字串構建
    pub fn parse(open: &str, close: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            open: NaiveTime::parse_from_str(open, "%H:%M:%S")?,
            close: NaiveTime::parse_from_str(close, "%H:%M:%S")?,
        })
    }
}

// NSE 現貨市場 09:15 - 15:30
const NSE_OPEN_SECS: u32 = 9 * 3600 + 15 * 60;
const NSE_CLOSE_SECS: u32 = 15 * 3600 + 30 * 60;

impl Default for TradingSession {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_num_seconds_from_midnight_opt(NSE_OPEN_SECS, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_num_seconds_from_midnight_opt(NSE_CLOSE_SECS, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}
