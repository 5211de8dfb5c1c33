//! K線與K線序列

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 單根 OHLC K線
///
/// OHLC 四個價格均已確定存在；不完整的K線在進入序列前就會被剔除。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<i64>,
    pub turnover: Option<f64>,
}

impl Candle {
    /// 從可能缺值的 OHLC 構建K線，任一價格缺失時返回 None
    pub fn from_parts(
        time: DateTime<Utc>,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        volume: Option<i64>,
        turnover: Option<f64>,
    ) -> Option<Self> {
        Some(Self {
            time,
            open: open?,
            high: high?,
            low: low?,
            close: close?,
            volume,
            turnover,
        })
    }

    /// Unix 秒級時間戳
    pub fn unix_seconds(&self) -> i64 {
        self.time.timestamp()
    }
}

/// 單一金融商品在一段區間內的K線序列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub candles: Vec<Candle>,
    /// 券商回報的前收盤價；內部儲存不提供
    pub closing_price: Option<f64>,
}

impl CandleSeries {
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        Self {
            symbol: symbol.into(),
            candles,
            closing_price: None,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn with_closing_price(mut self, closing_price: Option<f64>) -> Self {
        self.closing_price = closing_price;
        self
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// 按時間升序穩定排序
    pub fn sort_by_time(&mut self) {
        self.candles.sort_by_key(|c| c.time);
    }

    /// 返回第一個違反時間順序的索引 (candles[i] < candles[i-1])
    pub fn first_out_of_order(&self) -> Option<usize> {
        self.candles
            .windows(2)
            .position(|pair| pair[1].time < pair[0].time)
            .map(|i| i + 1)
    }

    pub fn is_chronological(&self) -> bool {
        self.first_out_of_order().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn candle_at(minute: i64) -> Candle {
        let base = Utc.with_ymd_and_hms(2025, 12, 1, 3, 45, 0).unwrap();
        Candle {
            time: base + Duration::minutes(minute),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: Some(1000),
            turnover: None,
        }
    }

    #[test]
    fn test_from_parts_requires_all_prices() {
        let time = Utc.with_ymd_and_hms(2025, 12, 1, 3, 45, 0).unwrap();
        assert!(Candle::from_parts(time, Some(1.0), Some(2.0), Some(0.5), Some(1.5), None, None).is_some());
        assert!(Candle::from_parts(time, None, Some(2.0), Some(0.5), Some(1.5), None, None).is_none());
        assert!(Candle::from_parts(time, Some(1.0), None, Some(0.5), Some(1.5), None, None).is_none());
        assert!(Candle::from_parts(time, Some(1.0), Some(2.0), None, Some(1.5), None, None).is_none());
        assert!(Candle::from_parts(time, Some(1.0), Some(2.0), Some(0.5), None, None, None).is_none());
    }

    #[test]
    fn test_ordering_detection() {
        let ordered = CandleSeries::new("INFY", vec![candle_at(0), candle_at(1), candle_at(1), candle_at(2)]);
        assert!(ordered.is_chronological());

        let mut unordered = CandleSeries::new("INFY", vec![candle_at(0), candle_at(2), candle_at(1)]);
        assert_eq!(unordered.first_out_of_order(), Some(2));

        unordered.sort_by_time();
        assert!(unordered.is_chronological());
    }

    #[test]
    fn test_empty_series() {
        let series = CandleSeries::empty("TCS");
        assert!(series.is_empty());
        assert!(series.is_chronological());
        assert_eq!(series.closing_price, None);
    }
}
