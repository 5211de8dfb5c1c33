use chrono::{DateTime, Utc};

// 重新導出子模塊
pub mod candle;
pub mod instrument;

// 重新導出常用類型
pub use candle::{rows_to_series, CandleStore, PgCandleRepository};
pub use instrument::InstrumentRepository;

#[cfg(test)]
pub use candle::MockCandleStore;

/// 時間範圍查詢，兩端皆包含
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// 起點晚於終點
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}
