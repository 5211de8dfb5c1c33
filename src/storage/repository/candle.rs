use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::domain_types::CandleSeries;
use crate::engine::error::StorageError;
use crate::storage::models::candle::CandleRow;
use crate::storage::repository::instrument::InstrumentRepository;
use crate::storage::repository::TimeRange;

/// 內部K線儲存的唯讀接口
///
/// 返回的序列只包含 OHLC 齊全的K線，並按時間升序排列。
/// 未知的商品代碼返回空序列而非錯誤。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandleStore: Send + Sync {
    async fn fetch(&self, symbol: &str, range: TimeRange) -> Result<CandleSeries, StorageError>;

    /// 儲存健康檢查
    async fn health_check(&self) -> bool {
        true
    }
}

/// 將資料列轉換為序列：剔除不完整列並按時間排序
pub fn rows_to_series(symbol: &str, rows: &[CandleRow]) -> CandleSeries {
    let incomplete = rows.iter().filter(|row| !row.is_complete()).count();
    if incomplete > 0 {
        debug!("{} 剔除 {} 根 OHLC 不完整的K線", symbol, incomplete);
    }
    let candles = rows.iter().filter_map(CandleRow::to_candle).collect();
    let mut series = CandleSeries::new(symbol, candles);
    series.sort_by_time();
    series
}

/// PostgreSQL 分鐘K線倉儲
#[derive(Clone)]
pub struct PgCandleRepository {
    pool: PgPool,
    instruments: InstrumentRepository,
}

impl PgCandleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            instruments: InstrumentRepository::new(pool.clone()),
            pool,
        }
    }

    async fn rows(&self, instrument_id: i32, range: TimeRange) -> Result<Vec<CandleRow>, sqlx::Error> {
        sqlx::query_as::<_, CandleRow>(
            r#"
            SELECT instrument_id, time, open, high, low, close, volume, turnover
            FROM minute_candle
            WHERE instrument_id = $1 AND time >= $2 AND time <= $3
            ORDER BY time ASC
            "#,
        )
        .bind(instrument_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl CandleStore for PgCandleRepository {
    async fn fetch(&self, symbol: &str, range: TimeRange) -> Result<CandleSeries, StorageError> {
        let Some(instrument) = self.instruments.get_by_symbol(symbol).await? else {
            debug!("未知的商品代碼 {}，返回空序列", symbol);
            return Ok(CandleSeries::empty(symbol));
        };

        let rows = self.rows(instrument.instrument_id, range).await?;
        let series = rows_to_series(symbol, &rows);

        debug!(
            "從儲存讀取 {} 的K線 {} 列，保留 {} 根 ({} ~ {})",
            symbol,
            rows.len(),
            series.len(),
            range.start,
            range.end
        );

        Ok(series)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}
