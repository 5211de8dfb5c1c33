use sqlx::PgPool;

use crate::engine::error::StorageError;
use crate::storage::models::instrument::Instrument;

/// 金融商品數據庫操作 (唯讀)
#[derive(Clone)]
pub struct InstrumentRepository {
    pool: PgPool,
}

impl InstrumentRepository {
    /// 創建新的金融商品數據庫操作實例
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 根據代碼獲取金融商品
    pub async fn get_by_symbol(&self, symbol: &str) -> Result<Option<Instrument>, StorageError> {
        let instrument = sqlx::query_as::<_, Instrument>(
            r#"
            SELECT instrument_id, symbol, name, exchange, is_active
            FROM instrument
            WHERE symbol = $1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        Ok(instrument)
    }
}
