use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 金融商品模型 (由數據採集管線寫入，本服務唯讀)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Instrument {
    pub instrument_id: i32,
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub is_active: bool,
}
