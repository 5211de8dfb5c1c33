use crate::config::{self, DatabaseConfig};
use anyhow::{anyhow, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use tokio::sync::OnceCell;

/// 全局市場數據資料庫連接池
static MARKET_DB_POOL: OnceCell<PgPool> = OnceCell::const_new();

/// 初始化市場數據資料庫連接池（唯讀）
pub async fn init_market_data_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let mut options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database);

    options = options.disable_statement_logging();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .max_lifetime(config.max_lifetime())
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .connect_with(options)
        .await?;

    // 測試連接
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// 獲取市場數據資料庫連接池
pub async fn get_market_data_pool() -> Result<&'static PgPool> {
    MARKET_DB_POOL
        .get_or_try_init(|| async {
            let app_config = config::get_config().ok_or_else(|| anyhow!("配置尚未初始化"))?;
            init_market_data_pool(&app_config.database).await
        })
        .await
}
