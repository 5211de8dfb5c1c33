use anyhow::{anyhow, Context, Result};
use candle_server::api::{AppState, RestApi};
use candle_server::broker::GrowwGateway;
use candle_server::config::{self, ApplicationConfig, LogConfig};
use candle_server::engine::{BoundaryPolicy, CandleResolver, SystemClock, TimeZoneNormalizer};
use candle_server::storage::{database, PgCandleRepository};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "candle_server", about = "歷史K線解析服務")]
struct Cli {
    /// 配置目錄 (覆蓋 CONFIG_DIR)
    #[arg(long)]
    config_dir: Option<String>,

    /// 運行環境 development 或 production (覆蓋 CANDLE_ENV)
    #[arg(long)]
    env: Option<String>,

    /// 只驗證配置後退出
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(dir) = &cli.config_dir {
        std::env::set_var("CONFIG_DIR", dir);
    }
    if let Some(env) = &cli.env {
        std::env::set_var("CANDLE_ENV", env);
    }

    // 初始化配置
    let app_config = config::init_config().context("無法加載應用程序配置")?;

    // 初始化日誌系統
    init_logging(&app_config.log)?;

    if cli.check_config {
        use candle_server::config::Validator;
        app_config.validate().map_err(|e| anyhow!("配置驗證失敗: {}", e))?;
        info!("配置驗證通過");
        return Ok(());
    }

    let state = build_state(app_config).await?;

    // 初始化REST API
    info!("監聽端口: {}", app_config.server.port);
    let rest_api = RestApi::new(app_config.server.clone(), app_config.rest_api.clone(), state);
    rest_api.start().await?;

    info!("伺服器已關閉");
    Ok(())
}

async fn build_state(app_config: &ApplicationConfig) -> Result<Arc<AppState>> {
    let market = &app_config.market;
    let normalizer = TimeZoneNormalizer::new(market.zone()?);
    let session = market.session()?;
    let policy = BoundaryPolicy::new(market.window_start()?, normalizer);

    // 獲取全局資料庫連線池
    let db_pool = database::get_market_data_pool()
        .await
        .context("無法初始化市場數據資料庫連接池")?;
    let store = PgCandleRepository::new(db_pool.clone());

    let gateway = GrowwGateway::new(&app_config.broker, normalizer).context("無法建立券商網關")?;

    let resolver = CandleResolver::new(
        Arc::new(store),
        Arc::new(gateway),
        policy,
        normalizer,
        Arc::new(SystemClock),
        app_config.broker.timeout(),
    );

    info!(
        "解析引擎就緒: timezone={}, session={}~{}, store_window_start={}",
        market.timezone,
        session.open,
        session.close,
        policy.window_start()
    );

    Ok(AppState::new(resolver, session))
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<()> {
    let level = match log_config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // 默認為INFO
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let result = if log_config.format.eq_ignore_ascii_case("json") {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(())
}
