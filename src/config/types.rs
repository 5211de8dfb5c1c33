use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::validation::{ValidationError, ValidationUtils, Validator};
use crate::domain_types::TradingSession;

/// 應用程序配置結構
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub database: DatabaseConfig,
    pub log: LogConfig,
    pub server: ServerConfig,
    pub rest_api: RestApiConfig,
    pub market: MarketConfig,
    pub broker: BrokerConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證各個部分的配置
        self.database.validate()?;
        self.log.validate()?;
        self.server.validate()?;
        self.rest_api.validate()?;
        self.market.validate()?;
        self.broker.validate()?;

        Ok(())
    }
}

/// 數據庫配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime_secs: u64,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Validator for DatabaseConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證數據庫配置
        ValidationUtils::not_empty(&self.host, "database.host")?;
        ValidationUtils::not_empty(&self.username, "database.username")?;
        ValidationUtils::not_empty(&self.database, "database.database")?;
        ValidationUtils::in_range(self.port, 1, 65535, "database.port")?;
        ValidationUtils::in_range(self.max_connections, self.min_connections, 1000, "database.max_connections")?;

        Ok(())
    }
}

impl DatabaseConfig {
    /// 獲取最大生命週期持續時間
    pub fn max_lifetime(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.max_lifetime_secs)
    }

    /// 獲取獲取連接超時持續時間
    pub fn acquire_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.acquire_timeout_secs)
    }

    /// 獲取閒置超時持續時間
    pub fn idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.idle_timeout_secs)
    }
}

/// 日誌配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase().as_str(),
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(&self.format.to_lowercase().as_str(), &["pretty", "json"], "log.format")?;

        Ok(())
    }
}

/// 伺服器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_compression: bool,
    pub enable_cors: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl Validator for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // 驗證服務器配置
        ValidationUtils::not_empty(&self.host, "server.host")?;
        ValidationUtils::in_range(self.port, 1, 65535, "server.port")?;

        // CORS設定驗證
        if self.enable_cors && self.cors_allowed_origins.is_empty() {
            return Err(ValidationError::InvalidValue(
                "啟用CORS但未指定允許的來源".to_string(),
            ));
        }

        Ok(())
    }
}

/// REST API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestApiConfig {
    pub base_path: String,
    pub request_timeout: u64,
}

impl Validator for RestApiConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.base_path, "rest_api.base_path")?;
        ValidationUtils::in_range(self.request_timeout, 1, 600, "rest_api.request_timeout")?;
        if !self.base_path.starts_with('/') {
            return Err(ValidationError::InvalidValue(format!(
                "rest_api.base_path 必須以 '/' 開頭: {}",
                self.base_path
            )));
        }

        Ok(())
    }
}

/// 市場配置：交易所時區、交易時段與內部儲存窗口起點
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// IANA 時區名稱
    pub timezone: String,
    /// 開盤時間 "HH:MM:SS" (交易所本地)
    pub session_open: String,
    /// 收盤時間 "HH:MM:SS" (交易所本地)
    pub session_close: String,
    /// 內部儲存最早可信日期 "YYYY-MM-DD"
    pub store_window_start: String,
}

impl MarketConfig {
    pub fn zone(&self) -> Result<chrono_tz::Tz, ValidationError> {
        ValidationUtils::parse_as(&self.timezone, "market.timezone")
    }

    pub fn session(&self) -> Result<TradingSession, ValidationError> {
        TradingSession::parse(&self.session_open, &self.session_close).map_err(|e| {
            ValidationError::InvalidValue(format!(
                "market.session_open/session_close 格式錯誤 ({} - {}): {}",
                self.session_open, self.session_close, e
            ))
        })
    }

    pub fn window_start(&self) -> Result<NaiveDate, ValidationError> {
        NaiveDate::parse_from_str(&self.store_window_start, "%Y-%m-%d").map_err(|e| {
            ValidationError::InvalidValue(format!(
                "market.store_window_start 格式錯誤 {}: {}",
                self.store_window_start, e
            ))
        })
    }
}

impl Validator for MarketConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.timezone, "market.timezone")?;
        self.zone()?;
        self.window_start()?;

        let session = self.session()?;
        if session.open >= session.close {
            return Err(ValidationError::RangeError {
                field: "market.session_open".to_string(),
                value: self.session_open.clone(),
                min: NaiveTime::MIN.to_string(),
                max: self.session_close.clone(),
            });
        }

        Ok(())
    }
}

/// 券商 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub base_url: String,
    pub access_token: String,
    pub exchange: String,
    pub segment: String,
    pub timeout_secs: u64,
}

impl BrokerConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Validator for BrokerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        ValidationUtils::not_empty(&self.base_url, "broker.base_url")?;
        ValidationUtils::not_empty(&self.exchange, "broker.exchange")?;
        ValidationUtils::not_empty(&self.segment, "broker.segment")?;
        ValidationUtils::in_range(self.timeout_secs, 1, 300, "broker.timeout_secs")?;
        ValidationUtils::check_dependency(
            self.base_url.starts_with("https://"),
            !self.access_token.trim().is_empty(),
            "broker.base_url (https)",
            "broker.access_token",
        )?;

        Ok(())
    }
}
