use chrono::{DateTime, Utc};
use thiserror::Error;

/// 請求參數驗證錯誤 (400)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid datetime '{0}', expected YYYY-MM-DDTHH:mm:ss")]
    InvalidTimestamp(String),

    #[error("invalid interval '{value}'. Must be one of: {valid}")]
    InvalidInterval { value: String, valid: String },

    #[error("invalid timezone '{0}', expected an IANA zone name")]
    InvalidZone(String),

    #[error("invalid source '{0}', expected dashboard or developer")]
    InvalidSource(String),

    #[error("invalid boolean '{value}' for {field}")]
    InvalidFlag { field: &'static str, value: String },

    #[error("start_datetime {start} is after end_datetime {end}")]
    InvertedRange { start: String, end: String },
}

/// 上游券商錯誤 (500，限流為 429)
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("broker request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("broker returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("broker rate limit exceeded")]
    RateLimited,

    #[error("broker call timed out after {0}s")]
    Timeout(u64),

    #[error("broker returned malformed data: {0}")]
    Malformed(String),

    #[error("broker reported failure for {0}")]
    Failure(String),
}

/// 內部儲存錯誤 (500)
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// 響應組裝錯誤，表示上游協作者違反了排序契約
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("series for {symbol} is out of order at index {index}")]
    OutOfOrder { symbol: String, index: usize },
}

/// 解析引擎的統一錯誤類型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("Cannot access data at {requested}. Data must be before current execution timestamp ({as_of})")]
    Forbidden {
        requested: DateTime<Utc>,
        as_of: DateTime<Utc>,
    },
}

impl EngineError {
    /// 對應的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::Validation(_) => 400,
            EngineError::Forbidden { .. } => 403,
            EngineError::Upstream(UpstreamError::RateLimited) => 429,
            EngineError::Upstream(_) | EngineError::Storage(_) | EngineError::Assembly(_) => 500,
        }
    }
}

/// 引擎結果類型別名
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_code_mapping() {
        let validation = EngineError::from(ValidationError::MissingParameter("symbol"));
        assert_eq!(validation.status_code(), 400);

        let upstream = EngineError::from(UpstreamError::Timeout(30));
        assert_eq!(upstream.status_code(), 500);

        let limited = EngineError::from(UpstreamError::RateLimited);
        assert_eq!(limited.status_code(), 429);

        let storage = EngineError::from(StorageError::Unavailable("pool closed".into()));
        assert_eq!(storage.status_code(), 500);

        let t = Utc.with_ymd_and_hms(2025, 12, 1, 4, 0, 0).unwrap();
        let forbidden = EngineError::Forbidden { requested: t, as_of: t };
        assert_eq!(forbidden.status_code(), 403);
    }

    #[test]
    fn test_interval_message_lists_valid_values() {
        let err = ValidationError::InvalidInterval {
            value: "7minute".into(),
            valid: "1minute, 2minute".into(),
        };
        assert_eq!(err.to_string(), "invalid interval '7minute'. Must be one of: 1minute, 2minute");
    }
}
