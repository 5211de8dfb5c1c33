use async_trait::async_trait;

use crate::domain_types::{CandleSeries, Granularity};
use crate::engine::error::UpstreamError;
use crate::storage::repository::TimeRange;

/// 券商歷史K線接口
///
/// 實作必須剔除 OHLC 不完整的K線並按時間升序返回。不重試，不快取。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn fetch(
        &self,
        symbol: &str,
        range: TimeRange,
        granularity: Granularity,
    ) -> Result<CandleSeries, UpstreamError>;
}
