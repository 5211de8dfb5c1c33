//! 解析編排：驗證後的請求 -> 邊界決策 -> 取數 -> 組裝

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::broker::BrokerGateway;
use crate::engine::assembler::{Payload, ResponseAssembler};
use crate::engine::boundary::{BoundaryPolicy, Source};
use crate::engine::error::{EngineError, EngineResult, UpstreamError};
use crate::engine::request::ResolutionRequest;
use crate::engine::timezone::TimeZoneNormalizer;
use crate::storage::repository::CandleStore;

/// 時鐘抽象，邊界策略所需的「今天」由此取得
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系統時鐘
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時鐘
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 單次解析結果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub source: Source,
    pub payload: Payload,
}

/// K線解析器
///
/// 每個請求只會呼叫儲存或券商其中之一，兩者結果不合併。
pub struct CandleResolver {
    store: Arc<dyn CandleStore>,
    gateway: Arc<dyn BrokerGateway>,
    policy: BoundaryPolicy,
    normalizer: TimeZoneNormalizer,
    assembler: ResponseAssembler,
    clock: Arc<dyn Clock>,
    broker_timeout: Duration,
}

impl CandleResolver {
    pub fn new(
        store: Arc<dyn CandleStore>,
        gateway: Arc<dyn BrokerGateway>,
        policy: BoundaryPolicy,
        normalizer: TimeZoneNormalizer,
        clock: Arc<dyn Clock>,
        broker_timeout: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            policy,
            normalizer,
            assembler: ResponseAssembler::new(),
            clock,
            broker_timeout,
        }
    }

    pub fn normalizer(&self) -> &TimeZoneNormalizer {
        &self.normalizer
    }

    /// 儲存健康狀態
    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await
    }

    /// 解析單一請求
    pub async fn resolve(&self, request: &ResolutionRequest) -> EngineResult<Resolution> {
        self.resolve_inner(request).await.inspect_err(|e| {
            error!(
                "解析K線失敗 symbol={} interval={} range={}~{} zone={} audience={} ignore_store={}: {}",
                request.symbol,
                request.granularity,
                request.range.start(),
                request.range.end(),
                request.zone,
                request.audience,
                request.ignore_store,
                e
            );
        })
    }

    /// 並行解析多個請求，各自獨立返回結果
    pub async fn resolve_many(&self, requests: &[ResolutionRequest]) -> Vec<EngineResult<Resolution>> {
        join_all(requests.iter().map(|request| self.resolve(request))).await
    }

    async fn resolve_inner(&self, request: &ResolutionRequest) -> EngineResult<Resolution> {
        if let Some(as_of) = request.as_of {
            let requested = request.range.end();
            if requested > as_of {
                return Err(EngineError::Forbidden { requested, as_of });
            }
        }

        let today = self.normalizer.local_date(self.clock.now());
        let source = self
            .policy
            .decide(&request.range, request.granularity, request.ignore_store, today);

        debug!(
            "邊界決策 symbol={} interval={} today={} -> {}",
            request.symbol, request.granularity, today, source
        );

        let range = request.range.time_range();
        let series = match source {
            Source::Db => self.store.fetch(&request.symbol, range).await?,
            Source::Broker => {
                let call = self.gateway.fetch(&request.symbol, range, request.granularity);
                tokio::time::timeout(self.broker_timeout, call)
                    .await
                    .map_err(|_| UpstreamError::Timeout(self.broker_timeout.as_secs()))??
            }
        };

        let payload = self
            .assembler
            .assemble(&series, source, request.audience, request.granularity, range)?;

        info!(
            "解析完成 symbol={} interval={} source={} candles={}",
            request.symbol,
            request.granularity.display_name(),
            source,
            payload.candle_count()
        );

        Ok(Resolution { source, payload })
    }
}
