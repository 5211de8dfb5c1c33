use std::sync::Arc;

use crate::domain_types::TradingSession;
use crate::engine::CandleResolver;

/// 處理器共享的唯讀狀態
pub struct AppState {
    pub resolver: CandleResolver,
    pub session: TradingSession,
}

impl AppState {
    pub fn new(resolver: CandleResolver, session: TradingSession) -> Arc<Self> {
        Arc::new(Self { resolver, session })
    }
}

pub type SharedState = Arc<AppState>;
