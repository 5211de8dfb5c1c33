pub mod candle;
pub mod granularity;
pub mod session;

pub use candle::{Candle, CandleSeries};
pub use granularity::{Granularity, UnknownGranularity};
pub use session::TradingSession;
