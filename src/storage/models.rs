pub mod candle;
pub mod instrument;

// 重新匯出常用模型類型
pub use candle::CandleRow;
pub use instrument::Instrument;
