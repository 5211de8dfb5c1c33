pub mod candles;
pub mod system;
