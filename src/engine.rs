//! K線解析引擎
//!
//! 驗證請求、決定數據來源 (內部儲存或券商)、取數並依對象組裝響應。

pub mod assembler;
pub mod boundary;
pub mod error;
pub mod request;
pub mod resolver;
pub mod timezone;

pub use assembler::{Payload, ResponseAssembler};
pub use boundary::{BoundaryPolicy, Source, StoreWindow};
pub use error::{AssemblyError, EngineError, EngineResult, StorageError, UpstreamError, ValidationError};
pub use request::{Audience, DashboardQuery, DeveloperBatchQuery, DeveloperQuery, RequestRange, ResolutionRequest};
pub use resolver::{CandleResolver, Clock, FixedClock, Resolution, SystemClock};
pub use timezone::TimeZoneNormalizer;
