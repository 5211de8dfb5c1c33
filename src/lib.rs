// 模組定義
pub mod api;
pub mod broker;
pub mod config;
pub mod domain_types;
pub mod engine;
pub mod storage;
