// api.rs - API服務模組，宣告子模組
//
// 對外提供K線查詢接口：
// - dashboard 與 developer 兩種響應形狀
// - 系統健康檢查

/// REST API實現
pub mod rest;
/// API路由定義
pub mod routes;
/// API處理器模組
pub mod handlers;
/// 響應封裝與錯誤映射
pub mod response;
/// 共享狀態
pub mod state;

pub use rest::RestApi;
pub use state::AppState;
