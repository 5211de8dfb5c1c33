// src/api/rest.rs
use anyhow::Result;
use axum::http::StatusCode;
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn};

use super::routes::api_routes;
use super::state::SharedState;
use crate::config::{RestApiConfig, ServerConfig};

pub struct RestApi {
    server_config: ServerConfig,
    api_config: RestApiConfig,
    state: SharedState,
}

impl RestApi {
    pub fn new(server_config: ServerConfig, api_config: RestApiConfig, state: SharedState) -> Self {
        Self {
            server_config,
            api_config,
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        // 建立應用
        let app = self.build_app();

        // 解析地址
        let addr = SocketAddr::from((
            self.server_config.host.parse::<std::net::IpAddr>()?,
            self.server_config.port,
        ));

        info!("Starting REST API server on {}", addr);

        // 啟動服務器
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("REST API server stopped");
        Ok(())
    }

    pub fn build_app(&self) -> Router {
        let api_router = api_routes().with_state(self.state.clone());

        // 建立應用並逐層添加中間件
        let mut app = Router::new()
            .nest(&self.api_config.base_path, api_router)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            )
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(self.api_config.request_timeout),
            ));

        if self.server_config.enable_cors {
            app = app.layer(self.build_cors_layer());
        }
        if self.server_config.enable_compression {
            app = app.layer(CompressionLayer::new());
        }

        app
    }

    fn build_cors_layer(&self) -> CorsLayer {
        let origins = self
            .server_config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<axum::http::HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("忽略無效的 CORS 來源: {}", origin);
                    None
                }
            })
            .collect::<Vec<_>>();

        CorsLayer::new()
            .allow_methods(vec![axum::http::Method::GET])
            .allow_headers(vec![
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::HeaderName::from_static("x-source"),
                axum::http::HeaderName::from_static("x-current-timestamp"),
                axum::http::HeaderName::from_static("x-current-timezone"),
            ])
            .allow_origin(origins)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("無法監聽關閉信號: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到關閉信號，停止接受新請求");
}
