//! HTTP server implementation using Axum.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use prodibot_core::config::{GatewayConfig, ProdibotConfig};
use prodibot_engine::ChatEngine;
use prodibot_store::ChatStore;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub gateway_config: GatewayConfig,
    pub start_time: std::time::Instant,
    /// The chat engine — session handling, matching, persistence.
    pub engine: Arc<ChatEngine>,
    /// Direct store handle for read-only endpoints (quick replies,
    /// knowledge summaries).
    pub store: Arc<ChatStore>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);

    Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/api/v1/info", get(super::routes::system_info))
        .route("/api/v1/chat/send", post(super::routes::chat_send))
        .route(
            "/api/v1/chat/history/{session_id}",
            get(super::routes::chat_history),
        )
        .route("/api/v1/chat/feedback", post(super::routes::chat_feedback))
        .route(
            "/api/v1/chat/quick-replies",
            get(super::routes::quick_replies),
        )
        .route("/api/v1/knowledge", get(super::routes::knowledge_summary))
        .layer(
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(config: &ProdibotConfig) -> anyhow::Result<()> {
    let db_path = config.database.resolved_path();
    let store = Arc::new(ChatStore::open(&db_path)?);
    tracing::info!("Knowledge base: {} entries ({})", store.knowledge_count(), db_path.display());
    if !config.chat.persist_history {
        tracing::warn!("Chat history persistence is disabled — feedback and history endpoints will be empty");
    }

    let engine = Arc::new(ChatEngine::new(store.clone(), &config.chat));
    let state = AppState {
        gateway_config: config.gateway.clone(),
        start_time: std::time::Instant::now(),
        engine,
        store,
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Gateway server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
