//! API route handlers for the gateway.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use prodibot_core::error::ProdibotError;

use super::server::AppState;

/// Map an engine error to an HTTP response with a JSON error body.
fn error_response(err: ProdibotError) -> Response {
    let status = match &err {
        ProdibotError::EmptyInput | ProdibotError::InvalidRating(_) => StatusCode::BAD_REQUEST,
        ProdibotError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!("request failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(serde_json::json!({ "status": "error", "error": err.to_string() })),
    )
        .into_response()
}

/// Best-effort client address: proxy header first, nothing otherwise.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "prodibot-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// System information endpoint.
pub async fn system_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = state.start_time.elapsed();
    Json(serde_json::json!({
        "service": "prodibot",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.as_secs(),
        "knowledge_entries": state.store.knowledge_count(),
        "gateway": {
            "host": state.gateway_config.host,
            "port": state.gateway_config.port,
        }
    }))
}

#[derive(Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Submit a chat message, get the bot's reply.
pub async fn chat_send(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SendRequest>,
) -> Response {
    let ip = client_ip(&headers);
    match state
        .engine
        .send(body.session_id.as_deref(), &body.message, ip.as_deref())
    {
        Ok(reply) => Json(serde_json::json!({
            "status": "success",
            "session_id": reply.session_id,
            "response": reply.response,
            "matched": reply.matched,
            "confidence": reply.confidence,
            "message_id": reply.message_id,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Full message history for a session.
pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    match state.engine.history(&session_id) {
        Ok(messages) => Json(serde_json::json!({
            "status": "success",
            "session_id": session_id,
            "messages": messages,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub message_id: i64,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

/// Rate a bot reply.
pub async fn chat_feedback(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FeedbackRequest>,
) -> Response {
    match state
        .engine
        .feedback(body.message_id, body.rating, &body.comment)
    {
        Ok(()) => Json(serde_json::json!({ "status": "success" })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Active quick replies for the widget, in display order.
pub async fn quick_replies(State(state): State<Arc<AppState>>) -> Response {
    match state.store.active_quick_replies() {
        Ok(replies) => Json(serde_json::json!({
            "status": "success",
            "quick_replies": replies,
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// Knowledge-entry summaries for editor tooling (answers omitted).
pub async fn knowledge_summary(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_knowledge() {
        Ok(entries) => {
            let summaries: Vec<serde_json::Value> = entries
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "id": e.id,
                        "category": e.category,
                        "question": e.question,
                        "priority": e.priority,
                        "active": e.active,
                    })
                })
                .collect();
            Json(serde_json::json!({
                "status": "success",
                "entries": summaries,
            }))
            .into_response()
        }
        Err(e) => error_response(e),
    }
}
