//! HTTP routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::chat_handler::{ApiError, ChatHandler, ChatRequest, ChatResponse};

pub fn router(handler: Arc<ChatHandler>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(handler)
}

pub async fn chat(
    State(handler): State<Arc<ChatHandler>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    handler.chat(request).await.map(Json)
}

pub async fn health(State(handler): State<Arc<ChatHandler>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "products": handler.assistant().catalog().ids(),
    }))
}
