use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::chat::{BotInfo, ChatOutcome, Chatbot, ErrorKind};
use crate::error::MembotError;
use crate::memory::{ConversationExport, Exchange, MemoryStats};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
}

pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn info_handler(State(state): State<Arc<AppState>>) -> Json<BotInfo> {
    Json(state.info.clone())
}

pub async fn create_session_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.create_session() {
        Ok(session_id) => (StatusCode::CREATED, Json(SessionCreated { session_id })).into_response(),
        Err(MembotError::SessionLimit(active)) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "too_many_sessions",
            &format!("{active} sessions are active; delete one or try again later"),
        ),
        Err(e) => {
            tracing::error!("Failed to create session: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "session_unavailable",
                "Failed to initialize chatbot",
            )
        }
    }
}

pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    if state.remove_session(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        session_not_found(&id)
    }
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Response {
    with_session(&state, &id, |bot| async move {
        // Run detached so a dropped request still finishes the exchange
        let exchange = tokio::spawn(async move { bot.chat(&request.message).await });
        match exchange.await {
            Ok(outcome) => Json::<ChatOutcome>(outcome).into_response(),
            Err(e) => {
                tracing::error!("Chat task failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ChatOutcome::failure(ErrorKind::Internal)),
                )
                    .into_response()
            }
        }
    })
    .await
}

pub async fn stats_handler(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    with_session(&state, &id, |bot| async move {
        Json::<MemoryStats>(bot.stats().await).into_response()
    })
    .await
}

pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Response {
    with_session(&state, &id, |bot| async move {
        Json::<Vec<Exchange>>(bot.history().await).into_response()
    })
    .await
}

pub async fn clear_handler(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    with_session(&state, &id, |bot| async move {
        Json(ClearResponse {
            success: bot.clear().await,
        })
        .into_response()
    })
    .await
}

pub async fn export_handler(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Response {
    with_session(&state, &id, |bot| async move {
        Json::<ConversationExport>(bot.export().await).into_response()
    })
    .await
}

async fn with_session<F, Fut>(state: &AppState, id: &Uuid, f: F) -> Response
where
    F: FnOnce(Arc<Chatbot>) -> Fut,
    Fut: std::future::Future<Output = Response>,
{
    match state.session(id) {
        Some(bot) => f(bot).await,
        None => session_not_found(id),
    }
}

fn session_not_found(id: &Uuid) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "session_not_found",
        &format!("Session '{id}' does not exist"),
    )
}

fn error_response(status: StatusCode, error_type: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "type": error_type,
            "message": message,
        }
    });
    (status, Json(body)).into_response()
}
