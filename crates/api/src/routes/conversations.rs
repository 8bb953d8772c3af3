//! Routes and handlers for the `/conversations` resource.
//!
//! The caller identifies itself via `user_id` (query parameter on reads,
//! request body on sends); authenticating that identity is the job of the
//! gateway in front of this service. Membership in the conversation is
//! enforced here.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use educonnect_core::types::DbId;
use educonnect_db::models::Message;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws;

/// Longest accepted message body, in characters.
const MAX_CONTENT_CHARS: usize = 4000;

/// Query parameters for `GET /conversations/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// The participant fetching the history.
    pub user_id: DbId,
}

/// Request body for `POST /conversations/{id}/messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// The participant sending the message.
    pub sender_id: DbId,
    pub content: String,
}

/// GET /api/v1/conversations/{id}/messages
///
/// Fetch the conversation history as the requesting participant may see
/// it. Reconciles any missed unlocks first, so a fetch inside (or after)
/// a session window self-heals messages a scheduled unlock missed.
async fn get_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
    Query(params): Query<HistoryQuery>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let messages = state
        .messaging
        .history(conversation_id, params.user_id)
        .await?;

    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/conversations/{id}/messages
///
/// Send a message. Visibility to the recipient is decided at send time:
/// visible only while a confirmed booking window between the two
/// participants is open. Returns the persisted message, whose
/// `is_visible_to_recipient` flag tells the sender whether it was queued.
async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Message>>)> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Message content must not be empty".into()));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message content exceeds {MAX_CONTENT_CHARS} characters"
        )));
    }

    let message = state
        .messaging
        .send(conversation_id, body.sender_id, content)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}

/// Routes mounted at `/conversations`.
///
/// ```text
/// GET    /{id}/messages  -> get_messages
/// POST   /{id}/messages  -> send_message
/// GET    /{id}/ws        -> chat WebSocket upgrade
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/messages", get(get_messages).post(send_message))
        .route("/{id}/ws", get(ws::chat_ws_handler))
}
