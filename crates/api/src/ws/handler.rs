use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use educonnect_core::types::DbId;
use educonnect_messaging::MessagingError;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Query parameters for the chat WebSocket upgrade.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// The participant behind this connection. Authenticating the
    /// identity is the gateway's job; membership is checked here.
    pub user_id: DbId,
}

/// Inbound client frame.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum InboundFrame {
    ChatMessage { content: String },
}

/// GET /api/v1/conversations/{id}/ws -- upgrade to the chat channel.
///
/// Rejects the upgrade with 403 when the user is not a participant of
/// the conversation, so a connection never observes a conversation it
/// does not belong to.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<DbId>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let participants = state.store.participants(conversation_id).await?;
    if !participants.contains(&query.user_id) {
        return Err(AppError::Messaging(MessagingError::NotAParticipant {
            user_id: query.user_id,
            conversation_id,
        }));
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, conversation_id, query.user_id)))
}

/// Manage a single chat connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Subscribes the connection to the conversation's delivery group.
///   2. Spawns a sender task that forwards delivery events to the sink.
///   3. Feeds inbound chat frames into the messaging service.
///   4. Unsubscribes on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, conversation_id: DbId, user_id: DbId) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, conversation_id, user_id, "Chat WebSocket connected");

    let mut rx = state.bus.subscribe(conversation_id, conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward delivery events to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(conn_id = %sender_conn_id, error = %e, "Failed to serialize delivery event");
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound frames.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<InboundFrame>(&text) {
                Ok(InboundFrame::ChatMessage { content }) => {
                    let content = content.trim();
                    if content.is_empty() {
                        continue;
                    }
                    // Send errors don't tear down the connection: the
                    // client learns its message was dropped by never
                    // receiving the echo frame.
                    if let Err(e) = state.messaging.send(conversation_id, user_id, content).await {
                        tracing::warn!(conn_id = %conn_id, error = %e, "Inbound chat message rejected");
                    }
                }
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Unparseable inbound frame");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: unsubscribe and abort the sender task.
    state.bus.unsubscribe(conversation_id, &conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Chat WebSocket disconnected");
}
