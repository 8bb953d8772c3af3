pub mod bookings;
pub mod conversations;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /conversations/{id}/messages       history (GET), send (POST)
/// /conversations/{id}/ws             per-conversation chat WebSocket
///
/// /internal/bookings/{id}/confirmed  booking workflow hook (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Conversation history, send, and the chat WebSocket.
        .nest("/conversations", conversations::router())
        // Internal hook called by the booking workflow on confirmation.
        .nest("/internal/bookings", bookings::router())
}
