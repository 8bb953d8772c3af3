//! Conversation entity models.

use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `conversations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversation {
    pub id: DbId,
    pub last_message_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A row from the `conversation_participants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConversationParticipant {
    pub id: DbId,
    pub conversation_id: DbId,
    pub user_id: DbId,
    pub joined_at: Timestamp,
    pub last_read_at: Option<Timestamp>,
}
