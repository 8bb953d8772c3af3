//! Message entity model.

use educonnect_core::types::{DbId, Timestamp};
use educonnect_core::visibility;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `messages` table.
///
/// `is_visible_to_recipient` gates only the non-sender's view and is
/// monotonic: it flips false → true exactly once and is never reset.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub conversation_id: DbId,
    pub sender_id: DbId,
    pub content: String,
    pub is_visible_to_recipient: bool,
    pub created_at: Timestamp,
}

impl Message {
    /// Whether `viewer` may see this message's content.
    pub fn is_visible_to(&self, viewer: DbId) -> bool {
        visibility::is_visible_to(self.sender_id, self.is_visible_to_recipient, viewer)
    }
}
