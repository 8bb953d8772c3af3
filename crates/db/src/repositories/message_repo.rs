//! Repository for the `messages` table.
//!
//! All unlock operations are plain `UPDATE … WHERE NOT
//! is_visible_to_recipient` statements: the flag transition is monotonic,
//! so concurrent sweeps racing on the same rows converge to the same end
//! state and the row counts never double-report.

use educonnect_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::message::Message;

/// Column list for `messages` queries.
const COLUMNS: &str = "id, conversation_id, sender_id, content, is_visible_to_recipient, created_at";

/// Provides CRUD and bulk-unlock operations for messages.
pub struct MessageRepo;

impl MessageRepo {
    /// Persist a message with its visibility computed at send time.
    pub async fn create(
        pool: &PgPool,
        conversation_id: DbId,
        sender_id: DbId,
        content: &str,
        visible_to_recipient: bool,
    ) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (conversation_id, sender_id, content, is_visible_to_recipient) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(sender_id)
            .bind(content)
            .bind(visible_to_recipient)
            .fetch_one(pool)
            .await
    }

    /// Conversation history as `viewer` may see it: their own messages
    /// plus everything already visible, in send order.
    pub async fn list_visible_for(
        pool: &PgPool,
        conversation_id: DbId,
        viewer: DbId,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE conversation_id = $1 \
               AND (sender_id = $2 OR is_visible_to_recipient) \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(viewer)
            .fetch_all(pool)
            .await
    }

    /// Flip every hidden message in a conversation visible, both
    /// directions. Returns the number of rows flipped.
    pub async fn unlock_all_hidden(
        pool: &PgPool,
        conversation_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_visible_to_recipient = TRUE \
             WHERE conversation_id = $1 AND NOT is_visible_to_recipient",
        )
        .bind(conversation_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Flip hidden messages from one sender created at or before `cutoff`.
    pub async fn unlock_from_sender_before(
        pool: &PgPool,
        conversation_id: DbId,
        sender_id: DbId,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_visible_to_recipient = TRUE \
             WHERE conversation_id = $1 AND sender_id = $2 \
               AND NOT is_visible_to_recipient AND created_at <= $3",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Flip all hidden messages from one sender, regardless of age.
    pub async fn unlock_from_sender(
        pool: &PgPool,
        conversation_id: DbId,
        sender_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_visible_to_recipient = TRUE \
             WHERE conversation_id = $1 AND sender_id = $2 \
               AND NOT is_visible_to_recipient",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Every hidden message across all conversations, for the periodic
    /// safety sweep.
    pub async fn list_hidden(pool: &PgPool) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE NOT is_visible_to_recipient \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Message>(&query).fetch_all(pool).await
    }

    /// Flip a single message visible. Returns `true` if it was hidden.
    pub async fn unlock_one(pool: &PgPool, message_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_visible_to_recipient = TRUE \
             WHERE id = $1 AND NOT is_visible_to_recipient",
        )
        .bind(message_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
