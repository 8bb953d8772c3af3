//! Repository for the `conversations` and `conversation_participants` tables.

use educonnect_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::conversation::{Conversation, ConversationParticipant};

/// Provides CRUD operations for conversations.
pub struct ConversationRepo;

impl ConversationRepo {
    /// Create an empty conversation, returning the generated ID.
    pub async fn create(pool: &PgPool) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar("INSERT INTO conversations DEFAULT VALUES RETURNING id")
            .fetch_one(pool)
            .await
    }

    /// Fetch a conversation by ID.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(
            "SELECT id, last_message_at, created_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Add a participant. Idempotent: re-adding an existing participant
    /// is a no-op.
    pub async fn add_participant(
        pool: &PgPool,
        conversation_id: DbId,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id) \
             VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_conversation_participant DO NOTHING",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Participants of a conversation, oldest first.
    pub async fn participants(
        pool: &PgPool,
        conversation_id: DbId,
    ) -> Result<Vec<ConversationParticipant>, sqlx::Error> {
        sqlx::query_as::<_, ConversationParticipant>(
            "SELECT id, conversation_id, user_id, joined_at, last_read_at \
             FROM conversation_participants \
             WHERE conversation_id = $1 \
             ORDER BY joined_at",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    }

    /// Find the conversation both users participate in, if one exists.
    pub async fn find_between(
        pool: &PgPool,
        user_a: DbId,
        user_b: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT pa.conversation_id \
             FROM conversation_participants pa \
             JOIN conversation_participants pb \
               ON pa.conversation_id = pb.conversation_id \
             WHERE pa.user_id = $1 AND pb.user_id = $2 \
             LIMIT 1",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(pool)
        .await
    }

    /// Bump `last_message_at` after a successful send.
    pub async fn touch_last_message(
        pool: &PgPool,
        conversation_id: DbId,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record that `user_id` has read the conversation up to `at`.
    pub async fn mark_read(
        pool: &PgPool,
        conversation_id: DbId,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE conversation_participants \
             SET last_read_at = $3 \
             WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
