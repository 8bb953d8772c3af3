//! Persistence and notification seams.
//!
//! The messaging core never talks to sqlx directly; it goes through
//! [`SessionStore`] so the visibility logic can be exercised against an
//! in-memory store in tests. [`pg`](crate::pg) provides the Postgres
//! implementations used in production.

use async_trait::async_trait;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::{Booking, Message};

/// Failure of a store read or write.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Everything the messaging core needs from the persistent store.
///
/// All unlock methods must be monotonic (hidden → visible only) and
/// report the number of rows actually flipped, so that concurrent
/// sweeps commute and repeated runs yield zero.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a booking by ID.
    async fn booking(&self, id: DbId) -> Result<Option<Booking>, StoreError>;

    /// All CONFIRMED bookings between two users, either role direction.
    async fn confirmed_bookings_between(
        &self,
        user_a: DbId,
        user_b: DbId,
    ) -> Result<Vec<Booking>, StoreError>;

    /// The most recent CONFIRMED booking between two users whose start
    /// instant is at or before `now`.
    async fn last_started_booking_between(
        &self,
        user_a: DbId,
        user_b: DbId,
        now: Timestamp,
    ) -> Result<Option<Booking>, StoreError>;

    /// The conversation both users participate in, if any.
    async fn conversation_between(
        &self,
        user_a: DbId,
        user_b: DbId,
    ) -> Result<Option<DbId>, StoreError>;

    /// User IDs of a conversation's participants.
    async fn participants(&self, conversation_id: DbId) -> Result<Vec<DbId>, StoreError>;

    /// Persist a message with its visibility computed at send time.
    async fn insert_message(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        content: &str,
        visible_to_recipient: bool,
    ) -> Result<Message, StoreError>;

    /// Conversation history as `viewer` may see it, in send order.
    async fn visible_history(
        &self,
        conversation_id: DbId,
        viewer: DbId,
    ) -> Result<Vec<Message>, StoreError>;

    /// Flip every hidden message in a conversation visible (both
    /// directions). Returns the number flipped.
    async fn unlock_all_hidden(&self, conversation_id: DbId) -> Result<u64, StoreError>;

    /// Flip hidden messages from `sender_id` created at or before `cutoff`.
    async fn unlock_from_sender_before(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        cutoff: Timestamp,
    ) -> Result<u64, StoreError>;

    /// Flip all hidden messages from `sender_id`, regardless of age.
    async fn unlock_from_sender(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
    ) -> Result<u64, StoreError>;

    /// Every hidden message across all conversations (safety sweep input).
    async fn hidden_messages(&self) -> Result<Vec<Message>, StoreError>;

    /// Flip a single message visible. Returns `true` if it was hidden.
    async fn unlock_message(&self, message_id: DbId) -> Result<bool, StoreError>;

    /// Bump the conversation's `last_message_at`.
    async fn touch_last_message(
        &self,
        conversation_id: DbId,
        at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Record that `user_id` has read the conversation up to `at`.
    async fn mark_read(
        &self,
        conversation_id: DbId,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<(), StoreError>;
}

/// Outbound notification sink.
///
/// Fire-and-forget: implementations log their own failures and never
/// propagate them into the core (a reminder that fails to deliver must
/// not fail the task that emitted it).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn emit(&self, user_id: DbId, category: &str, title: &str, body: &str, link: Option<&str>);
}
