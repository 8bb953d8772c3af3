//! Postgres implementations of the store and notifier seams.

use async_trait::async_trait;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::{Booking, Message};
use educonnect_db::repositories::{BookingRepo, ConversationRepo, MessageRepo, NotificationRepo};
use educonnect_db::DbPool;

use crate::store::{Notifier, SessionStore, StoreError};

/// [`SessionStore`] backed by the sqlx repositories.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn booking(&self, id: DbId) -> Result<Option<Booking>, StoreError> {
        Ok(BookingRepo::get(&self.pool, id).await?)
    }

    async fn confirmed_bookings_between(
        &self,
        user_a: DbId,
        user_b: DbId,
    ) -> Result<Vec<Booking>, StoreError> {
        Ok(BookingRepo::confirmed_between(&self.pool, user_a, user_b).await?)
    }

    async fn last_started_booking_between(
        &self,
        user_a: DbId,
        user_b: DbId,
        now: Timestamp,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(BookingRepo::last_started_between(&self.pool, user_a, user_b, now).await?)
    }

    async fn conversation_between(
        &self,
        user_a: DbId,
        user_b: DbId,
    ) -> Result<Option<DbId>, StoreError> {
        Ok(ConversationRepo::find_between(&self.pool, user_a, user_b).await?)
    }

    async fn participants(&self, conversation_id: DbId) -> Result<Vec<DbId>, StoreError> {
        let rows = ConversationRepo::participants(&self.pool, conversation_id).await?;
        Ok(rows.into_iter().map(|p| p.user_id).collect())
    }

    async fn insert_message(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        content: &str,
        visible_to_recipient: bool,
    ) -> Result<Message, StoreError> {
        Ok(MessageRepo::create(
            &self.pool,
            conversation_id,
            sender_id,
            content,
            visible_to_recipient,
        )
        .await?)
    }

    async fn visible_history(
        &self,
        conversation_id: DbId,
        viewer: DbId,
    ) -> Result<Vec<Message>, StoreError> {
        Ok(MessageRepo::list_visible_for(&self.pool, conversation_id, viewer).await?)
    }

    async fn unlock_all_hidden(&self, conversation_id: DbId) -> Result<u64, StoreError> {
        Ok(MessageRepo::unlock_all_hidden(&self.pool, conversation_id).await?)
    }

    async fn unlock_from_sender_before(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        cutoff: Timestamp,
    ) -> Result<u64, StoreError> {
        Ok(
            MessageRepo::unlock_from_sender_before(&self.pool, conversation_id, sender_id, cutoff)
                .await?,
        )
    }

    async fn unlock_from_sender(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
    ) -> Result<u64, StoreError> {
        Ok(MessageRepo::unlock_from_sender(&self.pool, conversation_id, sender_id).await?)
    }

    async fn hidden_messages(&self) -> Result<Vec<Message>, StoreError> {
        Ok(MessageRepo::list_hidden(&self.pool).await?)
    }

    async fn unlock_message(&self, message_id: DbId) -> Result<bool, StoreError> {
        Ok(MessageRepo::unlock_one(&self.pool, message_id).await?)
    }

    async fn touch_last_message(
        &self,
        conversation_id: DbId,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        Ok(ConversationRepo::touch_last_message(&self.pool, conversation_id, at).await?)
    }

    async fn mark_read(
        &self,
        conversation_id: DbId,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        Ok(ConversationRepo::mark_read(&self.pool, conversation_id, user_id, at).await?)
    }
}

/// [`Notifier`] that persists notification rows.
///
/// Failures are logged and swallowed: a notification that cannot be
/// written must never fail the task that emitted it.
#[derive(Clone)]
pub struct PgNotifier {
    pool: DbPool,
}

impl PgNotifier {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn emit(&self, user_id: DbId, category: &str, title: &str, body: &str, link: Option<&str>) {
        if let Err(e) =
            NotificationRepo::create(&self.pool, user_id, category, title, body, link).await
        {
            tracing::error!(user_id, category, error = %e, "Failed to persist notification");
        }
    }
}
