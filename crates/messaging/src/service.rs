//! Message send and history-fetch entry points.
//!
//! [`MessagingService`] ties the gate, store, and bus together: sends
//! compute visibility at call time, persist, bump conversation activity,
//! and fan out; history fetches reconcile first, then filter to what the
//! viewer may see.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::Message;
use tokio::sync::Mutex;

use crate::bus::ChatBus;
use crate::error::MessagingError;
use crate::gate::VisibilityGate;
use crate::store::SessionStore;

/// Send/fetch service over a [`SessionStore`] and a [`ChatBus`].
pub struct MessagingService {
    store: Arc<dyn SessionStore>,
    bus: Arc<ChatBus>,
    gate: VisibilityGate,
    /// Per-conversation append locks: persistence and broadcast of one
    /// conversation's messages are serialized so subscribers observe
    /// `chat_message` events in send order. No ordering is implied
    /// across conversations.
    append_locks: Mutex<HashMap<DbId, Arc<Mutex<()>>>>,
}

impl MessagingService {
    pub fn new(store: Arc<dyn SessionStore>, bus: Arc<ChatBus>) -> Self {
        let gate = VisibilityGate::new(Arc::clone(&store));
        Self {
            store,
            bus,
            gate,
            append_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The gate this service consults. Exposed so the API layer can
    /// answer visibility questions without a second construction.
    pub fn gate(&self) -> &VisibilityGate {
        &self.gate
    }

    /// Send a message into a conversation.
    ///
    /// Visibility is computed at call time: visible iff a confirmed
    /// booking window between sender and recipient is open right now.
    /// On success the message has been persisted and fanned out; on
    /// error the caller must not assume it was persisted.
    pub async fn send(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        content: &str,
    ) -> Result<Message, MessagingError> {
        self.send_at(conversation_id, sender_id, content, Utc::now())
            .await
    }

    /// [`send`](Self::send) with an explicit "now", the actual
    /// implementation.
    pub async fn send_at(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        content: &str,
        now: Timestamp,
    ) -> Result<Message, MessagingError> {
        let participants = self.store.participants(conversation_id).await?;
        if !participants.contains(&sender_id) {
            return Err(MessagingError::NotAParticipant {
                user_id: sender_id,
                conversation_id,
            });
        }
        let recipient = participants.iter().copied().find(|&u| u != sender_id);

        // Serialize the append + broadcast per conversation.
        let lock = self.append_lock(conversation_id).await;
        let _guard = lock.lock().await;

        let visible = match recipient {
            Some(recipient) => {
                self.gate
                    .compute_visibility_at_send(sender_id, recipient, now)
                    .await?
            }
            // Nobody to hide it from yet; created hidden, unlocked when
            // a booking window opens.
            None => false,
        };

        let message = self
            .store
            .insert_message(conversation_id, sender_id, content, visible)
            .await?;
        self.store
            .touch_last_message(conversation_id, message.created_at)
            .await?;

        // Fire-and-forget fan-out; a recipient that misses the push
        // catches up on its next history fetch.
        self.bus.publish_message(&message).await;

        tracing::debug!(
            conversation_id,
            sender_id,
            message_id = message.id,
            visible,
            "Message sent"
        );
        Ok(message)
    }

    /// Fetch the conversation history as `viewer` may see it.
    ///
    /// Runs the fetch-time reconciliation sweep first (self-healing any
    /// missed scheduled unlock), then returns the viewer's own messages
    /// plus everything visible, in send order, and records the read.
    pub async fn history(
        &self,
        conversation_id: DbId,
        viewer: DbId,
    ) -> Result<Vec<Message>, MessagingError> {
        self.history_at(conversation_id, viewer, Utc::now()).await
    }

    /// [`history`](Self::history) with an explicit "now".
    pub async fn history_at(
        &self,
        conversation_id: DbId,
        viewer: DbId,
        now: Timestamp,
    ) -> Result<Vec<Message>, MessagingError> {
        let participants = self.store.participants(conversation_id).await?;
        if !participants.contains(&viewer) {
            return Err(MessagingError::NotAParticipant {
                user_id: viewer,
                conversation_id,
            });
        }

        if let Some(counterparty) = participants.iter().copied().find(|&u| u != viewer) {
            self.gate
                .reconcile_history(conversation_id, viewer, counterparty, now)
                .await?;
        }

        let messages = self.store.visible_history(conversation_id, viewer).await?;
        self.store.mark_read(conversation_id, viewer, now).await?;
        Ok(messages)
    }

    async fn append_lock(&self, conversation_id: DbId) -> Arc<Mutex<()>> {
        let mut locks = self.append_locks.lock().await;
        Arc::clone(locks.entry(conversation_id).or_default())
    }
}
