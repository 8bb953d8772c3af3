//! Per-conversation delivery bus.
//!
//! Fans out newly-sent and newly-unlocked message events to the live
//! connections subscribed to a conversation. Pushes are fire-and-forget:
//! a slow or disconnected subscriber never stalls the sender, and closed
//! channels are silently skipped.
//!
//! Visibility filtering happens here, per subscriber: a hidden message's
//! content is delivered only to the sender's own connections. This is a
//! confidentiality boundary, not a UI concern — the payload must never
//! cross the wire to the non-visible party.

use std::collections::HashMap;

use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::Message;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing events to one subscriber.
pub type EventSender = mpsc::UnboundedSender<DeliveryEvent>;

/// An event delivered to conversation subscribers.
///
/// Serialized as an internally tagged JSON frame, e.g.
/// `{"event":"messages_unlocked","conversation_id":7,"count":3}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeliveryEvent {
    /// A message the receiving subscriber is allowed to see.
    ChatMessage {
        message_id: DbId,
        conversation_id: DbId,
        sender_id: DbId,
        payload: String,
        is_visible: bool,
        created_at: Timestamp,
    },
    /// Sent to the sender's own connections when their message was
    /// persisted hidden: it is queued pending a future session.
    MessagePending {
        message_id: DbId,
        conversation_id: DbId,
    },
    /// Previously hidden messages became visible. Clients re-fetch
    /// history rather than receiving the content here.
    MessagesUnlocked { conversation_id: DbId, count: u64 },
}

impl DeliveryEvent {
    fn chat_message(message: &Message) -> Self {
        Self::ChatMessage {
            message_id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            payload: message.content.clone(),
            is_visible: message.is_visible_to_recipient,
            created_at: message.created_at,
        }
    }
}

/// A live subscription to one conversation.
struct Subscriber {
    /// Connection ID assigned by the transport layer.
    id: String,
    /// Authenticated participant behind the connection.
    user_id: DbId,
    sender: EventSender,
}

/// Publish/subscribe fan-out keyed by conversation ID.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc`
/// and shared across the application.
pub struct ChatBus {
    groups: RwLock<HashMap<DbId, Vec<Subscriber>>>,
}

impl ChatBus {
    /// Create a new, empty bus.
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Register a subscriber for a conversation.
    ///
    /// Returns the receiver half of the event channel so the transport
    /// can forward events to its socket sink.
    pub async fn subscribe(
        &self,
        conversation_id: DbId,
        subscriber_id: String,
        user_id: DbId,
    ) -> mpsc::UnboundedReceiver<DeliveryEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut groups = self.groups.write().await;
        groups.entry(conversation_id).or_default().push(Subscriber {
            id: subscriber_id,
            user_id,
            sender: tx,
        });
        rx
    }

    /// Remove a subscriber from a conversation's group.
    pub async fn unsubscribe(&self, conversation_id: DbId, subscriber_id: &str) {
        let mut groups = self.groups.write().await;
        if let Some(subs) = groups.get_mut(&conversation_id) {
            subs.retain(|s| s.id != subscriber_id);
            if subs.is_empty() {
                groups.remove(&conversation_id);
            }
        }
    }

    /// Fan a persisted message out to the conversation's subscribers.
    ///
    /// Every subscriber allowed to see the message (the sender, or
    /// anyone once the flag is true) receives a `chat_message` frame.
    /// When the message is hidden, the sender's own connections
    /// additionally receive a `message_pending` notice; non-sender
    /// subscribers receive nothing at all.
    pub async fn publish_message(&self, message: &Message) {
        let groups = self.groups.read().await;
        let Some(subs) = groups.get(&message.conversation_id) else {
            return;
        };

        for sub in subs {
            if message.is_visible_to(sub.user_id) {
                let _ = sub.sender.send(DeliveryEvent::chat_message(message));
                if !message.is_visible_to_recipient && sub.user_id == message.sender_id {
                    let _ = sub.sender.send(DeliveryEvent::MessagePending {
                        message_id: message.id,
                        conversation_id: message.conversation_id,
                    });
                }
            }
        }
    }

    /// Notify every subscriber of a conversation that `count` messages
    /// were unlocked. Clients treat this as "re-fetch history".
    pub async fn broadcast_unlock(&self, conversation_id: DbId, count: u64) {
        let groups = self.groups.read().await;
        if let Some(subs) = groups.get(&conversation_id) {
            for sub in subs {
                let _ = sub.sender.send(DeliveryEvent::MessagesUnlocked {
                    conversation_id,
                    count,
                });
            }
        }
    }

    /// Number of live subscribers for a conversation.
    pub async fn group_size(&self, conversation_id: DbId) -> usize {
        self.groups
            .read()
            .await
            .get(&conversation_id)
            .map_or(0, Vec::len)
    }
}

impl Default for ChatBus {
    fn default() -> Self {
        Self::new()
    }
}
