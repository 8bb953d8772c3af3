//! Shared test fixtures: an in-memory [`SessionStore`] and a recording
//! [`Notifier`], so the messaging core can be exercised without a
//! database.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use educonnect_core::booking::BookingStatus;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_db::models::{Booking, Message};
use educonnect_messaging::store::{Notifier, SessionStore, StoreError};

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    next_id: DbId,
    bookings: Vec<Booking>,
    /// conversation id -> participant user ids, in join order.
    conversations: HashMap<DbId, Vec<DbId>>,
    messages: Vec<Message>,
    last_message_at: HashMap<DbId, Timestamp>,
    /// (conversation, user) -> last read instant.
    reads: HashMap<(DbId, DbId), Timestamp>,
}

impl Inner {
    fn alloc(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory [`SessionStore`]. Never fails.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a booking starting at `start` (UTC) with the given status.
    pub fn add_booking(
        &self,
        student_id: DbId,
        mentor_id: DbId,
        start: Timestamp,
        status: BookingStatus,
    ) -> DbId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.alloc();
        inner.bookings.push(Booking {
            id,
            student_id,
            mentor_id,
            date: start.date_naive(),
            time: start.time(),
            status: status.as_str().to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        id
    }

    pub fn set_booking_status(&self, booking_id: DbId, status: BookingStatus) {
        let mut inner = self.inner.lock().unwrap();
        let booking = inner
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .expect("unknown booking in fixture");
        booking.status = status.as_str().to_string();
        booking.updated_at = Utc::now();
    }

    pub fn add_conversation(&self, participants: &[DbId]) -> DbId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.alloc();
        inner.conversations.insert(id, participants.to_vec());
        id
    }

    /// Insert a message with an explicit creation instant.
    pub fn add_message_at(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        content: &str,
        visible_to_recipient: bool,
        created_at: Timestamp,
    ) -> DbId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.alloc();
        inner.messages.push(Message {
            id,
            conversation_id,
            sender_id,
            content: content.to_string(),
            is_visible_to_recipient: visible_to_recipient,
            created_at,
        });
        id
    }

    /// Snapshot a message for assertions.
    pub fn message(&self, message_id: DbId) -> Message {
        let inner = self.inner.lock().unwrap();
        inner
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
            .expect("unknown message in fixture")
    }

    /// Start instant as reconstructed from the booking's date/time columns.
    pub fn booking_start(&self, booking_id: DbId) -> Timestamp {
        let inner = self.inner.lock().unwrap();
        inner
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .expect("unknown booking in fixture")
            .start_instant()
    }

    pub fn last_message_at(&self, conversation_id: DbId) -> Option<Timestamp> {
        self.inner
            .lock()
            .unwrap()
            .last_message_at
            .get(&conversation_id)
            .copied()
    }

    pub fn last_read_at(&self, conversation_id: DbId, user_id: DbId) -> Option<Timestamp> {
        self.inner
            .lock()
            .unwrap()
            .reads
            .get(&(conversation_id, user_id))
            .copied()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn booking(&self, id: DbId) -> Result<Option<Booking>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn confirmed_bookings_between(
        &self,
        user_a: DbId,
        user_b: DbId,
    ) -> Result<Vec<Booking>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.is_confirmed() && is_between(b, user_a, user_b))
            .cloned()
            .collect())
    }

    async fn last_started_booking_between(
        &self,
        user_a: DbId,
        user_b: DbId,
        now: Timestamp,
    ) -> Result<Option<Booking>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| {
                b.is_confirmed() && is_between(b, user_a, user_b) && b.start_instant() <= now
            })
            .max_by_key(|b| b.start_instant())
            .cloned())
    }

    async fn conversation_between(
        &self,
        user_a: DbId,
        user_b: DbId,
    ) -> Result<Option<DbId>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .conversations
            .iter()
            .find(|(_, users)| users.contains(&user_a) && users.contains(&user_b))
            .map(|(&id, _)| id))
    }

    async fn participants(&self, conversation_id: DbId) -> Result<Vec<DbId>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .conversations
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_message(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        content: &str,
        visible_to_recipient: bool,
    ) -> Result<Message, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.alloc();
        let message = Message {
            id,
            conversation_id,
            sender_id,
            content: content.to_string(),
            is_visible_to_recipient: visible_to_recipient,
            created_at: Utc::now(),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn visible_history(
        &self,
        conversation_id: DbId,
        viewer: DbId,
    ) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.is_visible_to(viewer))
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn unlock_all_hidden(&self, conversation_id: DbId) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut count = 0;
        for m in inner
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id && !m.is_visible_to_recipient)
        {
            m.is_visible_to_recipient = true;
            count += 1;
        }
        Ok(count)
    }

    async fn unlock_from_sender_before(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
        cutoff: Timestamp,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut count = 0;
        for m in inner.messages.iter_mut().filter(|m| {
            m.conversation_id == conversation_id
                && m.sender_id == sender_id
                && !m.is_visible_to_recipient
                && m.created_at <= cutoff
        }) {
            m.is_visible_to_recipient = true;
            count += 1;
        }
        Ok(count)
    }

    async fn unlock_from_sender(
        &self,
        conversation_id: DbId,
        sender_id: DbId,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut count = 0;
        for m in inner.messages.iter_mut().filter(|m| {
            m.conversation_id == conversation_id
                && m.sender_id == sender_id
                && !m.is_visible_to_recipient
        }) {
            m.is_visible_to_recipient = true;
            count += 1;
        }
        Ok(count)
    }

    async fn hidden_messages(&self) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| !m.is_visible_to_recipient)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn unlock_message(&self, message_id: DbId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Some(m) = inner.messages.iter_mut().find(|m| m.id == message_id) else {
            return Ok(false);
        };
        if m.is_visible_to_recipient {
            Ok(false)
        } else {
            m.is_visible_to_recipient = true;
            Ok(true)
        }
    }

    async fn touch_last_message(
        &self,
        conversation_id: DbId,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .last_message_at
            .insert(conversation_id, at);
        Ok(())
    }

    async fn mark_read(
        &self,
        conversation_id: DbId,
        user_id: DbId,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .reads
            .insert((conversation_id, user_id), at);
        Ok(())
    }
}

fn is_between(booking: &Booking, user_a: DbId, user_b: DbId) -> bool {
    (booking.student_id == user_a && booking.mentor_id == user_b)
        || (booking.student_id == user_b && booking.mentor_id == user_a)
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone)]
pub struct Emitted {
    pub user_id: DbId,
    pub category: String,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

/// [`Notifier`] that records everything emitted.
#[derive(Default)]
pub struct RecordingNotifier {
    emitted: Mutex<Vec<Emitted>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> Vec<Emitted> {
        self.emitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn emit(&self, user_id: DbId, category: &str, title: &str, body: &str, link: Option<&str>) {
        self.emitted.lock().unwrap().push(Emitted {
            user_id,
            category: category.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            link: link.map(str::to_string),
        });
    }
}

/// UTC instant helper for fixtures.
pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
    use chrono::TimeZone;
    chrono::Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}
