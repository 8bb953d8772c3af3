//! End-to-end tests over `MessagingService` + `ChatBus`: send-time
//! visibility, per-subscriber delivery filtering, and history fetches.

mod support;

use std::sync::Arc;

use chrono::Duration;
use educonnect_core::booking::BookingStatus;
use educonnect_messaging::{
    ChatBus, DeliveryEvent, MessagingError, MessagingService, SessionStore,
};
use support::{at, MemoryStore};

const STUDENT: i64 = 1;
const MENTOR: i64 = 2;

fn service(store: &Arc<MemoryStore>, bus: &Arc<ChatBus>) -> MessagingService {
    MessagingService::new(Arc::clone(store) as Arc<dyn SessionStore>, Arc::clone(bus))
}

/// Confirmed booking whose window contains `instant`.
fn open_window_at(store: &MemoryStore, instant: chrono::DateTime<chrono::Utc>) {
    store.add_booking(STUDENT, MENTOR, instant - Duration::minutes(30), BookingStatus::Confirmed);
}

// ---------------------------------------------------------------------------
// Sending
// ---------------------------------------------------------------------------

#[tokio::test]
async fn visible_send_reaches_both_parties() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let now = at(2025, 6, 10, 10, 0, 0);
    open_window_at(&store, now);
    let service = service(&store, &bus);

    let mut student_rx = bus.subscribe(conversation, "s1".into(), STUDENT).await;
    let mut mentor_rx = bus.subscribe(conversation, "m1".into(), MENTOR).await;

    let message = service.send_at(conversation, STUDENT, "hello", now).await.unwrap();
    assert!(message.is_visible_to_recipient);

    for rx in [&mut student_rx, &mut mentor_rx] {
        match rx.try_recv().unwrap() {
            DeliveryEvent::ChatMessage {
                message_id,
                sender_id,
                payload,
                is_visible,
                ..
            } => {
                assert_eq!(message_id, message.id);
                assert_eq!(sender_id, STUDENT);
                assert_eq!(payload, "hello");
                assert!(is_visible);
            }
            other => panic!("expected chat_message, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn hidden_send_never_reaches_the_recipient() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let service = service(&store, &bus);

    let mut student_rx = bus.subscribe(conversation, "s1".into(), STUDENT).await;
    let mut mentor_rx = bus.subscribe(conversation, "m1".into(), MENTOR).await;

    // No booking at all: the message is persisted hidden.
    let now = at(2025, 6, 10, 10, 0, 0);
    let message = service.send_at(conversation, STUDENT, "secret", now).await.unwrap();
    assert!(!message.is_visible_to_recipient);

    // The recipient's channel gets nothing — not even a stub.
    assert!(mentor_rx.try_recv().is_err());

    // The sender sees their own message plus a pending notice.
    match student_rx.try_recv().unwrap() {
        DeliveryEvent::ChatMessage { message_id, is_visible, .. } => {
            assert_eq!(message_id, message.id);
            assert!(!is_visible);
        }
        other => panic!("expected chat_message, got {other:?}"),
    }
    match student_rx.try_recv().unwrap() {
        DeliveryEvent::MessagePending { message_id, .. } => {
            assert_eq!(message_id, message.id);
        }
        other => panic!("expected message_pending, got {other:?}"),
    }
}

#[tokio::test]
async fn send_outside_window_is_hidden_inside_is_visible() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let start = at(2025, 6, 10, 10, 0, 0);
    store.add_booking(STUDENT, MENTOR, start, BookingStatus::Confirmed);
    let service = service(&store, &bus);

    let before = service
        .send_at(conversation, MENTOR, "too early", start - Duration::seconds(1))
        .await
        .unwrap();
    assert!(!before.is_visible_to_recipient);

    let during = service
        .send_at(conversation, MENTOR, "on time", start + Duration::minutes(5))
        .await
        .unwrap();
    assert!(during.is_visible_to_recipient);

    let after = service
        .send_at(conversation, MENTOR, "too late", start + Duration::hours(3))
        .await
        .unwrap();
    assert!(!after.is_visible_to_recipient);
}

#[tokio::test]
async fn send_updates_conversation_activity() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let service = service(&store, &bus);

    let now = at(2025, 6, 10, 10, 0, 0);
    let message = service.send_at(conversation, STUDENT, "ping", now).await.unwrap();

    assert_eq!(store.last_message_at(conversation), Some(message.created_at));
}

#[tokio::test]
async fn send_rejects_non_participants() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let service = service(&store, &bus);

    let outsider = 9;
    let err = service
        .send_at(conversation, outsider, "hi", at(2025, 6, 10, 10, 0, 0))
        .await
        .unwrap_err();
    match err {
        MessagingError::NotAParticipant { user_id, conversation_id } => {
            assert_eq!(user_id, outsider);
            assert_eq!(conversation_id, conversation);
        }
        other => panic!("expected NotAParticipant, got {other:?}"),
    }
}

#[tokio::test]
async fn messages_arrive_in_send_order() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let now = at(2025, 6, 10, 10, 0, 0);
    open_window_at(&store, now);
    let service = service(&store, &bus);

    let mut rx = bus.subscribe(conversation, "m1".into(), MENTOR).await;

    for i in 0..10 {
        service
            .send_at(conversation, STUDENT, &format!("msg {i}"), now)
            .await
            .unwrap();
    }

    for i in 0..10 {
        match rx.try_recv().unwrap() {
            DeliveryEvent::ChatMessage { payload, .. } => {
                assert_eq!(payload, format!("msg {i}"));
            }
            other => panic!("expected chat_message, got {other:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_shows_own_messages_and_hides_counterparty_pending_ones() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let service = service(&store, &bus);

    let own_hidden = store.add_message_at(conversation, STUDENT, "mine", false, at(2025, 6, 10, 9, 0, 0));
    store.add_message_at(conversation, MENTOR, "theirs", false, at(2025, 6, 10, 9, 5, 0));

    let history = service
        .history_at(conversation, STUDENT, at(2025, 6, 10, 9, 30, 0))
        .await
        .unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, own_hidden);
}

#[tokio::test]
async fn history_fetch_reconciles_missed_unlocks() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let service = service(&store, &bus);

    // Message queued before a session that has since started; the
    // scheduled unlock never ran.
    let pending = store.add_message_at(conversation, MENTOR, "waiting", false, at(2025, 6, 10, 9, 0, 0));
    let start = at(2025, 6, 10, 10, 0, 0);
    store.add_booking(STUDENT, MENTOR, start, BookingStatus::Confirmed);

    let history = service
        .history_at(conversation, STUDENT, start + Duration::minutes(10))
        .await
        .unwrap();

    assert!(store.message(pending).is_visible_to_recipient);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, pending);
}

#[tokio::test]
async fn history_records_the_read() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let service = service(&store, &bus);

    let now = at(2025, 6, 10, 10, 0, 0);
    service.history_at(conversation, STUDENT, now).await.unwrap();

    assert_eq!(store.last_read_at(conversation, STUDENT), Some(now));
    assert_eq!(store.last_read_at(conversation, MENTOR), None);
}

#[tokio::test]
async fn history_rejects_non_participants() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let service = service(&store, &bus);

    let err = service
        .history_at(conversation, 9, at(2025, 6, 10, 10, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, MessagingError::NotAParticipant { .. }));
}

#[tokio::test]
async fn unlocked_message_stays_visible_after_the_window_closes() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let service = service(&store, &bus);

    let pending = store.add_message_at(conversation, MENTOR, "kept", false, at(2025, 6, 10, 9, 0, 0));
    let start = at(2025, 6, 10, 10, 0, 0);
    store.add_booking(STUDENT, MENTOR, start, BookingStatus::Confirmed);

    // First fetch inside the window flips it.
    service
        .history_at(conversation, STUDENT, start + Duration::minutes(10))
        .await
        .unwrap();
    assert!(store.message(pending).is_visible_to_recipient);

    // A fetch long after the window closed still sees it.
    let history = service
        .history_at(conversation, STUDENT, start + Duration::days(30))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, pending);
}

// ---------------------------------------------------------------------------
// Bus subscription lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsubscribed_connections_receive_nothing() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let now = at(2025, 6, 10, 10, 0, 0);
    open_window_at(&store, now);
    let service = service(&store, &bus);

    let mut rx = bus.subscribe(conversation, "m1".into(), MENTOR).await;
    bus.unsubscribe(conversation, "m1").await;
    assert_eq!(bus.group_size(conversation).await, 0);

    service.send_at(conversation, STUDENT, "gone", now).await.unwrap();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn each_connection_of_a_user_receives_its_own_copy() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(ChatBus::new());
    let conversation = store.add_conversation(&[STUDENT, MENTOR]);
    let now = at(2025, 6, 10, 10, 0, 0);
    open_window_at(&store, now);
    let service = service(&store, &bus);

    // Same user on two devices.
    let mut first = bus.subscribe(conversation, "m1".into(), MENTOR).await;
    let mut second = bus.subscribe(conversation, "m2".into(), MENTOR).await;

    service.send_at(conversation, STUDENT, "fanned", now).await.unwrap();

    for rx in [&mut first, &mut second] {
        assert!(matches!(
            rx.try_recv().unwrap(),
            DeliveryEvent::ChatMessage { .. }
        ));
    }
}
