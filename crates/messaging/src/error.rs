use educonnect_core::types::DbId;

use crate::store::StoreError;

/// Errors surfaced by the messaging core.
///
/// Deliberately small: stale bookings and missing conversations are
/// no-ops by design, and delivery failures are swallowed at the bus
/// boundary, so neither appears here.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// A store read or write failed. On the send path this is a hard
    /// error: the caller must not assume the message was persisted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The acting user is not a participant of the conversation.
    #[error("User {user_id} is not a participant of conversation {conversation_id}")]
    NotAParticipant { user_id: DbId, conversation_id: DbId },
}
