//! Entity models shared by the repository layer and the messaging core.

pub mod booking;
pub mod conversation;
pub mod message;
pub mod notification;

pub use booking::Booking;
pub use conversation::{Conversation, ConversationParticipant};
pub use message::Message;
pub use notification::Notification;
