//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod booking_repo;
pub mod conversation_repo;
pub mod message_repo;
pub mod notification_repo;

pub use booking_repo::BookingRepo;
pub use conversation_repo::ConversationRepo;
pub use message_repo::MessageRepo;
pub use notification_repo::NotificationRepo;
