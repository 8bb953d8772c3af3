//! Well-known notification category constants.
//!
//! These must match the values stored in the `notifications.category`
//! column and referenced by the reminder planner and API handlers.

/// Booking lifecycle notices: reminders, session-start, status changes.
pub const CATEGORY_BOOKING: &str = "BOOKING";

/// Messaging notices (e.g. "you have unlocked messages").
pub const CATEGORY_MESSAGE: &str = "MESSAGE";
