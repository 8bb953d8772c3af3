//! Reminder schedule table and scheduled-task identity.
//!
//! When a booking is confirmed, the planner registers one timer per
//! reminder offset still in the future plus one session-start timer.
//! Task keys are deterministic functions of (booking id, task kind) so
//! that re-running the planner for the same booking replaces timers
//! instead of duplicating them.

use chrono::Duration;

use crate::types::{DbId, Timestamp};

/// Reminder offsets before the session start, with the human label used
/// in the notification copy.
pub const REMINDER_INTERVALS: &[(i64, &str)] = &[
    (1440, "24 hours"),
    (60, "1 hour"),
    (30, "30 minutes"),
    (15, "15 minutes"),
    (5, "5 minutes"),
];

/// The kind of deferred work scheduled for a confirmed booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// "Session starts in {label}" notification, `minutes_before` the start.
    Reminder { minutes_before: i64 },
    /// Session-start actions: unlock pending messages, notify, broadcast.
    SessionStart,
}

/// Stable scheduler key for a booking task.
///
/// Re-registration under the same key supersedes the previous timer, so
/// calling the planner twice for one booking yields the same key set.
pub fn task_key(booking_id: DbId, kind: TaskKind) -> String {
    match kind {
        TaskKind::Reminder { minutes_before } => {
            format!("booking-{booking_id}-reminder-{minutes_before}m")
        }
        TaskKind::SessionStart => format!("booking-{booking_id}-start"),
    }
}

/// A reminder fire instant that is still in the future relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderFire {
    pub minutes_before: i64,
    pub label: &'static str,
    pub fire_at: Timestamp,
}

/// Compute the reminder instants for a session starting at `start` that
/// have not already passed at `now`. Offsets whose fire instant is in
/// the past are dropped, not fired late.
pub fn upcoming_reminders(start: Timestamp, now: Timestamp) -> Vec<ReminderFire> {
    REMINDER_INTERVALS
        .iter()
        .filter_map(|&(minutes_before, label)| {
            let fire_at = start - Duration::minutes(minutes_before);
            (fire_at > now).then_some(ReminderFire {
                minutes_before,
                label,
                fire_at,
            })
        })
        .collect()
}
