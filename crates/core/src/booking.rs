//! Booking lifecycle state machine and session window math.
//!
//! A booking is a scheduled mentoring session between two users. Its
//! calendar `date` and start `time` are stored separately; everything
//! downstream works with the combined UTC `start_instant` and the
//! derived session window.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Default length of a mentoring session.
///
/// The booking record carries no explicit duration; the window used for
/// message visibility closes this long after the scheduled start. Kept
/// as a constant rather than a domain invariant so deployments can tune
/// it in one place.
pub const DEFAULT_SESSION_DURATION_MINS: i64 = 120;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a booking, stored as TEXT in `bookings.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// The database/wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Rejected => "REJECTED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse the database representation. Unknown values yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "REJECTED" => Some(Self::Rejected),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Returns the set of valid target statuses reachable from `from`.
///
/// Terminal states (Rejected, Completed, Cancelled) return an empty
/// slice because no further transitions are allowed. Deferred tasks do
/// not consult this table — they re-check for `Confirmed` at fire time
/// and no-op otherwise.
pub fn valid_transitions(from: BookingStatus) -> &'static [BookingStatus] {
    use BookingStatus::*;
    match from {
        Pending => &[Confirmed, Rejected, Cancelled],
        Confirmed => &[Completed, Cancelled],
        Rejected | Completed | Cancelled => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a state transition, returning an error message for invalid ones.
pub fn validate_transition(from: BookingStatus, to: BookingStatus) -> Result<(), String> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(format!("Invalid booking transition: {from} -> {to}"))
    }
}

// ---------------------------------------------------------------------------
// Session window
// ---------------------------------------------------------------------------

/// Combine a booking's calendar date and start time into a UTC instant.
pub fn start_instant(date: NaiveDate, time: NaiveTime) -> Timestamp {
    date.and_time(time).and_utc()
}

/// The interval during which messages between the two parties are
/// mutually visible: `[start, start + duration]`, end inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl SessionWindow {
    /// Window opening at `start` with the default session duration.
    pub fn from_start(start: Timestamp) -> Self {
        Self {
            start,
            end: start + Duration::minutes(DEFAULT_SESSION_DURATION_MINS),
        }
    }

    /// Whether `instant` falls inside the window (both ends inclusive).
    pub fn contains(&self, instant: Timestamp) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Whether the window has opened by `instant`, regardless of whether
    /// it has since closed. The safety sweep uses this generous check.
    pub fn has_started(&self, instant: Timestamp) -> bool {
        self.start <= instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2025, 6, 10, h, m, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    #[test]
    fn pending_to_confirmed() {
        assert!(can_transition(BookingStatus::Pending, BookingStatus::Confirmed));
    }

    #[test]
    fn confirmed_to_cancelled() {
        assert!(can_transition(BookingStatus::Confirmed, BookingStatus::Cancelled));
    }

    #[test]
    fn confirmed_to_completed() {
        assert!(can_transition(BookingStatus::Confirmed, BookingStatus::Completed));
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(valid_transitions(BookingStatus::Cancelled).is_empty());
    }

    #[test]
    fn rejected_cannot_be_confirmed() {
        assert!(!can_transition(BookingStatus::Rejected, BookingStatus::Confirmed));
    }

    #[test]
    fn validate_transition_reports_names() {
        let err = validate_transition(BookingStatus::Completed, BookingStatus::Pending)
            .unwrap_err();
        assert!(err.contains("COMPLETED"));
        assert!(err.contains("PENDING"));
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Rejected,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("NO_SUCH"), None);
    }

    // -----------------------------------------------------------------------
    // Session window
    // -----------------------------------------------------------------------

    #[test]
    fn window_spans_default_duration() {
        let w = SessionWindow::from_start(ts(14, 0));
        assert_eq!(w.end, ts(16, 0));
    }

    #[test]
    fn window_excludes_one_second_before_start() {
        let w = SessionWindow::from_start(ts(14, 0));
        assert!(!w.contains(ts(14, 0) - Duration::seconds(1)));
    }

    #[test]
    fn window_includes_exact_start_and_end() {
        let w = SessionWindow::from_start(ts(14, 0));
        assert!(w.contains(ts(14, 0)));
        assert!(w.contains(ts(16, 0)));
    }

    #[test]
    fn window_excludes_one_second_after_end() {
        let w = SessionWindow::from_start(ts(14, 0));
        assert!(!w.contains(ts(16, 0) + Duration::seconds(1)));
    }

    #[test]
    fn has_started_ignores_window_close() {
        let w = SessionWindow::from_start(ts(9, 0));
        assert!(w.has_started(ts(23, 0)));
        assert!(!w.has_started(ts(8, 59)));
    }

    #[test]
    fn start_instant_combines_date_and_time_as_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let time = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        assert_eq!(start_instant(date, time), ts(14, 0));
    }
}
