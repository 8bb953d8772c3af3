//! Booking entity model.

use chrono::{NaiveDate, NaiveTime};
use educonnect_core::booking::{self, BookingStatus, SessionWindow};
use educonnect_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub student_id: DbId,
    pub mentor_id: DbId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// Parsed lifecycle status; `None` for unknown text.
    pub fn status(&self) -> Option<BookingStatus> {
        BookingStatus::parse(&self.status)
    }

    /// Whether the booking is currently CONFIRMED.
    pub fn is_confirmed(&self) -> bool {
        self.status() == Some(BookingStatus::Confirmed)
    }

    /// Scheduled start as a UTC instant.
    pub fn start_instant(&self) -> Timestamp {
        booking::start_instant(self.date, self.time)
    }

    /// The visibility window this booking opens.
    pub fn window(&self) -> SessionWindow {
        SessionWindow::from_start(self.start_instant())
    }

    /// The other party, from `user_id`'s perspective.
    ///
    /// Returns `None` if `user_id` is not a party to this booking.
    pub fn counterparty(&self, user_id: DbId) -> Option<DbId> {
        if user_id == self.student_id {
            Some(self.mentor_id)
        } else if user_id == self.mentor_id {
            Some(self.student_id)
        } else {
            None
        }
    }
}
