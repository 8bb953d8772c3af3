//! The visibility invariant engine.
//!
//! Decides, for any message between two parties, whether it is visible
//! to the non-sending party right now, based on confirmed booking
//! windows. Also performs the fetch-time reconciliation sweep that
//! self-heals a missed scheduled unlock.

use std::sync::Arc;

use educonnect_core::booking::SessionWindow;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_core::visibility;
use educonnect_db::models::Message;

use crate::error::MessagingError;
use crate::store::SessionStore;

/// Booking-window visibility decisions over a [`SessionStore`].
#[derive(Clone)]
pub struct VisibilityGate {
    store: Arc<dyn SessionStore>,
}

impl VisibilityGate {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Whether a message sent right `now` between the pair is visible to
    /// the recipient: true iff some CONFIRMED booking window between
    /// them currently contains `now`. Overlapping windows are a logical
    /// OR — any one qualifying window is sufficient.
    pub async fn compute_visibility_at_send(
        &self,
        sender: DbId,
        recipient: DbId,
        now: Timestamp,
    ) -> Result<bool, MessagingError> {
        let bookings = self
            .store
            .confirmed_bookings_between(sender, recipient)
            .await?;
        let windows: Vec<SessionWindow> = bookings.iter().map(|b| b.window()).collect();
        Ok(visibility::any_window_open(&windows, now))
    }

    /// Whether `viewer` may see `message`. The sender always sees their
    /// own message regardless of the flag.
    pub fn is_visible(message: &Message, viewer: DbId) -> bool {
        message.is_visible_to(viewer)
    }

    /// Fetch-time reconciliation for a history read by `viewer`.
    ///
    /// Finds the most recent CONFIRMED booking between `viewer` and
    /// `counterparty` that has started, then:
    ///
    /// 1. unlocks the counterparty's hidden messages created at or
    ///    before that booking's start instant, and
    /// 2. if `now` is still inside the booking's window, unlocks all of
    ///    the counterparty's hidden messages — covering messages sent
    ///    after the start but still hidden because the scheduled unlock
    ///    lost the race or never fired.
    ///
    /// Returns the number of messages flipped visible.
    pub async fn reconcile_history(
        &self,
        conversation_id: DbId,
        viewer: DbId,
        counterparty: DbId,
        now: Timestamp,
    ) -> Result<u64, MessagingError> {
        let Some(booking) = self
            .store
            .last_started_booking_between(viewer, counterparty, now)
            .await?
        else {
            return Ok(0);
        };

        let mut unlocked = self
            .store
            .unlock_from_sender_before(conversation_id, counterparty, booking.start_instant())
            .await?;

        if booking.window().contains(now) {
            unlocked += self
                .store
                .unlock_from_sender(conversation_id, counterparty)
                .await?;
        }

        if unlocked > 0 {
            tracing::info!(
                conversation_id,
                viewer,
                unlocked,
                "History fetch reconciled hidden messages"
            );
        }

        Ok(unlocked)
    }
}
