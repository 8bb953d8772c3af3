//! Bulk unlock reconciliation.
//!
//! [`UnlockSweeper`] flips hidden messages visible once their gating
//! booking window has started. It runs in two modes: scoped to a single
//! booking (the scheduled session-start action) and as a periodic
//! safety net over every hidden message, because scheduled delivery is
//! not guaranteed. Both modes are idempotent — the flag transition is
//! monotonic, so a second pass flips nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use educonnect_core::types::{DbId, Timestamp};
use educonnect_core::visibility;
use tokio_util::sync::CancellationToken;

use crate::error::MessagingError;
use crate::store::SessionStore;

/// How often the periodic safety sweep runs.
const SAFETY_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Idempotent hidden → visible reconciliation over a [`SessionStore`].
#[derive(Clone)]
pub struct UnlockSweeper {
    store: Arc<dyn SessionStore>,
}

impl UnlockSweeper {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Unlock every hidden message in the conversation between a
    /// booking's two parties. By the time this runs the window is open,
    /// so everything becomes visible to both sides.
    ///
    /// Returns the number of messages flipped. Yields 0 (with a log
    /// line, never an error) when the booking is gone, no longer
    /// CONFIRMED, or the parties have no conversation yet.
    pub async fn unlock_for_booking(&self, booking_id: DbId) -> Result<u64, MessagingError> {
        let Some(booking) = self.store.booking(booking_id).await? else {
            tracing::warn!(booking_id, "Unlock requested for unknown booking");
            return Ok(0);
        };

        if !booking.is_confirmed() {
            tracing::info!(booking_id, status = %booking.status, "Booking no longer confirmed, skipping unlock");
            return Ok(0);
        }

        let Some(conversation_id) = self
            .store
            .conversation_between(booking.student_id, booking.mentor_id)
            .await?
        else {
            tracing::info!(
                booking_id,
                student_id = booking.student_id,
                mentor_id = booking.mentor_id,
                "No conversation between booking parties, nothing to unlock"
            );
            return Ok(0);
        };

        let unlocked = self.store.unlock_all_hidden(conversation_id).await?;
        if unlocked > 0 {
            tracing::info!(booking_id, conversation_id, unlocked, "Unlocked pending messages");
        }
        Ok(unlocked)
    }

    /// Correctness backstop for dropped scheduled fires: flip every
    /// hidden message whose conversation's two parties have any
    /// CONFIRMED booking started by `now` — started is enough, the
    /// window need not still be open.
    ///
    /// Returns the total number of messages flipped.
    pub async fn periodic_safety_sweep(&self, now: Timestamp) -> Result<u64, MessagingError> {
        let hidden = self.store.hidden_messages().await?;
        let mut total = 0u64;

        for message in &hidden {
            let participants = self.store.participants(message.conversation_id).await?;
            let Some(&recipient) = participants.iter().find(|&&u| u != message.sender_id) else {
                continue;
            };

            let bookings = self
                .store
                .confirmed_bookings_between(message.sender_id, recipient)
                .await?;
            let windows: Vec<_> = bookings.iter().map(|b| b.window()).collect();

            if visibility::any_window_started(&windows, now)
                && self.store.unlock_message(message.id).await?
            {
                total += 1;
            }
        }

        if total > 0 {
            tracing::info!(unlocked = total, "Safety sweep flipped overdue messages");
        }
        Ok(total)
    }

    /// Run the periodic safety sweep loop.
    ///
    /// Sweeps every five minutes until the provided [`CancellationToken`]
    /// is cancelled. Sweep failures are logged and the loop continues.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(SAFETY_SWEEP_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Safety sweep cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.periodic_safety_sweep(Utc::now()).await {
                        tracing::error!(error = %e, "Safety sweep failed");
                    }
                }
            }
        }
    }
}
