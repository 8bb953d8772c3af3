//! Booking-confirmed reminder and unlock planning.
//!
//! Consumes the "booking confirmed" event from the booking workflow and
//! registers the timed work around the session: one reminder per offset
//! still in the future, plus the session-start task that unlocks pending
//! messages and announces the session.
//!
//! Scheduled task bodies re-fetch the booking and no-op unless it is
//! still CONFIRMED — timers are never cancelled when a booking is
//! cancelled or rejected; the status re-check at fire time is the
//! cancellation mechanism.

use std::sync::Arc;

use chrono::Utc;
use educonnect_core::categories::CATEGORY_BOOKING;
use educonnect_core::reminders::{self, TaskKind};
use educonnect_core::types::DbId;
use educonnect_db::models::Booking;

use crate::bus::ChatBus;
use crate::error::MessagingError;
use crate::scheduler::TaskScheduler;
use crate::store::{Notifier, SessionStore};
use crate::sweeper::UnlockSweeper;

/// Schedules and executes the deferred work around a confirmed booking.
#[derive(Clone)]
pub struct ReminderPlanner {
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    bus: Arc<ChatBus>,
    scheduler: Arc<TaskScheduler>,
    sweeper: UnlockSweeper,
}

impl ReminderPlanner {
    pub fn new(
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
        bus: Arc<ChatBus>,
        scheduler: Arc<TaskScheduler>,
    ) -> Self {
        let sweeper = UnlockSweeper::new(Arc::clone(&store));
        Self {
            store,
            notifier,
            bus,
            scheduler,
            sweeper,
        }
    }

    /// React to a booking entering CONFIRMED.
    ///
    /// Registers one REMINDER task per offset still in the future and,
    /// if the session has not started yet, one SESSION_START task. A
    /// session that already started gets its unlock run immediately
    /// instead. Task keys are stable, so calling this twice for the same
    /// booking replaces timers rather than duplicating them.
    ///
    /// Scheduling is best-effort relative to the confirmation itself:
    /// failures are logged and swallowed so the booking transaction
    /// never rolls back on their account. Returns the number of tasks
    /// registered.
    pub async fn on_booking_confirmed(&self, booking_id: DbId) -> usize {
        let booking = match self.store.booking(booking_id).await {
            Ok(Some(b)) => b,
            Ok(None) => {
                tracing::warn!(booking_id, "Confirmed-booking event for unknown booking");
                return 0;
            }
            Err(e) => {
                tracing::warn!(booking_id, error = %e, "Could not load booking, skipping scheduling");
                return 0;
            }
        };

        if !booking.is_confirmed() {
            tracing::info!(booking_id, status = %booking.status, "Booking not confirmed, skipping scheduling");
            return 0;
        }

        let start = booking.start_instant();
        let now = Utc::now();
        let mut scheduled = 0;

        for fire in reminders::upcoming_reminders(start, now) {
            let key = reminders::task_key(
                booking_id,
                TaskKind::Reminder {
                    minutes_before: fire.minutes_before,
                },
            );
            let planner = self.clone();
            let label = fire.label;
            self.scheduler.schedule(key, fire.fire_at, async move {
                planner.fire_reminder(booking_id, label).await
            });
            scheduled += 1;
        }

        if start > now {
            let key = reminders::task_key(booking_id, TaskKind::SessionStart);
            let planner = self.clone();
            self.scheduler.schedule(key, start, async move {
                planner.fire_session_start(booking_id).await
            });
            scheduled += 1;
        } else {
            // Session already underway (or past): unlock right away
            // rather than scheduling a timer in the past.
            if let Err(e) = self.unlock_and_announce(&booking).await {
                tracing::warn!(booking_id, error = %e, "Immediate unlock on confirmation failed");
            }
        }

        tracing::info!(booking_id, scheduled, "Scheduled booking tasks");
        scheduled
    }

    /// REMINDER task body: notify both parties that the session starts
    /// in `label`. No-op unless the booking is still CONFIRMED.
    pub async fn fire_reminder(&self, booking_id: DbId, label: &str) -> Result<(), MessagingError> {
        let Some(booking) = self.store.booking(booking_id).await? else {
            tracing::warn!(booking_id, "Reminder fired for unknown booking");
            return Ok(());
        };
        if !booking.is_confirmed() {
            tracing::info!(booking_id, status = %booking.status, "Booking no longer confirmed, skipping reminder");
            return Ok(());
        }

        let title = format!("Reminder: session in {label}");
        let body = format!("Your mentoring session starts in {label}.");
        self.notify_parties(&booking, &title, &body).await;

        tracing::info!(booking_id, label, "Reminder sent");
        Ok(())
    }

    /// SESSION_START task body: unlock pending messages, notify both
    /// parties, and broadcast the unlock to the conversation group.
    /// No-op unless the booking is still CONFIRMED.
    pub async fn fire_session_start(&self, booking_id: DbId) -> Result<(), MessagingError> {
        let Some(booking) = self.store.booking(booking_id).await? else {
            tracing::warn!(booking_id, "Session start fired for unknown booking");
            return Ok(());
        };
        if !booking.is_confirmed() {
            tracing::info!(booking_id, status = %booking.status, "Booking no longer confirmed, skipping session start");
            return Ok(());
        }

        self.unlock_and_announce(&booking).await?;

        let title = "Your session is starting".to_string();
        let body = "Your mentoring session starts now. Join the chat.".to_string();
        self.notify_parties(&booking, &title, &body).await;

        tracing::info!(booking_id, "Session start processed");
        Ok(())
    }

    /// Run the booking-scoped unlock and broadcast the result to the
    /// conversation's delivery group.
    async fn unlock_and_announce(&self, booking: &Booking) -> Result<(), MessagingError> {
        let count = self.sweeper.unlock_for_booking(booking.id).await?;

        if let Some(conversation_id) = self
            .store
            .conversation_between(booking.student_id, booking.mentor_id)
            .await?
        {
            self.bus.broadcast_unlock(conversation_id, count).await;
        }
        Ok(())
    }

    /// Emit a booking notification to both parties, each deep-linked to
    /// the chat with the other.
    async fn notify_parties(&self, booking: &Booking, title: &str, body: &str) {
        let student_link = format!("/chat?partner={}", booking.mentor_id);
        self.notifier
            .emit(booking.student_id, CATEGORY_BOOKING, title, body, Some(&student_link))
            .await;

        let mentor_link = format!("/chat?partner={}", booking.student_id);
        self.notifier
            .emit(booking.mentor_id, CATEGORY_BOOKING, title, body, Some(&mentor_link))
            .await;
    }
}
