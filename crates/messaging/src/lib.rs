//! EduConnect booking-gated messaging core.
//!
//! Messages between a student and a mentor are only visible to the
//! recipient while a confirmed booking window is open between them.
//! This crate owns everything that enforces and maintains that rule:
//!
//! - [`VisibilityGate`] — decides visibility at send time and
//!   reconciles history on fetch.
//! - [`TaskScheduler`] — keyed in-process timers with
//!   replace-on-reschedule semantics.
//! - [`ReminderPlanner`] — schedules reminder and session-start tasks
//!   when a booking is confirmed.
//! - [`UnlockSweeper`] — idempotent bulk unlock, both booking-scoped
//!   and as a periodic safety net.
//! - [`ChatBus`] — per-conversation fan-out of delivery events to live
//!   connections, filtered so hidden content never reaches the
//!   non-visible party.
//! - [`MessagingService`] — the send and history-fetch entry points.
//!
//! Persistence and notification delivery sit behind the [`SessionStore`]
//! and [`Notifier`] seams; [`pg`] provides the Postgres implementations.

pub mod bus;
pub mod error;
pub mod gate;
pub mod pg;
pub mod planner;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod sweeper;

pub use bus::{ChatBus, DeliveryEvent};
pub use error::MessagingError;
pub use gate::VisibilityGate;
pub use planner::ReminderPlanner;
pub use scheduler::TaskScheduler;
pub use service::MessagingService;
pub use store::{Notifier, SessionStore, StoreError};
pub use sweeper::UnlockSweeper;
