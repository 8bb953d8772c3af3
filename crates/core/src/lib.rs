//! EduConnect domain primitives.
//!
//! This crate has zero internal dependencies so it can be used by the
//! repository layer, the messaging core, and any future worker or CLI
//! tooling. It holds the booking state machine, session window math,
//! the reminder schedule table, and the pure visibility predicates that
//! the gate and the sweeper share.

pub mod booking;
pub mod categories;
pub mod error;
pub mod reminders;
pub mod types;
pub mod visibility;

pub use error::CoreError;
