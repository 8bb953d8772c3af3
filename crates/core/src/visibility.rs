//! Pure visibility predicates shared by the gate and the sweeper.
//!
//! A message is created with `is_visible_to_recipient` computed at send
//! time; the flag only ever flips false → true. The sender's own view is
//! never gated.

use crate::booking::SessionWindow;
use crate::types::{DbId, Timestamp};

/// Whether a message is visible to `viewer`.
///
/// The sender always sees their own message regardless of the flag; the
/// flag only gates the other participant's view.
pub fn is_visible_to(sender: DbId, visible_to_recipient: bool, viewer: DbId) -> bool {
    viewer == sender || visible_to_recipient
}

/// Whether any of the given session windows contains `now`.
///
/// Overlapping confirmed bookings between the same pair are a logical
/// OR: one qualifying window is sufficient.
pub fn any_window_open(windows: &[SessionWindow], now: Timestamp) -> bool {
    windows.iter().any(|w| w.contains(now))
}

/// Whether any of the given session windows has started by `now`,
/// open or already closed. The safety sweep's generous criterion.
pub fn any_window_started(windows: &[SessionWindow], now: Timestamp) -> bool {
    windows.iter().any(|w| w.has_started(now))
}
