use std::sync::Arc;

use educonnect_messaging::{ChatBus, MessagingService, ReminderPlanner, SessionStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: educonnect_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Persistence seam, shared with the messaging core. Handlers use it
    /// for membership checks ahead of a WebSocket upgrade.
    pub store: Arc<dyn SessionStore>,
    /// Per-conversation delivery bus (WebSocket fan-out).
    pub bus: Arc<ChatBus>,
    /// Message send / history-fetch service.
    pub messaging: Arc<MessagingService>,
    /// Reminder and unlock scheduling, fed by the booking workflow hook.
    pub planner: ReminderPlanner,
}
