//! Internal booking workflow hook.
//!
//! The booking service calls this after a booking transitions to
//! CONFIRMED; it is not exposed to end users (deploys sit it behind the
//! internal network). Scheduling is best-effort: the response reports
//! how many tasks were registered, and a stale or unknown booking yields
//! zero rather than an error so the booking transaction never fails on
//! our account.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use educonnect_core::types::DbId;
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for the confirmation hook.
#[derive(Serialize)]
pub struct ConfirmedResponse {
    /// Number of reminder / session-start tasks registered.
    pub scheduled: usize,
}

/// POST /api/v1/internal/bookings/{id}/confirmed
async fn booking_confirmed(
    State(state): State<AppState>,
    Path(booking_id): Path<DbId>,
) -> Json<DataResponse<ConfirmedResponse>> {
    let scheduled = state.planner.on_booking_confirmed(booking_id).await;

    Json(DataResponse {
        data: ConfirmedResponse { scheduled },
    })
}

/// Routes mounted at `/internal/bookings`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/confirmed", post(booking_confirmed))
}
