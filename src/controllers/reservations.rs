use axum::{
    extract::State,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath};
use crate::error::Result;
use crate::models::{Reservation, ReservationStatus};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations/{reservation_id}", get(get_reservation))
        .route("/reservations/{reservation_id}/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: ReservationStatus,
}

pub async fn get_reservation(
    State(state): State<Arc<AppState>>,
    ApiPath(reservation_id): ApiPath<i64>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.ledger.get(reservation_id).await?))
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    ApiPath(reservation_id): ApiPath<i64>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<Json<Reservation>> {
    Ok(Json(state.ledger.transition(reservation_id, change.status).await?))
}
