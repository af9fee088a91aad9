use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::Result;
use crate::models::{AvailableRoom, Reservation, RoomType};
use crate::services::{RoomReservationRequest, RoomSearch};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/room-types", get(list_room_types))
        .route("/rooms/available", get(available_rooms))
        .route("/rooms/{room_id}/reservations", post(reserve_room))
}

pub async fn list_room_types(State(state): State<Arc<AppState>>) -> Result<Json<Vec<RoomType>>> {
    Ok(Json(state.cache.room_types().await?))
}

/// `?check_in=YYYY-MM-DD&check_out=YYYY-MM-DD&guests=N`
pub async fn available_rooms(
    State(state): State<Arc<AppState>>,
    ApiQuery(search): ApiQuery<RoomSearch>,
) -> Result<Json<Vec<AvailableRoom>>> {
    Ok(Json(state.availability.search_rooms(&search).await?))
}

pub async fn reserve_room(
    State(state): State<Arc<AppState>>,
    ApiPath(room_id): ApiPath<i64>,
    ApiJson(request): ApiJson<RoomReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>)> {
    let reservation = state.ledger.create_room_reservation(room_id, request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}
