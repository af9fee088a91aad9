use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::Result;
use crate::models::{Activity, ActivityCategory, ActivityFilter, Reservation, Schedule};
use crate::services::ActivityReservationRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/activities", get(list_activities))
        .route("/activities/{activity_id}", get(activity_detail))
        .route("/activity-categories", get(list_categories))
        .route("/schedules/{schedule_id}/reservations", post(reserve_slot))
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub value: ActivityCategory,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ActivityDetail {
    #[serde(flatten)]
    pub activity: Activity,
    pub schedules: Vec<Schedule>,
}

/// `?category=spa&search=massage`, both optional.
pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<ActivityFilter>,
) -> Result<Json<Vec<Activity>>> {
    Ok(Json(state.cache.activities(&filter).await?))
}

pub async fn list_categories() -> Json<Vec<CategoryResponse>> {
    let categories = ActivityCategory::ALL
        .into_iter()
        .map(|value| CategoryResponse { value, label: value.label() })
        .collect();
    Json(categories)
}

pub async fn activity_detail(
    State(state): State<Arc<AppState>>,
    ApiPath(activity_id): ApiPath<i64>,
) -> Result<Json<ActivityDetail>> {
    let activity = state.availability.activity(activity_id).await?;
    let schedules = state.availability.open_slots(activity_id).await?;
    Ok(Json(ActivityDetail { activity, schedules }))
}

pub async fn reserve_slot(
    State(state): State<Arc<AppState>>,
    ApiPath(schedule_id): ApiPath<i64>,
    ApiJson(request): ApiJson<ActivityReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>)> {
    let reservation = state.ledger.create_activity_reservation(schedule_id, request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}
