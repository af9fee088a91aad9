pub mod activities;
pub mod extract;
pub mod health;
pub mod reservations;
pub mod rooms;

use axum::Router;
use std::sync::Arc;

/// Everything mounted under `/api`.
pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(rooms::routes())
        .merge(activities::routes())
        .merge(reservations::routes())
}
