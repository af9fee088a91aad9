pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod store;

use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::CacheService;
use crate::config::Config;
use crate::services::{AvailabilityEngine, Clock, NotificationDispatcher, Notifier, ReservationLedger};
use crate::store::ReservationStore;

// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ReservationStore>,
    pub cache: CacheService,
    pub availability: AvailabilityEngine,
    pub ledger: ReservationLedger,
}

impl AppState {
    /// Wires the services over an already opened store.
    pub fn new(
        config: Config,
        store: Arc<dyn ReservationStore>,
        cache: CacheService,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let availability = AvailabilityEngine::new(store.clone(), clock, config.booking.clone());
        let ledger = ReservationLedger::new(availability.clone(), NotificationDispatcher::new(notifier));
        Arc::new(Self {
            config,
            store,
            cache,
            availability,
            ledger,
        })
    }
}

/// The full HTTP surface with tracing and CORS layers.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(controllers::health::routes())
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
