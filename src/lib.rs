//! Roomly booking engine: pricing, conflict detection, and admission for
//! marketplace bookings. Everything else (auth, storage, chat, payments)
//! lives in sibling services; this crate owns the one code path with
//! real business rules.

pub mod booking;
pub mod cache;
pub mod config;
pub mod error;
pub mod jobs;

use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cache::AppCache;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
}

/// Build the service router with tracing and CORS applied.
pub fn app(state: AppState) -> Router {
    booking::router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
