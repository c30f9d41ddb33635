//! Background jobs.

use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::booking::queries;

/// Periodically mark confirmed bookings whose stay has ended as
/// completed. Runs once at startup, then on the configured interval.
pub async fn start_completed_marker(db: PgPool, every: Duration) {
    let mut ticker = interval(every);
    loop {
        ticker.tick().await;
        match queries::mark_completed_bookings(&db, Utc::now()).await {
            Ok(0) => {}
            Ok(count) => info!(count, "marked bookings completed"),
            Err(e) => warn!("completed-bookings sweep failed: {}", e),
        }
    }
}
