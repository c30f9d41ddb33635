//! In-memory caching using moka
//!
//! Caches property records (pricing config + booking policy) for the
//! read-only quote path. Admission always re-reads the property inside
//! its transaction, so a short TTL only affects preview freshness.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::booking::models::Property;

/// Application cache holding property records
#[derive(Clone)]
pub struct AppCache {
    /// Properties (id -> Property)
    pub properties: Cache<Uuid, Arc<Property>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Properties: 10k entries, 60s TTL, 30s idle. Pricing configs
            // change rarely; the short TTL bounds quote staleness.
            properties: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(60))
                .time_to_idle(Duration::from_secs(30))
                .build(),
        }
    }

    /// Get cache statistics for the health endpoint
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            properties_size: self.properties.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.properties.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate a property after its policy counter changed
    pub async fn invalidate_property(&self, id: Uuid) {
        self.properties.invalidate(&id).await;
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub properties_size: u64,
}
