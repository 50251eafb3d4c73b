//! Response DTOs for the front-end API
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::group::GroupStatsSnapshot;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Name of the served group
    pub group: String,
    /// Read path counters
    pub group_stats: GroupStatsSnapshot,
    /// Local cache counters
    pub cache_stats: CacheStats,
    /// Cache hit rate over all gets (cache_hits / gets)
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(
        group: impl Into<String>,
        group_stats: GroupStatsSnapshot,
        cache_stats: CacheStats,
    ) -> Self {
        let hit_rate = if group_stats.gets > 0 {
            group_stats.cache_hits as f64 / group_stats.gets as f64
        } else {
            0.0
        };
        Self {
            group: group.into(),
            group_stats,
            cache_stats,
            hit_rate,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
