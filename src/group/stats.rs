//! Group Statistics
//!
//! Lock-free counters describing how a group served its reads.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Group Stats ==
#[derive(Debug, Default)]
pub struct GroupStats {
    gets: AtomicU64,
    cache_hits: AtomicU64,
    loads: AtomicU64,
    loads_deduped: AtomicU64,
    peer_loads: AtomicU64,
    peer_errors: AtomicU64,
    local_loads: AtomicU64,
    local_load_errs: AtomicU64,
    server_requests: AtomicU64,
}

/// Point-in-time copy of [`GroupStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupStatsSnapshot {
    /// Any get request, including cache hits
    pub gets: u64,
    /// Served from the group's cache
    pub cache_hits: u64,
    /// Misses that entered the in-flight gate
    pub loads: u64,
    /// Misses that actually resolved (after duplicate suppression)
    pub loads_deduped: u64,
    /// Values fetched from a remote peer
    pub peer_loads: u64,
    /// Remote fetches that failed and fell back to the loader
    pub peer_errors: u64,
    /// Successful loader calls
    pub local_loads: u64,
    /// Failed loader calls
    pub local_load_errs: u64,
    /// Requests received from other peers
    pub server_requests: u64,
}

impl GroupStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_load_deduped(&self) {
        self.loads_deduped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_peer_load(&self) {
        self.peer_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_peer_error(&self) {
        self.peer_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_local_load(&self) {
        self.local_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_local_load_err(&self) {
        self.local_load_errs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_server_request(&self) {
        self.server_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GroupStatsSnapshot {
        GroupStatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            loads_deduped: self.loads_deduped.load(Ordering::Relaxed),
            peer_loads: self.peer_loads.load(Ordering::Relaxed),
            peer_errors: self.peer_errors.load(Ordering::Relaxed),
            local_loads: self.local_loads.load(Ordering::Relaxed),
            local_load_errs: self.local_load_errs.load(Ordering::Relaxed),
            server_requests: self.server_requests.load(Ordering::Relaxed),
        }
    }
}
