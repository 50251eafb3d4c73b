//! Peercache - An embeddable distributed in-memory cache
//!
//! Named groups of byte-budgeted LRU caches, filled on a miss by a loader or
//! by the peer that owns the key on a consistent hash ring. Concurrent misses
//! for the same key share a single load.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod flight;
pub mod group;
pub mod models;
pub mod peers;
pub mod ring;

pub use api::{ApiState, AppState};
pub use cache::ByteView;
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{Group, Loader, LoaderFn, Registry};
pub use peers::{HttpPool, PeerFetcher, PeerPicker};
