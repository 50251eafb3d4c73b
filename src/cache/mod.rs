//! Cache Module
//!
//! Provides the byte-budgeted LRU store, the immutable value container and
//! the thread-safe per-group cache built on top of them.

mod lru;
mod shared;
mod stats;
mod view;


// Re-export public types
pub use lru::{EvictionCallback, LruStore, Weigh};
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use view::ByteView;
