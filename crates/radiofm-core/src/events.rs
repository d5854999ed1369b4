//! Notifications published by the favorites store.
//!
//! Subscribers receive these over a `tokio::sync::broadcast` channel. Storage
//! failures are only ever reported here; store operations do not fail because
//! of them.

/// Capacity of the store's broadcast channel. Slow subscribers lag rather
/// than block the store.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// `load()` finished with `count` favorites in memory.
    Loaded { count: usize },
    /// A persisted record at `index` could not be decoded and was dropped.
    RecordSkipped { index: usize, reason: String },
    Added { name: String },
    Removed { name: String },
    /// Favorites written to storage.
    Synchronized { count: usize },
    /// Storage read or write failed; in-memory favorites are unchanged.
    StorageFailed { message: String },
}
