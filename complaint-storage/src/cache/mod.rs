//! In-memory LRU cache layer.
//!
//! [`LruCache`] is the bare single-threaded structure; [`SharedLruCache`]
//! wraps it in a reader/writer lock and is what the repository holds.
//! Counters are exposed as a [`CacheStats`] snapshot.

pub mod lru;
pub mod shared;
pub mod traits;

pub use lru::LruCache;
pub use shared::{FillTicket, SharedLruCache};
pub use traits::{CacheStats, CacheableEntity};
