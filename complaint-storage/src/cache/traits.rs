//! Cache statistics and the cacheable entity marker.

use complaint_core::{Complaint, ComplaintId};
use std::hash::Hash;

/// Marker trait for records that can live in the LRU cache.
///
/// The cache key is the record's identity; two values with the same key are
/// versions of the same record and the newer one replaces the older.
pub trait CacheableEntity: Clone + Send + Sync + 'static {
    type Key: Copy + Eq + Hash + Send + Sync + std::fmt::Debug;

    /// Get the cache key for this record.
    fn cache_key(&self) -> Self::Key;
}

impl CacheableEntity for Complaint {
    type Key = ComplaintId;

    fn cache_key(&self) -> ComplaintId {
        self.id()
    }
}

/// Point-in-time snapshot of cache counters.
///
/// Counters are monotonic between calls to `reset_stats`; the snapshot is a
/// copy and never changes after it is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions due to capacity.
    pub evictions: u64,
    /// Number of entries currently in cache.
    pub size: usize,
    /// Configured capacity.
    pub max_size: usize,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total lookups served.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_with_no_lookups() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.lookups(), 4);
    }
}
