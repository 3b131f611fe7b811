//! Thread-safe wrapper that owns the lock around an [`LruCache`].
//!
//! Records stay lock-free; only the cache structure is shared. The lock is
//! held for the structural mutation alone and never across I/O.
//!
//! # Read-through fills
//!
//! A miss is filled from the backing store after the lock is released, so a
//! write can land between the store read and the fill. Every write-through
//! `put`, `delete` and `clear` advances a write epoch under the lock. A reader
//! captures a [`FillTicket`] before reading the store, and [`SharedLruCache::fill`]
//! drops the value if the epoch moved or the key was cached in the meantime.

use super::{CacheStats, CacheableEntity, LruCache};
use complaint_core::StorageError;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Write epoch observed before a read-through store lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket(u64);

#[derive(Debug)]
struct Guarded<K, V> {
    lru: LruCache<K, V>,
    write_epoch: u64,
}

impl<K, V> Guarded<K, V> {
    fn bump(&mut self) {
        self.write_epoch = self.write_epoch.wrapping_add(1);
    }
}

/// LRU cache of entities keyed by their cache key, guarded by one `RwLock`.
///
/// `get` takes the write lock because a hit reorders recency.
#[derive(Debug)]
pub struct SharedLruCache<V: CacheableEntity> {
    inner: RwLock<Guarded<V::Key, V>>,
}

impl<V: CacheableEntity> SharedLruCache<V> {
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: RwLock::new(Guarded {
                lru: LruCache::new(max_size),
                write_epoch: 0,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Guarded<V::Key, V>>, StorageError> {
        self.inner.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Guarded<V::Key, V>>, StorageError> {
        self.inner.write().map_err(|_| StorageError::LockPoisoned)
    }

    /// Clone the cached value for `key`, counting a hit or a miss.
    pub fn get(&self, key: &V::Key) -> Result<Option<V>, StorageError> {
        Ok(self.write()?.lru.get(key).cloned())
    }

    /// Like [`get`](Self::get), but a miss also returns the ticket needed to
    /// [`fill`](Self::fill) the key from the backing store.
    pub fn get_or_ticket(&self, key: &V::Key) -> Result<Result<V, FillTicket>, StorageError> {
        let mut guard = self.write()?;
        let ticket = FillTicket(guard.write_epoch);
        Ok(guard.lru.get(key).cloned().ok_or(ticket))
    }

    /// Insert or replace `value` under its own cache key.
    ///
    /// This is the write-through path: it invalidates outstanding tickets.
    pub fn put(&self, value: V) -> Result<(), StorageError> {
        let key = value.cache_key();
        let evicted = {
            let mut guard = self.write()?;
            guard.bump();
            guard.lru.put(key, value)
        };
        if let Some((evicted_key, _)) = evicted {
            tracing::trace!(key = ?evicted_key, "evicted least recently used entry");
        }
        Ok(())
    }

    /// Insert a value read from the backing store under `ticket`.
    ///
    /// Skipped when any write, delete or clear happened since the ticket was
    /// taken, or when the key is already cached. Returns whether it inserted.
    pub fn fill(&self, value: V, ticket: FillTicket) -> Result<bool, StorageError> {
        let key = value.cache_key();
        let evicted = {
            let mut guard = self.write()?;
            if guard.write_epoch != ticket.0 || guard.lru.contains(&key) {
                tracing::trace!(key = ?key, "dropped stale read-through fill");
                return Ok(false);
            }
            guard.lru.put(key, value)
        };
        if let Some((evicted_key, _)) = evicted {
            tracing::trace!(key = ?evicted_key, "evicted least recently used entry");
        }
        Ok(true)
    }

    pub fn delete(&self, key: &V::Key) -> Result<Option<V>, StorageError> {
        let mut guard = self.write()?;
        guard.bump();
        Ok(guard.lru.delete(key))
    }

    pub fn contains(&self, key: &V::Key) -> Result<bool, StorageError> {
        Ok(self.read()?.lru.contains(key))
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.write()?;
        guard.bump();
        guard.lru.clear();
        Ok(())
    }

    pub fn reset_stats(&self) -> Result<(), StorageError> {
        self.write()?.lru.reset_stats();
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.lru.len())
    }

    pub fn max_size(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.lru.max_size())
    }

    /// Snapshot of the counters at call time.
    pub fn stats(&self) -> Result<CacheStats, StorageError> {
        Ok(self.read()?.lru.stats())
    }
}
