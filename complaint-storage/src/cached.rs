//! Read-through / write-through repository over an LRU cache.
//!
//! # Contract
//!
//! - `find_by_id` is served from the cache on a hit. On a miss it reads the
//!   backing store and caches the record if one was found, unless a write or
//!   delete went through the cache while the store was being read. Absence
//!   is never cached.
//! - `save` writes the backing store first. The cache is updated only after
//!   the durable write succeeds; a failed write leaves the cache untouched.
//! - `delete` evicts the id only after the backing store delete succeeds.
//! - Bulk queries go straight to the backing store and do not populate the
//!   cache.

use crate::cache::{CacheStats, SharedLruCache};
use crate::{ComplaintRepository, FileStore, LoadReport, StoreConfig};
use complaint_core::{
    CallContext, Complaint, ComplaintFilter, ComplaintId, ComplaintResult, LabelPolicy,
    NewComplaint, Page,
};

/// Outcome of loading stored records into the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmUpReport {
    /// Records inserted into the cache.
    pub loaded: usize,
    /// Records that could not be read or cached.
    pub skipped: usize,
}

/// Cache-backed decorator around any [`ComplaintRepository`].
#[derive(Debug)]
pub struct CachedRepository<S: ComplaintRepository> {
    store: S,
    cache: SharedLruCache<Complaint>,
    label_policy: LabelPolicy,
}

impl CachedRepository<FileStore> {
    /// Build a file-backed repository from a validated config, warming the
    /// cache when `warm_up_on_start` is set.
    pub fn open(config: &StoreConfig) -> ComplaintResult<Self> {
        config.validate()?;
        let store = FileStore::open(&config.base_dir)?.with_legacy_fallback(config.legacy_fallback);
        let repo = Self::new(store, config.cache_max_size).with_label_policy(config.label_policy);
        if config.warm_up_on_start {
            repo.warm_up(&CallContext::background());
        }
        Ok(repo)
    }
}

impl<S: ComplaintRepository> CachedRepository<S> {
    pub fn new(store: S, cache_max_size: usize) -> Self {
        Self {
            store,
            cache: SharedLruCache::new(cache_max_size),
            label_policy: LabelPolicy::default(),
        }
    }

    /// Set the policy applied to labels of newly filed complaints.
    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    pub fn label_policy(&self) -> &LabelPolicy {
        &self.label_policy
    }

    /// Get a reference to the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the cache.
    pub fn cache(&self) -> &SharedLruCache<Complaint> {
        &self.cache
    }

    /// File a new complaint under the configured label policy and persist it.
    pub fn file_complaint(
        &self,
        ctx: &CallContext,
        new: NewComplaint,
    ) -> ComplaintResult<Complaint> {
        let complaint = new.file()?;
        complaint.check_labels(&self.label_policy)?;
        self.save(ctx, &complaint)?;
        Ok(complaint)
    }

    /// Load the newest stored records into the cache, up to its capacity.
    ///
    /// Never fails: unreadable records are skipped and a failed listing
    /// leaves the cache cold.
    pub fn warm_up(&self, ctx: &CallContext) -> WarmUpReport {
        let capacity = match self.cache.max_size() {
            Ok(capacity) => capacity,
            Err(e) => {
                tracing::error!(error = %e, "cache warm-up aborted");
                return WarmUpReport::default();
            }
        };
        let LoadReport { records, skipped } = match self.store.load_newest(ctx, capacity) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "cache warm-up could not list records");
                return WarmUpReport::default();
            }
        };

        let mut report = WarmUpReport {
            loaded: 0,
            skipped,
        };
        // Oldest first, so the newest record ends up most recently used.
        for complaint in records.into_iter().rev() {
            let id = complaint.id();
            match self.cache.put(complaint) {
                Ok(()) => report.loaded += 1,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping record during warm-up");
                    report.skipped += 1;
                }
            }
        }
        tracing::info!(loaded = report.loaded, skipped = report.skipped, "cache warm-up complete");
        report
    }

    /// Drop every cached entry. Counters are kept.
    pub fn clear_cache(&self) -> ComplaintResult<()> {
        self.cache.clear().map_err(Into::into)
    }

    /// Zero cache counters. Entries are kept.
    pub fn reset_stats(&self) -> ComplaintResult<()> {
        self.cache.reset_stats().map_err(Into::into)
    }

    /// Snapshot of cache counters at call time.
    pub fn stats(&self) -> ComplaintResult<CacheStats> {
        self.cache.stats().map_err(Into::into)
    }
}

impl<S: ComplaintRepository> ComplaintRepository for CachedRepository<S> {
    fn save(&self, ctx: &CallContext, complaint: &Complaint) -> ComplaintResult<()> {
        ctx.check("save")?;
        self.store.save(ctx, complaint)?;
        self.cache.put(complaint.clone())?;
        tracing::trace!(id = %complaint.id(), "write-through complete");
        Ok(())
    }

    fn find_by_id(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<Option<Complaint>> {
        ctx.check("find_by_id")?;
        let ticket = match self.cache.get_or_ticket(&id)? {
            Ok(complaint) => return Ok(Some(complaint)),
            Err(ticket) => ticket,
        };
        let found = self.store.find_by_id(ctx, id)?;
        if let Some(complaint) = &found {
            self.cache.fill(complaint.clone(), ticket)?;
        }
        Ok(found)
    }

    fn delete(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<bool> {
        ctx.check("delete")?;
        let existed = self.store.delete(ctx, id)?;
        self.cache.delete(&id)?;
        Ok(existed)
    }

    fn query(
        &self,
        ctx: &CallContext,
        filter: &ComplaintFilter,
        page: Page,
    ) -> ComplaintResult<Vec<Complaint>> {
        self.store.query(ctx, filter, page)
    }

    fn load_newest(&self, ctx: &CallContext, limit: usize) -> ComplaintResult<LoadReport> {
        self.store.load_newest(ctx, limit)
    }

    fn cache_stats(&self) -> ComplaintResult<Option<CacheStats>> {
        Ok(Some(self.cache.stats()?))
    }
}

// ============================================================================
// TESTS
// ============================================================================
