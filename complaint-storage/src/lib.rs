//! Complaint Storage - Repository Trait, File Store and Cache
//!
//! Defines the repository contract for complaint records and its
//! implementations: the atomic [`FileStore`], the read-through/write-through
//! [`CachedRepository`] decorator over it, and an in-memory [`MockStorage`]
//! for tests.

pub mod cache;
pub mod cached;
pub mod config;
pub mod file_store;

pub use cache::{CacheStats, CacheableEntity, FillTicket, LruCache, SharedLruCache};
pub use cached::{CachedRepository, WarmUpReport};
pub use config::StoreConfig;
pub use file_store::FileStore;

use chrono::Utc;
use complaint_core::{
    AgentId, CallContext, Complaint, ComplaintFilter, ComplaintId, ComplaintResult, Page,
    ProjectId, Severity, StorageError, Transition, TransitionOutcome,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

// ============================================================================
// REPOSITORY TRAIT
// ============================================================================

/// Result of a best-effort bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records read, newest first.
    pub records: Vec<Complaint>,
    /// Records that could not be read and were skipped.
    pub skipped: usize,
}

/// Repository contract for complaint records.
///
/// Every operation is synchronous, takes a [`CallContext`] and checks it
/// before starting any I/O. Bulk queries order results newest first.
pub trait ComplaintRepository: Send + Sync {
    /// Insert or replace a record.
    fn save(&self, ctx: &CallContext, complaint: &Complaint) -> ComplaintResult<()>;

    /// Get a record by id. `Ok(None)` when no record exists.
    fn find_by_id(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<Option<Complaint>>;

    /// Delete a record. Returns whether it existed.
    fn delete(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<bool>;

    /// All records matching `filter`, newest first, cut to `page`.
    fn query(
        &self,
        ctx: &CallContext,
        filter: &ComplaintFilter,
        page: Page,
    ) -> ComplaintResult<Vec<Complaint>>;

    /// The `limit` newest records, plus how many unreadable records were
    /// passed over. Used to warm caches.
    fn load_newest(&self, ctx: &CallContext, limit: usize) -> ComplaintResult<LoadReport> {
        Ok(LoadReport {
            records: self.find_all(ctx, Page::first(limit))?,
            skipped: 0,
        })
    }

    /// Cache counters, for repositories that have a cache.
    fn cache_stats(&self) -> ComplaintResult<Option<CacheStats>> {
        Ok(None)
    }

    // === Provided operations ===

    /// Get a record by id, turning absence into `StorageError::NotFound`.
    fn get(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<Complaint> {
        self.find_by_id(ctx, id)?
            .ok_or_else(|| StorageError::NotFound { id }.into())
    }

    /// Apply a resolution transition and persist it.
    ///
    /// Re-applying the current state writes nothing and returns the stored
    /// record unchanged.
    fn transition(
        &self,
        ctx: &CallContext,
        id: ComplaintId,
        transition: Transition,
    ) -> ComplaintResult<Complaint> {
        let mut complaint = self.get(ctx, id)?;
        match complaint.apply(transition, Utc::now())? {
            TransitionOutcome::Applied => self.save(ctx, &complaint)?,
            TransitionOutcome::Unchanged => {
                tracing::debug!(id = %id, state = %complaint.state(), "transition already applied");
            }
        }
        Ok(complaint)
    }

    /// Resolve a record. Idempotent.
    fn resolve(&self, ctx: &CallContext, id: ComplaintId, by: AgentId) -> ComplaintResult<Complaint> {
        self.transition(ctx, id, Transition::Resolve { by })
    }

    fn find_all(&self, ctx: &CallContext, page: Page) -> ComplaintResult<Vec<Complaint>> {
        self.query(ctx, &ComplaintFilter::all(), page)
    }

    fn find_by_severity(&self, ctx: &CallContext, severity: Severity) -> ComplaintResult<Vec<Complaint>> {
        self.query(ctx, &ComplaintFilter::severity(severity), Page::all())
    }

    fn find_by_project(&self, ctx: &CallContext, project: &ProjectId) -> ComplaintResult<Vec<Complaint>> {
        self.query(ctx, &ComplaintFilter::project(project.clone()), Page::all())
    }

    fn find_by_agent(&self, ctx: &CallContext, agent: &AgentId) -> ComplaintResult<Vec<Complaint>> {
        self.query(ctx, &ComplaintFilter::agent(agent.clone()), Page::all())
    }

    /// Open and Deferred records.
    fn find_unresolved(&self, ctx: &CallContext) -> ComplaintResult<Vec<Complaint>> {
        self.query(ctx, &ComplaintFilter::unresolved(), Page::all())
    }

    /// Case-insensitive substring search over text fields and labels.
    fn search(&self, ctx: &CallContext, query: &str, limit: usize) -> ComplaintResult<Vec<Complaint>> {
        self.query(ctx, &ComplaintFilter::text(query), Page::first(limit))
    }

    /// Number of stored records. O(n).
    fn count(&self, ctx: &CallContext) -> ComplaintResult<usize> {
        Ok(self.find_all(ctx, Page::all())?.len())
    }
}

// ============================================================================
// MOCK STORAGE
// ============================================================================

/// In-memory repository for testing.
///
/// Counts `find_by_id` calls so tests can prove a lookup was served from a
/// cache, and can be told to fail writes to exercise error paths.
#[derive(Debug, Default)]
pub struct MockStorage {
    complaints: Arc<RwLock<HashMap<ComplaintId, Complaint>>>,
    fetch_count: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MockStorage {
    /// Create a new mock storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_id` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Make every subsequent `save` and `delete` fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Get count of stored complaints.
    pub fn len(&self) -> usize {
        self.complaints.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: "memory".into(),
                kind: std::io::ErrorKind::Other,
                reason: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

impl ComplaintRepository for MockStorage {
    fn save(&self, ctx: &CallContext, complaint: &Complaint) -> ComplaintResult<()> {
        ctx.check("save")?;
        complaint.validate()?;
        self.check_writable()?;
        let mut complaints = self.complaints.write().map_err(|_| StorageError::LockPoisoned)?;
        complaints.insert(complaint.id(), complaint.clone());
        Ok(())
    }

    fn find_by_id(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<Option<Complaint>> {
        ctx.check("find_by_id")?;
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let complaints = self.complaints.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(complaints.get(&id).cloned())
    }

    fn delete(&self, ctx: &CallContext, id: ComplaintId) -> ComplaintResult<bool> {
        ctx.check("delete")?;
        self.check_writable()?;
        let mut complaints = self.complaints.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(complaints.remove(&id).is_some())
    }

    fn query(
        &self,
        ctx: &CallContext,
        filter: &ComplaintFilter,
        page: Page,
    ) -> ComplaintResult<Vec<Complaint>> {
        ctx.check("scan")?;
        if page.limit == 0 {
            return Ok(Vec::new());
        }
        let complaints = self.complaints.read().map_err(|_| StorageError::LockPoisoned)?;
        let matching = complaints
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        Ok(page.apply(matching))
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use complaint_test_utils::generators::arb_complaint;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every saved record is found again, and deleting it reports existence once.
        #[test]
        fn prop_save_find_delete(complaints in prop::collection::vec(arb_complaint(), 1..20)) {
            let storage = MockStorage::new();
            let ctx = CallContext::background();
            for c in &complaints {
                storage.save(&ctx, c).unwrap();
            }
            for c in &complaints {
                let found = storage.find_by_id(&ctx, c.id()).unwrap();
                prop_assert_eq!(found.as_ref(), Some(c));
            }
            for c in &complaints {
                prop_assert!(storage.delete(&ctx, c.id()).unwrap());
                prop_assert!(!storage.delete(&ctx, c.id()).unwrap());
            }
            prop_assert!(storage.is_empty());
        }

        /// Paging over the full result set never loses or repeats a record.
        #[test]
        fn prop_paging_partitions_results(
            complaints in prop::collection::vec(arb_complaint(), 0..30),
            size in 1usize..7,
        ) {
            let storage = MockStorage::new();
            let ctx = CallContext::background();
            for c in &complaints {
                storage.save(&ctx, c).unwrap();
            }
            let everything = storage.find_all(&ctx, Page::all()).unwrap();
            let mut paged = Vec::new();
            let mut offset = 0;
            loop {
                let page = storage.find_all(&ctx, Page::new(size, offset)).unwrap();
                if page.is_empty() {
                    break;
                }
                offset += page.len();
                paged.extend(page);
            }
            prop_assert_eq!(paged, everything);
        }
    }
}
