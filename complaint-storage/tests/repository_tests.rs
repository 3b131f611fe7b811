use complaint_core::{
    AgentId, CallContext, ComplaintFilter, Label, LabelCharset, NewComplaint, Page, ProjectId,
    ResolutionState, Severity, Transition,
};
use complaint_storage::{CachedRepository, ComplaintRepository, FileStore, StoreConfig};
use complaint_test_utils::{assertions, fixtures, generators};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn ctx() -> CallContext {
    CallContext::background()
}

fn config(dir: &TempDir, max: usize) -> StoreConfig {
    StoreConfig::new(dir.path().join("complaints"), max)
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let filed = {
        let repo = CachedRepository::open(&config(&dir, 16)).unwrap();
        let new = NewComplaint::new(
            AgentId::parse("release-bot").unwrap(),
            "Publish the nightly build",
            Severity::Critical,
        )
        .with_project(ProjectId::parse("pipeline").unwrap())
        .with_attempted_workarounds("Retried the upload three times");
        let filed = repo.file_complaint(&ctx(), new).unwrap();
        repo.resolve(&ctx(), filed.id(), AgentId::parse("oncall").unwrap())
            .unwrap()
    };

    let reopened = CachedRepository::open(&config(&dir, 16).with_warm_up(true)).unwrap();
    let stored = reopened.get(&ctx(), filed.id()).unwrap();
    assert_eq!(stored, filed);
    assert_eq!(stored.state(), ResolutionState::Resolved);
    assertions::assert_resolution_consistent(&stored);
    // Warm-up already held the record.
    assert_eq!(reopened.stats().unwrap().hits, 1);
}

#[test]
fn cached_and_uncached_views_agree() {
    let dir = TempDir::new().unwrap();
    let repo = CachedRepository::open(&config(&dir, 2)).unwrap();
    let records = fixtures::complaints_over_time(5);
    for complaint in &records {
        repo.save(&ctx(), complaint).unwrap();
    }
    repo.transition(&ctx(), records[1].id(), Transition::Defer).unwrap();
    repo.transition(&ctx(), records[3].id(), Transition::Reject).unwrap();

    let plain = FileStore::open(repo.store().base_dir()).unwrap();
    for complaint in &records {
        assert_eq!(
            repo.get(&ctx(), complaint.id()).unwrap(),
            plain.get(&ctx(), complaint.id()).unwrap()
        );
    }

    let unresolved = repo.find_unresolved(&ctx()).unwrap();
    assert_eq!(unresolved.len(), 4);
    assert!(unresolved.iter().all(|c| c.id() != records[3].id()));
    assertions::assert_newest_first(&unresolved);
    assert!(repo.stats().unwrap().size <= 2);
}

#[test]
fn concurrent_callers_on_shared_repository() {
    let dir = TempDir::new().unwrap();
    let repo = Arc::new(CachedRepository::open(&config(&dir, 8)).unwrap());

    let handles: Vec<_> = (0..6)
        .map(|worker| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                let ctx = CallContext::background();
                for _ in 0..10 {
                    let complaint = fixtures::complaint();
                    repo.save(&ctx, &complaint).unwrap();
                    assert_eq!(repo.get(&ctx, complaint.id()).unwrap(), complaint);
                    if worker % 2 == 0 {
                        let by = AgentId::parse(format!("worker-{worker}").as_str()).unwrap();
                        repo.resolve(&ctx, complaint.id(), by).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(repo.count(&ctx()).unwrap(), 60);
    assert_eq!(repo.find_unresolved(&ctx()).unwrap().len(), 30);
    let stats = repo.stats().unwrap();
    assert!(stats.size <= stats.max_size);
}

#[test]
fn restricted_policy_from_toml() {
    let dir = TempDir::new().unwrap();
    let text = format!(
        "base_dir = {:?}\ncache_max_size = 4\nwarm_up_on_start = false\nlegacy_fallback = true\n\n[label_policy]\ncharset = \"restricted\"\n",
        dir.path().join("store").display().to_string()
    );
    let config = StoreConfig::from_toml_str(&text).unwrap();
    assert_eq!(config.label_policy.charset, LabelCharset::Restricted);

    let repo = CachedRepository::open(&config).unwrap();
    assert!(repo.store().legacy_fallback());
    let bad = NewComplaint::new(AgentId::parse("bot™").unwrap(), "task", Severity::Low);
    assertions::assert_validation_error(&repo.file_complaint(&ctx(), bad));
    assert_eq!(repo.count(&ctx()).unwrap(), 0);
}

#[test]
fn cancellation_stops_bulk_scan() {
    let dir = TempDir::new().unwrap();
    let repo = CachedRepository::open(&config(&dir, 4)).unwrap();
    for complaint in fixtures::complaints_over_time(3) {
        repo.save(&ctx(), &complaint).unwrap();
    }
    let cancelled = CallContext::background();
    cancelled.cancel_handle().cancel();
    let err = repo
        .query(&cancelled, &ComplaintFilter::all(), Page::all())
        .unwrap_err();
    assert!(matches!(
        err,
        complaint_core::ComplaintError::Storage(complaint_core::StorageError::Cancelled { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Whatever is saved through the cache reads back identically from disk.
    #[test]
    fn saved_records_read_back_from_disk(
        complaints in prop::collection::vec(generators::arb_transitioned_complaint(), 1..8),
    ) {
        let dir = TempDir::new().unwrap();
        let repo = CachedRepository::open(&config(&dir, 3)).unwrap();
        for c in &complaints {
            repo.save(&ctx(), c).unwrap();
        }
        let plain = FileStore::open(repo.store().base_dir()).unwrap();
        for c in &complaints {
            prop_assert_eq!(plain.get(&ctx(), c.id()).unwrap(), c.clone());
        }
    }
}
