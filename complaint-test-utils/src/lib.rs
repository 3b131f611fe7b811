//! Complaint Store Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for identifiers and complaint records
//! - Fixtures for common scenarios
//! - Assertions for complaint-specific error shapes

pub use complaint_core::{
    AgentId, CallContext, Complaint, ComplaintError, ComplaintId, ComplaintResult, Label,
    NewComplaint, ProjectId, ResolutionState, SessionId, Severity, StorageError, Timestamp,
    Transition, ValidationError,
};

use chrono::Utc;

/// Rebuild `complaint` through the builder, keeping id and creation time.
///
/// The result is always Open; resolution is not carried over.
fn rebuild(complaint: &Complaint, edit: impl FnOnce(NewComplaint) -> NewComplaint) -> Complaint {
    let mut new = NewComplaint::new(
        complaint.agent().clone(),
        complaint.task_description(),
        complaint.severity(),
    )
    .with_session(complaint.session().clone())
    .with_project(complaint.project().clone());
    if let Some(text) = complaint.problem_details() {
        new = new.with_problem_details(text);
    }
    if let Some(text) = complaint.attempted_workarounds() {
        new = new.with_attempted_workarounds(text);
    }
    if let Some(text) = complaint.suggested_fix() {
        new = new.with_suggested_fix(text);
    }
    if let Some(text) = complaint.context() {
        new = new.with_context(text);
    }
    edit(new)
        .file_at(complaint.id(), complaint.created_at())
        .unwrap_or_else(|e| panic!("fixture rebuild produced an invalid complaint: {e}"))
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating complaint types.

    use super::*;
    use proptest::prelude::*;
    use uuid::{Builder, Uuid};

    // === Identity Type Generators ===

    /// Generate a random v4 UUID.
    pub fn arb_uuid_v4() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(|bytes| Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Generate a random ComplaintId.
    pub fn arb_complaint_id() -> impl Strategy<Value = ComplaintId> {
        arb_uuid_v4().prop_filter_map("v4 uuid", |uuid| ComplaintId::from_uuid(uuid).ok())
    }

    /// Generate label text that passes every label policy.
    pub fn arb_label_text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 _.@/:-]{0,40}"
    }

    /// Generate a random AgentId.
    pub fn arb_agent_id() -> impl Strategy<Value = AgentId> {
        arb_label_text().prop_filter_map("valid agent", |s| AgentId::parse(&s).ok())
    }

    /// Generate a SessionId, unset about a third of the time.
    pub fn arb_session_id() -> impl Strategy<Value = SessionId> {
        prop_oneof![
            1 => Just(SessionId::unset()),
            2 => arb_label_text().prop_filter_map("valid session", |s| SessionId::parse(&s).ok()),
        ]
    }

    /// Generate a ProjectId, unset about a third of the time.
    pub fn arb_project_id() -> impl Strategy<Value = ProjectId> {
        prop_oneof![
            1 => Just(ProjectId::unset()),
            2 => arb_label_text().prop_filter_map("valid project", |s| ProjectId::parse(&s).ok()),
        ]
    }

    /// Generate a Timestamp (DateTime<Utc>).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        // Generate timestamps within a reasonable range (2020-2030)
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    // === Enum Generators ===

    /// Generate a random Severity.
    pub fn arb_severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Low),
            Just(Severity::Medium),
            Just(Severity::High),
            Just(Severity::Critical),
        ]
    }

    /// Generate a random Transition.
    pub fn arb_transition() -> impl Strategy<Value = Transition> {
        prop_oneof![
            arb_agent_id().prop_map(|by| Transition::Resolve { by }),
            Just(Transition::Reject),
            Just(Transition::Defer),
            Just(Transition::Reopen),
        ]
    }

    // === Record Generators ===

    /// Generate non-blank free text.
    pub fn arb_text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ,.!?'-]{0,120}"
    }

    /// Generate a valid, Open complaint.
    pub fn arb_complaint() -> impl Strategy<Value = Complaint> {
        (
            arb_complaint_id(),
            arb_agent_id(),
            arb_session_id(),
            arb_project_id(),
            arb_text(),
            proptest::option::of(arb_text()),
            proptest::option::of(arb_text()),
            arb_severity(),
            arb_timestamp(),
        )
            .prop_filter_map(
                "valid complaint",
                |(id, agent, session, project, task, details, fix, severity, at)| {
                    let mut new = NewComplaint::new(agent, task, severity)
                        .with_session(session)
                        .with_project(project);
                    if let Some(details) = details {
                        new = new.with_problem_details(details);
                    }
                    if let Some(fix) = fix {
                        new = new.with_suggested_fix(fix);
                    }
                    new.file_at(id, at).ok()
                },
            )
    }

    /// Generate a complaint with a sequence of transitions applied.
    ///
    /// Illegal transitions in the sequence are skipped.
    pub fn arb_transitioned_complaint() -> impl Strategy<Value = Complaint> {
        (arb_complaint(), prop::collection::vec(arb_transition(), 0..5)).prop_map(
            |(mut complaint, transitions)| {
                for transition in transitions {
                    let _ = complaint.apply(transition, Utc::now());
                }
                complaint
            },
        )
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use chrono::Duration;

    /// Agent name used by every fixture complaint.
    pub const FIXTURE_AGENT: &str = "fixture-agent";

    fn agent() -> AgentId {
        AgentId::parse(FIXTURE_AGENT).unwrap_or_else(|e| panic!("fixture agent invalid: {e}"))
    }

    /// Create an Open, Medium-severity complaint with a fresh id.
    pub fn complaint() -> Complaint {
        NewComplaint::new(agent(), "Run the test suite", Severity::Medium)
            .with_session(SessionId::parse("session-1").unwrap_or_default())
            .with_problem_details("The runner exits before reporting results")
            .file()
            .unwrap_or_else(|e| panic!("fixture complaint invalid: {e}"))
    }

    /// Create `n` complaints one minute apart, oldest first.
    pub fn complaints_over_time(n: usize) -> Vec<Complaint> {
        let start = Utc::now() - Duration::minutes(n as i64 + 1);
        (0..n)
            .map(|i| {
                NewComplaint::new(agent(), format!("Task number {i}"), Severity::Medium)
                    .file_at(ComplaintId::new(), start + Duration::minutes(i as i64))
                    .unwrap_or_else(|e| panic!("fixture complaint invalid: {e}"))
            })
            .collect()
    }

    /// Copy of `complaint` filed under `project`.
    pub fn with_project(complaint: &Complaint, project: ProjectId) -> Complaint {
        rebuild(complaint, |new| new.with_project(project))
    }

    /// Copy of `complaint` with its context text replaced.
    pub fn with_context(complaint: &Complaint, context: impl Into<String>) -> Complaint {
        rebuild(complaint, |new| new.with_context(context))
    }

    /// Create a complaint that has already been resolved by `resolver`.
    pub fn resolved_complaint(resolver: &str) -> Complaint {
        let mut complaint = complaint();
        let by = AgentId::parse(resolver).unwrap_or_else(|e| panic!("resolver invalid: {e}"));
        complaint
            .resolve(by)
            .unwrap_or_else(|e| panic!("fixture resolve failed: {e}"));
        complaint
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for complaint-specific validation.

    use super::*;

    /// Assert that a ComplaintResult is a NotFound storage error for `id`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &ComplaintResult<T>, id: ComplaintId) {
        match result {
            Err(ComplaintError::Storage(StorageError::NotFound { id: found })) => {
                assert_eq!(*found, id, "Wrong id in NotFound error");
            }
            other => panic!("Expected NotFound error for {id}, got: {other:?}"),
        }
    }

    /// Assert that a ComplaintResult is a Corrupted storage error.
    #[track_caller]
    pub fn assert_corrupted<T: std::fmt::Debug>(result: &ComplaintResult<T>) {
        match result {
            Err(ComplaintError::Storage(StorageError::Corrupted { .. })) => {}
            other => panic!("Expected Corrupted error, got: {other:?}"),
        }
    }

    /// Assert that a ComplaintResult is a Validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &ComplaintResult<T>) {
        match result {
            Err(ComplaintError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {other:?}"),
        }
    }

    /// Assert that records are ordered newest first.
    #[track_caller]
    pub fn assert_newest_first(records: &[Complaint]) {
        for pair in records.windows(2) {
            assert!(
                pair[0].created_at() >= pair[1].created_at(),
                "records out of order: {} before {}",
                pair[0].created_at(),
                pair[1].created_at()
            );
        }
    }

    /// Assert that resolution state and resolution detail agree.
    #[track_caller]
    pub fn assert_resolution_consistent(complaint: &Complaint) {
        assert_eq!(
            complaint.state() == ResolutionState::Resolved,
            complaint.resolution_detail().is_some(),
            "resolution detail disagrees with state {}",
            complaint.state()
        );
    }
}
