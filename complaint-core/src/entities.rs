//! The complaint record and its invariants.
//!
//! A [`Complaint`] is immutable after filing except for resolution-state
//! transitions. Resolution is a single tagged value: the "when" and "by whom"
//! of a resolution live inside [`Resolution::Resolved`], so a record can never
//! claim to be resolved without a resolver, or carry a resolver while open.

use crate::{
    AgentId, ComplaintId, Label, LabelPolicy, ProjectId, ResolutionState, SessionId, Severity,
    Timestamp, ValidationError,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum length of the task description, in characters.
pub const TASK_DESCRIPTION_MAX_CHARS: usize = 1000;
/// Maximum length of `problem_details`, `attempted_workarounds` and `suggested_fix`.
pub const NOTE_MAX_CHARS: usize = 2000;
/// Maximum length of the free-form `context` field.
pub const CONTEXT_MAX_CHARS: usize = 5000;

// ============================================================================
// RESOLUTION
// ============================================================================

/// Who resolved a complaint, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionDetail {
    pub resolved_by: AgentId,
    pub resolved_at: Timestamp,
}

/// Resolution state together with the data that only exists in that state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Open,
    Resolved(ResolutionDetail),
    Rejected,
    Deferred,
}

impl Resolution {
    /// The bare state discriminant.
    pub fn state(&self) -> ResolutionState {
        match self {
            Resolution::Open => ResolutionState::Open,
            Resolution::Resolved(_) => ResolutionState::Resolved,
            Resolution::Rejected => ResolutionState::Rejected,
            Resolution::Deferred => ResolutionState::Deferred,
        }
    }

    /// Resolution detail, present if and only if the state is Resolved.
    pub fn detail(&self) -> Option<&ResolutionDetail> {
        match self {
            Resolution::Resolved(detail) => Some(detail),
            _ => None,
        }
    }
}

/// A requested resolution-state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Resolve { by: AgentId },
    Reject,
    Defer,
    Reopen,
}

impl Transition {
    /// The state this transition moves to.
    pub fn target(&self) -> ResolutionState {
        match self {
            Transition::Resolve { .. } => ResolutionState::Resolved,
            Transition::Reject => ResolutionState::Rejected,
            Transition::Defer => ResolutionState::Deferred,
            Transition::Reopen => ResolutionState::Open,
        }
    }
}

/// What applying a transition did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The state changed; the record must be persisted.
    Applied,
    /// The record was already in the target state; nothing changed.
    Unchanged,
}

// ============================================================================
// COMPLAINT
// ============================================================================

/// A complaint filed by an AI agent.
///
/// Construct new records through [`NewComplaint`]. Stored records are read
/// back through serde, which re-runs every check in [`Complaint::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ComplaintDocument", into = "ComplaintDocument")]
pub struct Complaint {
    id: ComplaintId,
    agent: AgentId,
    session: SessionId,
    project: ProjectId,
    task_description: String,
    problem_details: Option<String>,
    attempted_workarounds: Option<String>,
    suggested_fix: Option<String>,
    context: Option<String>,
    severity: Severity,
    created_at: Timestamp,
    resolution: Resolution,
}

impl Complaint {
    pub fn id(&self) -> ComplaintId {
        self.id
    }

    pub fn agent(&self) -> &AgentId {
        &self.agent
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn task_description(&self) -> &str {
        &self.task_description
    }

    pub fn problem_details(&self) -> Option<&str> {
        self.problem_details.as_deref()
    }

    pub fn attempted_workarounds(&self) -> Option<&str> {
        self.attempted_workarounds.as_deref()
    }

    pub fn suggested_fix(&self) -> Option<&str> {
        self.suggested_fix.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn state(&self) -> ResolutionState {
        self.resolution.state()
    }

    pub fn resolution_detail(&self) -> Option<&ResolutionDetail> {
        self.resolution.detail()
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == ResolutionState::Resolved
    }

    /// All free-text fields, for search.
    pub fn text_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.task_description.as_str()).chain(
            [
                &self.problem_details,
                &self.attempted_workarounds,
                &self.suggested_fix,
                &self.context,
            ]
            .into_iter()
            .filter_map(|field| field.as_deref()),
        )
    }

    /// Re-check every record invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.id.validate()?;
        self.agent.validate()?;
        self.session.validate()?;
        self.project.validate()?;
        check_text(
            "task_description",
            Some(self.task_description.as_str()),
            TASK_DESCRIPTION_MAX_CHARS,
            true,
        )?;
        check_text("problem_details", self.problem_details.as_deref(), NOTE_MAX_CHARS, false)?;
        check_text(
            "attempted_workarounds",
            self.attempted_workarounds.as_deref(),
            NOTE_MAX_CHARS,
            false,
        )?;
        check_text("suggested_fix", self.suggested_fix.as_deref(), NOTE_MAX_CHARS, false)?;
        check_text("context", self.context.as_deref(), CONTEXT_MAX_CHARS, false)?;
        if let Some(detail) = self.resolution.detail() {
            detail.resolved_by.validate()?;
        }
        Ok(())
    }

    /// Check the identifier labels against a deployment label policy.
    pub fn check_labels(&self, policy: &LabelPolicy) -> Result<(), ValidationError> {
        self.agent.validate_with(policy)?;
        self.session.validate_with(policy)?;
        self.project.validate_with(policy)?;
        if let Some(detail) = self.resolution.detail() {
            detail.resolved_by.validate_with(policy)?;
        }
        Ok(())
    }

    /// Apply a resolution-state transition.
    ///
    /// Re-applying the current state returns `Unchanged` without touching the
    /// record; in particular a second `Resolve` keeps the original resolver
    /// and timestamp.
    pub fn apply(
        &mut self,
        transition: Transition,
        at: Timestamp,
    ) -> Result<TransitionOutcome, ValidationError> {
        let from = self.state();
        let to = transition.target();
        if from == to {
            return Ok(TransitionOutcome::Unchanged);
        }
        if !from.can_transition_to(to) {
            return Err(ValidationError::InvalidTransition { from, to });
        }
        self.resolution = match transition {
            Transition::Resolve { by } => Resolution::Resolved(ResolutionDetail {
                resolved_by: by,
                resolved_at: at,
            }),
            Transition::Reject => Resolution::Rejected,
            Transition::Defer => Resolution::Deferred,
            Transition::Reopen => Resolution::Open,
        };
        Ok(TransitionOutcome::Applied)
    }

    /// Resolve the complaint now. Idempotent.
    pub fn resolve(&mut self, by: AgentId) -> Result<TransitionOutcome, ValidationError> {
        self.apply(Transition::Resolve { by }, Utc::now())
    }
}

fn check_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
    required: bool,
) -> Result<(), ValidationError> {
    let value = match value {
        Some(v) => v,
        None if required => return Err(ValidationError::RequiredFieldMissing { field }),
        None => return Ok(()),
    };
    if value.trim().is_empty() {
        return if required {
            Err(ValidationError::RequiredFieldMissing { field })
        } else {
            Err(ValidationError::InvalidValue {
                field,
                reason: "must not be blank when present".to_string(),
            })
        };
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Empty optional text collapses to `None`.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// NEW COMPLAINT BUILDER
// ============================================================================

/// Builder for a complaint that has not been filed yet.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    agent: AgentId,
    session: SessionId,
    project: ProjectId,
    task_description: String,
    problem_details: Option<String>,
    attempted_workarounds: Option<String>,
    suggested_fix: Option<String>,
    context: Option<String>,
    severity: Severity,
}

impl NewComplaint {
    pub fn new(agent: AgentId, task_description: impl Into<String>, severity: Severity) -> Self {
        Self {
            agent,
            session: SessionId::unset(),
            project: ProjectId::unset(),
            task_description: task_description.into(),
            problem_details: None,
            attempted_workarounds: None,
            suggested_fix: None,
            context: None,
            severity,
        }
    }

    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    pub fn with_project(mut self, project: ProjectId) -> Self {
        self.project = project;
        self
    }

    pub fn with_problem_details(mut self, text: impl Into<String>) -> Self {
        self.problem_details = Some(text.into());
        self
    }

    pub fn with_attempted_workarounds(mut self, text: impl Into<String>) -> Self {
        self.attempted_workarounds = Some(text.into());
        self
    }

    pub fn with_suggested_fix(mut self, text: impl Into<String>) -> Self {
        self.suggested_fix = Some(text.into());
        self
    }

    pub fn with_context(mut self, text: impl Into<String>) -> Self {
        self.context = Some(text.into());
        self
    }

    /// File the complaint with a fresh id and the current time.
    pub fn file(self) -> Result<Complaint, ValidationError> {
        self.file_at(ComplaintId::new(), Utc::now())
    }

    /// File the complaint with an explicit id and creation time.
    pub fn file_at(self, id: ComplaintId, created_at: Timestamp) -> Result<Complaint, ValidationError> {
        let complaint = Complaint {
            id,
            agent: self.agent,
            session: self.session,
            project: self.project,
            task_description: self.task_description,
            problem_details: non_empty(self.problem_details),
            attempted_workarounds: non_empty(self.attempted_workarounds),
            suggested_fix: non_empty(self.suggested_fix),
            context: non_empty(self.context),
            severity: self.severity,
            created_at,
            resolution: Resolution::Open,
        };
        complaint.validate()?;
        Ok(complaint)
    }
}

// ============================================================================
// ON-DISK DOCUMENT
// ============================================================================

/// Flat JSON shape of a stored complaint.
///
/// `resolved_at` / `resolved_by` are written only for resolved records, and a
/// document whose state and resolution detail disagree is rejected on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ComplaintDocument {
    id: String,
    agent_name: String,
    #[serde(default)]
    session_name: String,
    #[serde(default)]
    project_name: String,
    task_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    problem_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attempted_workarounds: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suggested_fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    severity: Severity,
    timestamp: Timestamp,
    #[serde(default)]
    resolution_state: ResolutionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_by: Option<String>,
}

impl From<Complaint> for ComplaintDocument {
    fn from(c: Complaint) -> Self {
        let resolution_state = c.resolution.state();
        let (resolved_at, resolved_by) = match c.resolution {
            Resolution::Resolved(detail) => {
                (Some(detail.resolved_at), Some(String::from(detail.resolved_by)))
            }
            _ => (None, None),
        };
        Self {
            id: c.id.to_string(),
            agent_name: c.agent.into(),
            session_name: c.session.into(),
            project_name: c.project.into(),
            task_description: c.task_description,
            problem_details: c.problem_details,
            attempted_workarounds: c.attempted_workarounds,
            suggested_fix: c.suggested_fix,
            context: c.context,
            severity: c.severity,
            timestamp: c.created_at,
            resolution_state,
            resolved_at,
            resolved_by,
        }
    }
}

impl TryFrom<ComplaintDocument> for Complaint {
    type Error = ValidationError;

    fn try_from(doc: ComplaintDocument) -> Result<Self, Self::Error> {
        let resolution = match (doc.resolution_state, doc.resolved_at, doc.resolved_by) {
            (ResolutionState::Resolved, Some(resolved_at), Some(resolved_by)) => {
                Resolution::Resolved(ResolutionDetail {
                    resolved_by: AgentId::parse(&resolved_by)?,
                    resolved_at,
                })
            }
            (ResolutionState::Resolved, _, _) => {
                return Err(ValidationError::InvalidValue {
                    field: "resolution_state",
                    reason: "resolved record is missing resolved_at/resolved_by".to_string(),
                })
            }
            (ResolutionState::Open, None, None) => Resolution::Open,
            (ResolutionState::Rejected, None, None) => Resolution::Rejected,
            (ResolutionState::Deferred, None, None) => Resolution::Deferred,
            (state, _, _) => {
                return Err(ValidationError::InvalidValue {
                    field: "resolution_state",
                    reason: format!("{state} record carries resolution detail"),
                })
            }
        };

        let complaint = Complaint {
            id: ComplaintId::parse(&doc.id)?,
            agent: AgentId::parse(&doc.agent_name)?,
            session: SessionId::parse(&doc.session_name)?,
            project: ProjectId::parse(&doc.project_name)?,
            task_description: doc.task_description,
            problem_details: non_empty(doc.problem_details),
            attempted_workarounds: non_empty(doc.attempted_workarounds),
            suggested_fix: non_empty(doc.suggested_fix),
            context: non_empty(doc.context),
            severity: doc.severity,
            created_at: doc.timestamp,
            resolution,
        };
        complaint.validate()?;
        Ok(complaint)
    }
}

// ============================================================================
// TESTS
// ============================================================================
