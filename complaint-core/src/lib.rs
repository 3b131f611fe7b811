//! Complaint Core - Record Types
//!
//! Identifier value types, the complaint record with its resolution state
//! machine, query filters, call context and the error taxonomy. Every other
//! crate in the workspace depends on this one; it performs no I/O.

pub mod context;
pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;
pub mod identity;

pub use context::{CallContext, CancelHandle};
pub use entities::{
    Complaint, NewComplaint, Resolution, ResolutionDetail, Transition, TransitionOutcome,
    CONTEXT_MAX_CHARS, NOTE_MAX_CHARS, TASK_DESCRIPTION_MAX_CHARS,
};
pub use enums::{ResolutionState, ResolutionStateParseError, Severity, SeverityParseError};
pub use error::{ComplaintError, ComplaintResult, ConfigError, StorageError, ValidationError};
pub use filter::{newest_first, ComplaintFilter, Page};
pub use identity::{
    AgentId, ComplaintId, Label, LabelCharset, LabelPolicy, Presence, ProjectId, SessionId,
    Timestamp, MAX_LABEL_CHARS,
};
