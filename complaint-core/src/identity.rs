//! Identity types for complaint records
//!
//! Every identifier is a distinct nominal type so a session label can never be
//! passed where an agent label is expected. Each type has the same
//! `parse`/`validate` pair, and both entry points route through a single
//! checker so they always agree on which values (including the empty string)
//! are acceptable.

use crate::ValidationError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::{Uuid, Version};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Maximum length of an identifier label, in Unicode code points.
pub const MAX_LABEL_CHARS: usize = 100;

// ============================================================================
// COMPLAINT ID
// ============================================================================

/// Unique, immutable identifier of a complaint record (UUID v4).
///
/// The canonical text form is the lowercase hyphenated UUID. It doubles as
/// the on-disk file stem, so the format is a durable contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComplaintId(Uuid);

impl ComplaintId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from untrusted input.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::InvalidComplaintId {
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }
        let uuid = Uuid::parse_str(raw).map_err(|e| ValidationError::InvalidComplaintId {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_uuid(uuid)
    }

    /// Wrap an existing UUID, rejecting anything that is not a v4 UUID.
    pub fn from_uuid(uuid: Uuid) -> Result<Self, ValidationError> {
        let id = Self(uuid);
        id.validate()?;
        Ok(id)
    }

    /// Re-check the invariants of an already constructed identifier.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0.get_version() != Some(Version::Random) {
            return Err(ValidationError::InvalidComplaintId {
                value: self.0.to_string(),
                reason: "must be a version 4 UUID".to_string(),
            });
        }
        Ok(())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ComplaintId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ComplaintId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ComplaintId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ComplaintId> for String {
    fn from(id: ComplaintId) -> Self {
        id.to_string()
    }
}

// ============================================================================
// LABEL POLICY
// ============================================================================

/// Character set accepted in identifier labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCharset {
    /// Any characters; labels are free text.
    #[default]
    FreeText,
    /// ASCII letters, digits, space and `_ - . @ / :` only.
    Restricted,
}

/// Validation policy for agent/session/project labels.
///
/// The length limit is fixed; only the character set is configurable.
/// Records on disk are always read back under the default free-text policy,
/// so switching a deployment to `Restricted` never makes stored data
/// unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelPolicy {
    pub charset: LabelCharset,
}

impl LabelPolicy {
    /// Free-text policy (the default).
    pub const fn free_text() -> Self {
        Self {
            charset: LabelCharset::FreeText,
        }
    }

    /// Restricted character-set policy.
    pub const fn restricted() -> Self {
        Self {
            charset: LabelCharset::Restricted,
        }
    }
}

static RESTRICTED_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9 _\-.@/:]+$").expect("restricted label pattern is valid")
});

/// Whether a label type must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Empty or whitespace-only values are rejected.
    Required,
    /// The empty string means "unset"; non-empty values follow the same rules
    /// as required labels.
    Optional,
}

/// The single checker behind every label `parse` and `validate`.
fn check_label(
    field: &'static str,
    presence: Presence,
    value: &str,
    policy: &LabelPolicy,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return match presence {
            Presence::Required => Err(ValidationError::RequiredFieldMissing { field }),
            Presence::Optional => Ok(()),
        };
    }
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field,
            reason: "must not be whitespace-only".to_string(),
        });
    }
    let chars = value.chars().count();
    if chars > MAX_LABEL_CHARS {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_LABEL_CHARS,
            actual: chars,
        });
    }
    if policy.charset == LabelCharset::Restricted && !RESTRICTED_LABEL.is_match(value) {
        return Err(ValidationError::InvalidValue {
            field,
            reason: "contains characters outside the restricted label set".to_string(),
        });
    }
    Ok(())
}

/// Common surface of the string-backed label identifiers.
pub trait Label: Sized {
    /// JSON field name, also used in validation errors.
    const FIELD: &'static str;
    /// Whether the label is required or optional.
    const PRESENCE: Presence;

    /// Parse a label from untrusted input under an explicit policy.
    fn parse_with(raw: &str, policy: &LabelPolicy) -> Result<Self, ValidationError>;

    /// Borrow the label text.
    fn as_str(&self) -> &str;

    /// Parse a label from untrusted input under the default policy.
    fn parse(raw: &str) -> Result<Self, ValidationError> {
        Self::parse_with(raw, &LabelPolicy::default())
    }

    /// Re-check an already constructed label under an explicit policy.
    fn validate_with(&self, policy: &LabelPolicy) -> Result<(), ValidationError> {
        check_label(Self::FIELD, Self::PRESENCE, self.as_str(), policy)
    }

    /// Re-check an already constructed label under the default policy.
    fn validate(&self) -> Result<(), ValidationError> {
        self.validate_with(&LabelPolicy::default())
    }
}

macro_rules! label_type {
    ($(#[$meta:meta])* $name:ident, $field:literal, $presence:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl Label for $name {
            const FIELD: &'static str = $field;
            const PRESENCE: Presence = $presence;

            fn parse_with(raw: &str, policy: &LabelPolicy) -> Result<Self, ValidationError> {
                check_label(Self::FIELD, Self::PRESENCE, raw, policy)?;
                Ok(Self(raw.to_string()))
            }

            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as Label>::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                check_label(Self::FIELD, Self::PRESENCE, &value, &LabelPolicy::default())?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(label: $name) -> Self {
                label.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

macro_rules! optional_label_type {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        label_type!($(#[$meta])* $name, $field, Presence::Optional);

        impl $name {
            /// The "unset" value.
            pub fn unset() -> Self {
                Self(String::new())
            }

            /// Whether this label carries no value.
            pub fn is_unset(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::unset()
            }
        }
    };
}

label_type!(
    /// Name of the agent that filed (or resolved) a complaint. Required.
    AgentId,
    "agent_name",
    Presence::Required
);

optional_label_type!(
    /// Session the complaint was filed from. Empty means unset.
    SessionId,
    "session_name"
);

optional_label_type!(
    /// Project the complaint concerns. Empty means unset.
    ProjectId,
    "project_name"
);

// ============================================================================
// TESTS
// ============================================================================
