//! Query filter and paging shared by every store implementation
//!
//! Bulk queries are expressed as a [`ComplaintFilter`] so the file store and
//! the in-memory store agree on matching, ordering and paging.

use crate::{AgentId, Complaint, Label, ProjectId, Severity};
use std::cmp::Ordering;

/// Predicate over complaint records. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintFilter {
    pub severity: Option<Severity>,
    pub project: Option<ProjectId>,
    pub agent: Option<AgentId>,
    /// Only Open or Deferred records.
    pub unresolved_only: bool,
    /// Case-insensitive substring over description fields and labels.
    pub text: Option<String>,
}

impl ComplaintFilter {
    /// Filter that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn severity(severity: Severity) -> Self {
        Self {
            severity: Some(severity),
            ..Self::default()
        }
    }

    pub fn project(project: ProjectId) -> Self {
        Self {
            project: Some(project),
            ..Self::default()
        }
    }

    pub fn agent(agent: AgentId) -> Self {
        Self {
            agent: Some(agent),
            ..Self::default()
        }
    }

    pub fn unresolved() -> Self {
        Self {
            unresolved_only: true,
            ..Self::default()
        }
    }

    pub fn text(query: impl Into<String>) -> Self {
        Self {
            text: Some(query.into()),
            ..Self::default()
        }
    }

    /// Evaluate the filter against one record.
    pub fn matches(&self, complaint: &Complaint) -> bool {
        if let Some(severity) = self.severity {
            if complaint.severity() != severity {
                return false;
            }
        }
        if let Some(project) = &self.project {
            if complaint.project() != project {
                return false;
            }
        }
        if let Some(agent) = &self.agent {
            if complaint.agent() != agent {
                return false;
            }
        }
        if self.unresolved_only && !complaint.state().is_unresolved() {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => matches_text(complaint, &query.to_lowercase()),
        }
    }
}

fn matches_text(complaint: &Complaint, needle: &str) -> bool {
    let labels = [
        complaint.agent().as_str(),
        complaint.session().as_str(),
        complaint.project().as_str(),
    ];
    complaint
        .text_fields()
        .chain(labels)
        .any(|haystack| haystack.to_lowercase().contains(needle))
}

/// Newest first by creation time, ties broken by id so ordering is total.
pub fn newest_first(a: &Complaint, b: &Complaint) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| a.id().cmp(&b.id()))
}

/// Limit/offset window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Every record.
    pub fn all() -> Self {
        Self {
            limit: usize::MAX,
            offset: 0,
        }
    }

    /// The first `limit` records.
    pub fn first(limit: usize) -> Self {
        Self { limit, offset: 0 }
    }

    /// Sort newest first and cut the window out of `records`.
    pub fn apply(&self, mut records: Vec<Complaint>) -> Vec<Complaint> {
        records.sort_by(newest_first);
        records
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComplaintId, NewComplaint};
    use chrono::{Duration, Utc};

    fn make(agent: &str, project: &str, severity: Severity, minutes_ago: i64) -> Complaint {
        NewComplaint::new(AgentId::parse(agent).unwrap(), "Deploy the service", severity)
            .with_project(ProjectId::parse(project).unwrap())
            .with_suggested_fix("Retry the Upload step")
            .file_at(ComplaintId::new(), Utc::now() - Duration::minutes(minutes_ago))
            .unwrap()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let c = make("a", "p", Severity::Low, 0);
        assert!(ComplaintFilter::all().matches(&c));
    }

    #[test]
    fn test_severity_and_project_filters() {
        let c = make("a", "alpha", Severity::High, 0);
        assert!(ComplaintFilter::severity(Severity::High).matches(&c));
        assert!(!ComplaintFilter::severity(Severity::Low).matches(&c));
        assert!(ComplaintFilter::project(ProjectId::parse("alpha").unwrap()).matches(&c));
        assert!(!ComplaintFilter::project(ProjectId::parse("beta").unwrap()).matches(&c));
    }

    #[test]
    fn test_unresolved_filter() {
        let mut c = make("a", "p", Severity::Low, 0);
        assert!(ComplaintFilter::unresolved().matches(&c));
        c.resolve(AgentId::parse("triager").unwrap()).unwrap();
        assert!(!ComplaintFilter::unresolved().matches(&c));
    }

    #[test]
    fn test_text_search_is_case_insensitive() {
        let c = make("deploy-bot", "p", Severity::Low, 0);
        assert!(ComplaintFilter::text("upload").matches(&c));
        assert!(ComplaintFilter::text("DEPLOY-BOT").matches(&c));
        assert!(!ComplaintFilter::text("kubernetes").matches(&c));
        assert!(ComplaintFilter::text("   ").matches(&c));
    }

    #[test]
    fn test_page_orders_newest_first() {
        let old = make("a", "p", Severity::Low, 30);
        let mid = make("a", "p", Severity::Low, 20);
        let new = make("a", "p", Severity::Low, 10);
        let page = Page::new(2, 0).apply(vec![old.clone(), new.clone(), mid.clone()]);
        assert_eq!(page, vec![new.clone(), mid.clone()]);

        let rest = Page::new(10, 2).apply(vec![old.clone(), mid, new]);
        assert_eq!(rest, vec![old]);
    }

    #[test]
    fn test_page_offset_past_end_is_empty() {
        let page = Page::new(10, 5).apply(vec![make("a", "p", Severity::Low, 0)]);
        assert!(page.is_empty());
    }
}
