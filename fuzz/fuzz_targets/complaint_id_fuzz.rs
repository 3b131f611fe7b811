//! Fuzz test for identifier parsing
//!
//! Checks that untrusted strings never panic the identifier constructors and
//! that `parse` and `validate` agree on everything they accept.
//!
//! Run with: cargo +nightly fuzz run complaint_id_fuzz -- -max_total_time=60

#![no_main]

use complaint_core::{AgentId, ComplaintId, Label, LabelPolicy, ProjectId, SessionId};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(id) = ComplaintId::parse(input) {
        assert!(id.validate().is_ok());
        let canonical = id.to_string();
        assert_eq!(ComplaintId::parse(&canonical), Ok(id));
    }

    for policy in [LabelPolicy::free_text(), LabelPolicy::restricted()] {
        if let Ok(agent) = AgentId::parse_with(input, &policy) {
            assert!(agent.validate_with(&policy).is_ok());
            assert!(!agent.as_str().trim().is_empty());
        }
        if let Ok(session) = SessionId::parse_with(input, &policy) {
            assert!(session.validate_with(&policy).is_ok());
        }
        if let Ok(project) = ProjectId::parse_with(input, &policy) {
            assert!(project.validate_with(&policy).is_ok());
        }
    }

    // Required and optional labels differ only on the empty string.
    assert_eq!(
        AgentId::parse(input).is_ok(),
        SessionId::parse(input).is_ok() && !input.is_empty()
    );
});
