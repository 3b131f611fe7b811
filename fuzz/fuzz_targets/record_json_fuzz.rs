//! Fuzz test for stored record decoding
//!
//! Any bytes read from disk must decode to a fully valid record or fail with
//! an error, never panic, and a decoded record must survive re-encoding.
//!
//! Run with: cargo +nightly fuzz run record_json_fuzz -- -max_total_time=60

#![no_main]

use complaint_core::{Complaint, ResolutionState};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(complaint) = serde_json::from_slice::<Complaint>(data) else {
        return;
    };

    assert!(complaint.validate().is_ok());
    assert_eq!(
        complaint.state() == ResolutionState::Resolved,
        complaint.resolution_detail().is_some()
    );

    let encoded = serde_json::to_vec(&complaint).expect("valid record encodes");
    let decoded: Complaint = serde_json::from_slice(&encoded).expect("encoded record decodes");
    assert_eq!(decoded, complaint);
});
