//! Smoke Screen Unit tests for claim workflow components
//!
//! These test are unit tests that span the codebase, testing behavior in
//! isolation from integration scenarios. These are intended as smoke-screen
//! and generally test the happy-path.
//!
#![allow(unused_imports)]

use chrono::{Datelike, Timelike, Utc};
use claim_intake::{
    claim::{ClaimStatus, TimeStamp},
    error::TransitionError,
    history::{self, HistoryEntry},
    notify::Notification,
    transition::{self, NotePolicy, TransitionPayload},
    utils::new_uuid_to_bech32,
};

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Test that new_uuid_to_bech32 generates valid bech32-encoded strings
    /// with the correct human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let result = new_uuid_to_bech32("claim_");
        assert!(result.is_ok());

        let encoded = result.unwrap();
        assert!(encoded.starts_with("claim_1"));
        assert!(encoded.len() > 10); // UUID should produce substantial output
    }

    /// Test that the function handles empty strings appropriately
    #[test]
    fn handles_empty_hrp() {
        // Empty string should fail
        let result = new_uuid_to_bech32("");
        assert!(result.is_err());
    }

    /// Test that multiple calls generate unique identifiers
    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32("claim_").unwrap();
        let id2 = new_uuid_to_bech32("claim_").unwrap();
        let id3 = new_uuid_to_bech32("claim_").unwrap();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    /// Test that different HRPs produce different encoded strings
    #[test]
    fn different_hrps_produce_different_encodings() {
        let claim_id = new_uuid_to_bech32("claim_").unwrap();
        let detail_id = new_uuid_to_bech32("acc_").unwrap();

        assert!(claim_id.starts_with("claim_"));
        assert!(detail_id.starts_with("acc_"));
        assert_ne!(claim_id, detail_id);
    }
}

// TIMESTAMP TESTS
#[cfg(test)]
mod timestamp_tests {
    use super::*;

    /// Test that TimeStamp::new() creates a timestamp close to current time
    #[test]
    fn timestamp_new_creates_current_time() {
        let ts = TimeStamp::new();
        let now = Utc::now();

        let diff = (now - ts.to_datetime_utc()).num_seconds().abs();
        assert!(diff < 1); // Should be within 1 second
    }

    /// Test that TimeStamp can be created with specific date/time values
    #[test]
    fn timestamp_new_with_creates_specific_time() {
        let ts = TimeStamp::new_with(2025, 6, 15, 10, 30, 0);
        let dt = ts.to_datetime_utc();

        assert_eq!(dt.year(), 2025);
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    /// Test that TimeStamp CBOR encoding/decoding round-trips correctly
    #[test]
    fn timestamp_cbor_roundtrip() {
        let original = TimeStamp::new();

        let encoded = minicbor::to_vec(&original).unwrap();
        let decoded: TimeStamp<Utc> = minicbor::decode(&encoded).unwrap();

        assert_eq!(original, decoded);
    }
}

// HISTORY CODEC TESTS
#[cfg(test)]
mod history_tests {
    use super::*;

    /// Decoding an absent ledger column yields an empty list, not an error
    #[test]
    fn absent_ledger_is_empty_not_null() {
        assert_eq!(history::decode(None), Vec::<HistoryEntry>::new());
    }

    /// Decoding garbage yields an empty list so reads never fail on
    /// old or foreign data
    #[test]
    fn garbage_ledger_is_empty() {
        assert!(history::decode(Some("��not json")).is_empty());
        assert!(history::decode(Some("42")).is_empty());
        assert!(history::decode(Some("{}")).is_empty());
    }

    /// Encoding an empty ledger produces a JSON array
    #[test]
    fn empty_ledger_encodes_as_array() {
        assert_eq!(history::encode(&[]).unwrap(), "[]");
    }

    /// The ledger survives a full encode/decode cycle in order
    #[test]
    fn ledger_round_trips_in_order() {
        let entries = vec![
            HistoryEntry::new(TimeStamp::new_with(2025, 1, 1, 8, 0, 0), "first round"),
            HistoryEntry::new(TimeStamp::new_with(2025, 1, 5, 8, 0, 0), "second round"),
        ];

        let column = history::encode(&entries).unwrap();
        assert_eq!(history::decode(Some(&column)), entries);
    }

    /// Append reads the old column and returns the full replacement value
    #[test]
    fn append_is_full_replace() {
        let column = history::append(
            None,
            HistoryEntry::new(TimeStamp::new_with(2025, 1, 1, 8, 0, 0), "first"),
        )
        .unwrap();
        let column = history::append(
            Some(&column),
            HistoryEntry::new(TimeStamp::new_with(2025, 1, 2, 8, 0, 0), "second"),
        )
        .unwrap();

        let entries = history::decode(Some(&column));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].note, "first");
        assert_eq!(entries[1].note, "second");
    }
}

// TRANSITION VALIDATOR TESTS
#[cfg(test)]
mod transition_tests {
    use super::*;
    use claim_intake::claim::ClaimStatus::{Approved, Incomplete, Pending, Rejected};

    fn payload<'a>(actor: &'a str, note: Option<&'a str>) -> TransitionPayload<'a> {
        TransitionPayload {
            actor_id: actor,
            note,
        }
    }

    /// The happy-path review outcomes from pending
    #[test]
    fn pending_review_outcomes() {
        assert!(transition::validate(Pending, Approved, payload("adj", None)).is_ok());
        assert!(transition::validate(Pending, Rejected, payload("adj", Some("fraud"))).is_ok());
        assert!(
            transition::validate(Pending, Incomplete, payload("adj", Some("blurry"))).is_ok()
        );
    }

    /// A reviewer must explain a rejection or correction request
    #[test]
    fn negative_outcomes_require_notes() {
        assert_eq!(
            transition::validate(Pending, Rejected, payload("adj", None)),
            Err(TransitionError::NoteRequired { to: Rejected })
        );
        assert_eq!(
            transition::validate(Pending, Incomplete, payload("adj", None)),
            Err(TransitionError::NoteRequired { to: Incomplete })
        );
    }

    /// The resubmission row reports its optional-note policy so the
    /// writer knows a default may be substituted
    #[test]
    fn resubmission_reports_optional_note_policy() {
        assert_eq!(
            transition::validate(Incomplete, Pending, payload("owner", None)),
            Ok(NotePolicy::Optional)
        );
    }

    /// The table itself matches the advertised transitions
    #[test]
    fn table_contents() {
        assert!(transition::is_legal(Pending, Approved));
        assert!(transition::is_legal(Pending, Rejected));
        assert!(transition::is_legal(Pending, Incomplete));
        assert!(transition::is_legal(Incomplete, Incomplete));
        assert!(transition::is_legal(Incomplete, Pending));

        assert!(!transition::is_legal(Approved, Pending));
        assert!(!transition::is_legal(Rejected, Approved));
        assert!(!transition::is_legal(Incomplete, Approved));
        assert!(!transition::is_legal(Pending, Pending));
    }
}

// NOTIFICATION TEMPLATE TESTS
#[cfg(test)]
mod notify_tests {
    use super::*;

    /// Each target status picks its fixed template
    #[test]
    fn templates_per_status() {
        let at = TimeStamp::new();

        let cases = [
            (ClaimStatus::Approved, "Claim approved"),
            (ClaimStatus::Rejected, "Claim rejected"),
            (ClaimStatus::Incomplete, "Claim needs correction"),
            (ClaimStatus::Pending, "Claim back in review"),
        ];
        for (status, title) in cases {
            let n = Notification::for_status("user_7", "claim_1x", status, at.clone()).unwrap();
            assert_eq!(n.title, title);
            assert_eq!(n.user_id, "user_7");
            assert_eq!(n.link_to, "/claims/claim_1x");
            assert!(!n.is_read);
        }
    }

    /// Submission has its own template
    #[test]
    fn submission_template() {
        let n = Notification::for_submission("user_7", "claim_1x", TimeStamp::new()).unwrap();
        assert_eq!(n.title, "Claim received");
    }
}
