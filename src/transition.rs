//! Transition legality rules
//!
//! The legal status transitions are a fixed table, not scattered
//! branches: auditing or extending the workflow is a data change. The
//! validator is a pure function over (current, requested, payload) and
//! performs no reads or writes of its own.

use crate::claim::ClaimStatus::{self, Approved, Incomplete, Pending, Rejected};
use crate::error::TransitionError;

/// Whether a transition must carry a non-empty note. A reviewer has to
/// explain a rejection or a correction request; a resubmitting customer
/// does not have to explain the resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotePolicy {
    Required,
    Optional,
}

/// The complete set of legal transitions. Everything absent from this
/// table is rejected.
pub const TRANSITIONS: &[(ClaimStatus, ClaimStatus, NotePolicy)] = &[
    (Pending, Approved, NotePolicy::Optional),
    (Pending, Rejected, NotePolicy::Required),
    (Pending, Incomplete, NotePolicy::Required),
    // a second correction round while still uncorrected
    (Incomplete, Incomplete, NotePolicy::Required),
    // resubmission, the only customer-initiated transition
    (Incomplete, Pending, NotePolicy::Optional),
];

/// The actor and note accompanying a transition request.
#[derive(Debug, Clone, Copy)]
pub struct TransitionPayload<'a> {
    pub actor_id: &'a str,
    pub note: Option<&'a str>,
}

fn has_note(note: Option<&str>) -> bool {
    note.is_some_and(|n| !n.trim().is_empty())
}

/// Check a requested transition against the table. Returns the note
/// policy of the matched row so the caller knows whether a default note
/// may be substituted.
pub fn validate(
    current: ClaimStatus,
    requested: ClaimStatus,
    payload: TransitionPayload<'_>,
) -> Result<NotePolicy, TransitionError> {
    if payload.actor_id.trim().is_empty() {
        return Err(TransitionError::MissingActor);
    }
    if current.is_terminal() {
        return Err(TransitionError::TerminalState { from: current });
    }

    let (_, _, policy) = TRANSITIONS
        .iter()
        .find(|(from, to, _)| *from == current && *to == requested)
        .ok_or(TransitionError::NotAllowed {
            from: current,
            to: requested,
        })?;

    if *policy == NotePolicy::Required && !has_note(payload.note) {
        return Err(TransitionError::NoteRequired { to: requested });
    }

    Ok(*policy)
}

/// True when the pair appears in the transition table at all.
pub fn is_legal(from: ClaimStatus, to: ClaimStatus) -> bool {
    TRANSITIONS.iter().any(|(f, t, _)| *f == from && *t == to)
}
