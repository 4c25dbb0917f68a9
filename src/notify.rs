//! Notification records and status templates
//!
//! The engine only enqueues notification rows inside the writer's
//! transaction; delivery is a separate mechanism that reads the
//! notifications tree. Rows are append-only — the single permitted
//! mutation is the mark-read flag, and that belongs to the reader side.

use crate::claim::{ClaimStatus, TimeStamp};
use crate::error::ClaimError;
use crate::utils;
use chrono::Utc;

pub const KIND_CLAIM_STATUS: &str = "claim_status";

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    #[n(0)]
    pub notification_id: String,
    #[n(1)]
    pub user_id: String,
    #[n(2)]
    pub title: String,
    #[n(3)]
    pub message: String,
    #[n(4)]
    pub kind: String,
    #[n(5)]
    pub link_to: String,
    #[n(6)]
    pub is_read: bool,
    #[n(7)]
    pub created_at: TimeStamp<Utc>,
}

fn build(
    user_id: &str,
    claim_id: &str,
    title: &str,
    message: &str,
    at: TimeStamp<Utc>,
) -> Result<Notification, ClaimError> {
    Ok(Notification {
        notification_id: utils::new_notification_id()?,
        user_id: user_id.to_string(),
        title: title.to_string(),
        message: message.to_string(),
        kind: KIND_CLAIM_STATUS.to_string(),
        link_to: format!("/claims/{claim_id}"),
        is_read: false,
        created_at: at,
    })
}

impl Notification {
    /// Notice to the owner that a new claim entered the queue.
    pub fn for_submission(
        user_id: &str,
        claim_id: &str,
        at: TimeStamp<Utc>,
    ) -> Result<Notification, ClaimError> {
        build(
            user_id,
            claim_id,
            "Claim received",
            "Your claim has been received and is pending review.",
            at,
        )
    }

    /// Notice to the owner describing the status a claim just entered.
    /// Text comes from a fixed template set keyed by the target status.
    pub fn for_status(
        user_id: &str,
        claim_id: &str,
        status: ClaimStatus,
        at: TimeStamp<Utc>,
    ) -> Result<Notification, ClaimError> {
        let (title, message) = match status {
            ClaimStatus::Approved => ("Claim approved", "Your claim has been approved."),
            ClaimStatus::Rejected => (
                "Claim rejected",
                "Your claim has been rejected. See the reviewer note for details.",
            ),
            ClaimStatus::Incomplete => (
                "Claim needs correction",
                "A reviewer requested corrections before review can continue.",
            ),
            ClaimStatus::Pending => (
                "Claim back in review",
                "Your resubmitted claim is back in the review queue.",
            ),
        };
        build(user_id, claim_id, title, message, at)
    }
}
