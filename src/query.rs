//! Read-side assembly of claim views
//!
//! No business rules live here: this module joins what the writer
//! committed so the workflow invariants are externally observable.

use crate::claim::{AccidentDetail, Claim, ClaimStatus, EvidenceImage, TimeStamp};
use crate::error::ClaimError;
use crate::history::{self, HistoryEntry};
use crate::store::ClaimStore;
use chrono::Utc;

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const MAX_LIST_LIMIT: usize = 200;

/// Denormalized single-claim view. Both ledgers are always decoded
/// arrays, never absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimDetail {
    pub claim: Claim,
    pub accident: AccidentDetail,
    pub images: Vec<EvidenceImage>,
    pub incomplete_history: Vec<HistoryEntry>,
    pub resubmitted_history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimSummary {
    pub claim_id: String,
    pub owner_id: String,
    pub asset_id: String,
    pub status: ClaimStatus,
    pub created_at: TimeStamp<Utc>,
    pub updated_at: Option<TimeStamp<Utc>>,
}

impl From<Claim> for ClaimSummary {
    fn from(claim: Claim) -> Self {
        Self {
            claim_id: claim.claim_id,
            owner_id: claim.owner_id,
            asset_id: claim.asset_id,
            status: claim.status,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Scope to one owner; `None` is the admin view over every claim.
    pub owner_id: Option<String>,
    /// Page size; defaults to 100, capped at 200.
    pub limit: Option<usize>,
}

pub struct ClaimQuery {
    store: ClaimStore,
}

impl ClaimQuery {
    pub fn new(store: ClaimStore) -> Self {
        Self { store }
    }

    /// Assemble the full detail view for one claim. With an owner id
    /// the read is scoped: another owner's claim reads as absent.
    pub fn detail(&self, claim_id: &str, owner: Option<&str>) -> Result<ClaimDetail, ClaimError> {
        let claim = self
            .store
            .get_claim(claim_id)?
            .ok_or_else(|| ClaimError::NotFound(claim_id.to_string()))?;

        if let Some(owner) = owner {
            if claim.owner_id != owner {
                return Err(ClaimError::NotFound(claim_id.to_string()));
            }
        }

        // every claim is created with its detail in one transaction, so
        // a missing record here is store corruption, not a 404
        let accident = self
            .store
            .get_detail(&claim.accident_detail_id)?
            .ok_or_else(|| {
                ClaimError::Codec(format!("accident detail missing for claim {claim_id}"))
            })?;

        let images = self.store.get_images(claim_id)?;
        let incomplete_history = history::decode(claim.incomplete_history.as_deref());
        let resubmitted_history = history::decode(claim.resubmitted_history.as_deref());

        Ok(ClaimDetail {
            claim,
            accident,
            images,
            incomplete_history,
            resubmitted_history,
        })
    }

    /// Paged list view, newest first: ordered by last update, falling
    /// back to creation time for claims never touched since submission.
    pub fn list(&self, query: &ListQuery) -> Result<Vec<ClaimSummary>, ClaimError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);

        let mut claims = self.store.list_claims()?;
        if let Some(owner) = &query.owner_id {
            claims.retain(|c| &c.owner_id == owner);
        }
        claims.sort_by_key(|c| std::cmp::Reverse(c.last_touched().to_datetime_utc()));
        claims.truncate(limit);

        Ok(claims.into_iter().map(ClaimSummary::from).collect())
    }
}
