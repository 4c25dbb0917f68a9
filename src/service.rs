//! Service layer API for claim workflow operations
//!
//! Every operation here is one business transaction: validate, mutate
//! the claim and its dependent records, append to the relevant ledger,
//! enqueue a notification — committed together or not at all. Reads and
//! writes of the same claim share the transaction, so concurrent calls
//! against one claim serialize and no ledger entry is ever lost.

use crate::claim::{
    AccidentDetail, AccidentPayload, Claim, ClaimStatus, EvidenceImage, EvidencePayload,
    ResubmitRequest, SubmitRequest, TimeStamp, TransitionRequest, UNSPECIFIED_SIDE,
};
use crate::error::ClaimError;
use crate::history::{self, HistoryEntry};
use crate::notify::Notification;
use crate::store::{self, ClaimStore};
use crate::transition::{self, TransitionPayload};
use crate::utils;
use chrono::Utc;

/// Substituted when a customer resubmits without a note. A reviewer
/// must explain a rejection; a customer need not explain a fix.
pub const DEFAULT_RESUBMIT_NOTE: &str = "Resubmitted by the claim owner";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub claim_id: String,
    pub accident_detail_id: String,
    pub images_stored: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResubmitReceipt {
    pub claim_id: String,
    pub accident_detail_id: String,
}

pub struct ClaimService {
    store: ClaimStore,
    // in future we could add a config for review constraints
}

impl ClaimService {
    pub fn new(store: ClaimStore) -> Self {
        Self { store }
    }

    /// Create a new claim in `pending` together with its accident
    /// detail, evidence images, and a "claim received" notification.
    /// All four inserts commit together or none do.
    pub fn submit(&self, req: SubmitRequest) -> Result<SubmitReceipt, ClaimError> {
        if req.owner_id.trim().is_empty() {
            return Err(ClaimError::Validation("owner id is required".into()));
        }
        if req.asset_id.trim().is_empty() {
            return Err(ClaimError::Validation("asset id is required".into()));
        }
        if req.accident.accident_type.trim().is_empty() {
            return Err(ClaimError::Validation(
                "accident payload requires an accident type".into(),
            ));
        }

        let now = TimeStamp::new();
        // ids are minted before the transaction so an internal conflict
        // retry reuses them
        let claim_id = utils::new_claim_id()?;
        let detail = build_detail(utils::new_detail_id()?, &req.accident, now.clone());
        let images = build_images(&req.images)?;
        let notification = Notification::for_submission(&req.owner_id, &claim_id, now.clone())?;

        let claim = Claim {
            claim_id: claim_id.clone(),
            owner_id: req.owner_id.clone(),
            asset_id: req.asset_id.clone(),
            asset_reattached: false,
            accident_detail_id: detail.detail_id.clone(),
            status: ClaimStatus::Pending,
            admin_note: None,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            incomplete_by: None,
            incomplete_at: None,
            incomplete_history: None,
            resubmitted_history: None,
            created_at: now,
            updated_at: None,
        };

        let res = self.store.db().transaction(|tx| {
            store::tx_put_detail(tx, &detail)?;
            store::tx_put_claim(tx, &claim)?;
            if !images.is_empty() {
                store::tx_put_images(tx, &claim.claim_id, &images)?;
            }
            store::tx_put_notification(tx, &notification)?;
            Ok(())
        });
        store::unwrap_tx(res)?;

        tracing::info!(
            claim = %claim_id,
            owner = %req.owner_id,
            images = images.len(),
            "claim submitted"
        );

        Ok(SubmitReceipt {
            claim_id,
            accident_detail_id: detail.detail_id,
            images_stored: images.len(),
        })
    }

    /// Execute one reviewer-initiated status transition atomically.
    /// The claim row is read and validated inside the same transaction
    /// that writes it back, so the ledgers never go stale.
    pub fn transition(&self, claim_id: &str, req: TransitionRequest) -> Result<Claim, ClaimError> {
        // a claim only returns to pending through the customer
        // resubmission path
        if req.status == ClaimStatus::Pending {
            return Err(ClaimError::Validation(
                "a claim returns to pending through resubmission only".into(),
            ));
        }

        let res = self.store.db().transaction(|tx| {
            let claim = match store::tx_get_claim(tx, claim_id)? {
                Some(claim) => claim,
                None => return store::abort(ClaimError::NotFound(claim_id.to_string())),
            };

            let payload = TransitionPayload {
                actor_id: &req.actor_id,
                note: req.note.as_deref(),
            };
            store::tx_try(
                transition::validate(claim.status, req.status, payload)
                    .map_err(ClaimError::from),
            )?;

            let mut updated = claim;
            updated.status = req.status;
            // replace-if-provided: an absent note keeps the previous one
            updated.admin_note = req.note.clone().or(updated.admin_note);
            updated.updated_at = Some(req.at.clone());

            match req.status {
                ClaimStatus::Approved => {
                    updated.approved_by = Some(req.actor_id.clone());
                    updated.approved_at = Some(req.at.clone());
                }
                ClaimStatus::Rejected => {
                    updated.rejected_by = Some(req.actor_id.clone());
                    updated.rejected_at = Some(req.at.clone());
                }
                ClaimStatus::Incomplete => {
                    updated.incomplete_by = Some(req.actor_id.clone());
                    updated.incomplete_at = Some(req.at.clone());

                    // the validator guarantees the note is present here
                    let note = req.note.as_deref().unwrap_or_default();
                    let column = store::tx_try(history::append(
                        updated.incomplete_history.as_deref(),
                        HistoryEntry::new(req.at.clone(), note),
                    ))?;
                    updated.incomplete_history = Some(column);
                }
                // rejected by the guard above
                ClaimStatus::Pending => {}
            }

            store::tx_put_claim(tx, &updated)?;

            let notification = store::tx_try(Notification::for_status(
                &updated.owner_id,
                claim_id,
                req.status,
                req.at.clone(),
            ))?;
            store::tx_put_notification(tx, &notification)?;

            Ok(updated)
        });
        let updated = store::unwrap_tx(res)?;

        tracing::info!(claim = %claim_id, status = %updated.status, "claim transitioned");

        Ok(updated)
    }

    /// Customer resubmission: move an incomplete claim back to pending,
    /// optionally replacing the accident detail wholesale and the full
    /// evidence-image set. Appends to the resubmission ledger.
    pub fn resubmit(
        &self,
        claim_id: &str,
        req: ResubmitRequest,
    ) -> Result<ResubmitReceipt, ClaimError> {
        if req.owner_id.trim().is_empty() {
            return Err(ClaimError::Validation("owner id is required".into()));
        }
        if let Some(accident) = &req.accident {
            if accident.accident_type.trim().is_empty() {
                return Err(ClaimError::Validation(
                    "replacement accident payload requires an accident type".into(),
                ));
            }
        }

        let now = TimeStamp::new();
        let replacement_detail = match &req.accident {
            Some(payload) => Some(build_detail(utils::new_detail_id()?, payload, now.clone())),
            None => None,
        };
        let replacement_images = match &req.images {
            Some(payloads) => Some(build_images(payloads)?),
            None => None,
        };

        let res = self.store.db().transaction(|tx| {
            let claim = match store::tx_get_claim(tx, claim_id)? {
                Some(claim) => claim,
                None => return store::abort(ClaimError::NotFound(claim_id.to_string())),
            };
            // owner scoping: another owner's claim reads as absent
            if claim.owner_id != req.owner_id {
                return store::abort(ClaimError::NotFound(claim_id.to_string()));
            }

            let payload = TransitionPayload {
                actor_id: &req.owner_id,
                note: req.note.as_deref(),
            };
            store::tx_try(
                transition::validate(claim.status, ClaimStatus::Pending, payload)
                    .map_err(ClaimError::from),
            )?;

            let mut updated = claim;
            updated.status = ClaimStatus::Pending;
            updated.updated_at = Some(now.clone());
            // the incomplete marker survives resubmission; it records
            // that a correction round happened, not the live state

            if let Some(detail) = &replacement_detail {
                store::tx_remove_detail(tx, &updated.accident_detail_id)?;
                store::tx_put_detail(tx, detail)?;
                updated.accident_detail_id = detail.detail_id.clone();
            }
            if let Some(images) = &replacement_images {
                // full replacement: the set is one record, so
                // delete-all/insert-all is a single overwrite
                store::tx_put_images(tx, &updated.claim_id, images)?;
            }

            let note = req
                .note
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(DEFAULT_RESUBMIT_NOTE);
            let column = store::tx_try(history::append(
                updated.resubmitted_history.as_deref(),
                HistoryEntry::new(now.clone(), note),
            ))?;
            updated.resubmitted_history = Some(column);

            store::tx_put_claim(tx, &updated)?;

            let notification = store::tx_try(Notification::for_status(
                &updated.owner_id,
                claim_id,
                ClaimStatus::Pending,
                now.clone(),
            ))?;
            store::tx_put_notification(tx, &notification)?;

            Ok(updated)
        });
        let updated = store::unwrap_tx(res)?;

        tracing::info!(claim = %claim_id, owner = %req.owner_id, "claim resubmitted");

        Ok(ResubmitReceipt {
            claim_id: updated.claim_id,
            accident_detail_id: updated.accident_detail_id,
        })
    }

    /// Swap the insured-asset reference. Allowed once per claim, and
    /// only while the claim is pending with no review activity yet.
    pub fn reattach_asset(
        &self,
        claim_id: &str,
        owner_id: &str,
        asset_id: &str,
    ) -> Result<Claim, ClaimError> {
        if asset_id.trim().is_empty() {
            return Err(ClaimError::Validation("asset id is required".into()));
        }

        let now = TimeStamp::new();
        let res = self.store.db().transaction(|tx| {
            let claim = match store::tx_get_claim(tx, claim_id)? {
                Some(claim) => claim,
                None => return store::abort(ClaimError::NotFound(claim_id.to_string())),
            };
            if claim.owner_id != owner_id {
                return store::abort(ClaimError::NotFound(claim_id.to_string()));
            }
            if claim.status != ClaimStatus::Pending || claim.review_started() {
                return store::abort(ClaimError::Validation(
                    "the insured asset can only be reattached before first review".into(),
                ));
            }
            if claim.asset_reattached {
                return store::abort(ClaimError::Validation(
                    "the insured asset has already been reattached once".into(),
                ));
            }

            let mut updated = claim;
            updated.asset_id = asset_id.to_string();
            updated.asset_reattached = true;
            updated.updated_at = Some(now.clone());
            store::tx_put_claim(tx, &updated)?;

            Ok(updated)
        });
        let updated = store::unwrap_tx(res)?;

        tracing::info!(claim = %claim_id, asset = %asset_id, "insured asset reattached");

        Ok(updated)
    }
}

fn build_detail(
    detail_id: String,
    payload: &AccidentPayload,
    created_at: TimeStamp<Utc>,
) -> AccidentDetail {
    AccidentDetail {
        detail_id,
        accident_type: payload.accident_type.clone(),
        date: payload.date.clone(),
        time: payload.time.clone(),
        location_name: payload.location_name.clone(),
        lat: payload.lat,
        lng: payload.lng,
        area_type: payload.area_type.clone(),
        description: payload.description.clone(),
        media: payload.media.clone(),
        created_at,
    }
}

fn build_images(payloads: &[EvidencePayload]) -> Result<Vec<EvidenceImage>, ClaimError> {
    payloads
        .iter()
        .map(|p| {
            if p.url.trim().is_empty() {
                return Err(ClaimError::Validation(
                    "evidence image requires a url".into(),
                ));
            }
            Ok(EvidenceImage {
                image_id: utils::new_image_id()?,
                url: p.url.clone(),
                note: p.note.clone(),
                side: p
                    .side
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| UNSPECIFIED_SIDE.to_string()),
                annotation: p.annotation.clone(),
            })
        })
        .collect()
}
