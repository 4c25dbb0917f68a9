//! Sled-backed ledger store
//!
//! All four logical tables share one keyspace, separated by key
//! namespace prefixes. Records are CBOR. Keeping every record in one
//! tree lets a writer cover claim, detail, image set, and notification
//! with a single serializable transaction.

use crate::claim::{AccidentDetail, Claim, EvidenceImage};
use crate::error::ClaimError;
use crate::notify::Notification;
use sled::transaction::{
    ConflictableTransactionError, TransactionError, TransactionResult, TransactionalTree,
};
use std::path::{Path, PathBuf};

/// Key namespace constants, one per logical table.
pub const CLAIM_PREFIX: &str = "claim/";
pub const DETAIL_PREFIX: &str = "detail/";
pub const IMAGES_PREFIX: &str = "images/";
pub const NOTIFICATION_PREFIX: &str = "ntf/";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ClaimStore {
    db: sled::Db,
}

pub(crate) fn claim_key(claim_id: &str) -> Vec<u8> {
    format!("{CLAIM_PREFIX}{claim_id}").into_bytes()
}

pub(crate) fn detail_key(detail_id: &str) -> Vec<u8> {
    format!("{DETAIL_PREFIX}{detail_id}").into_bytes()
}

// the image set is keyed by owning claim, not per image: the full set
// is always replaced at once
pub(crate) fn images_key(claim_id: &str) -> Vec<u8> {
    format!("{IMAGES_PREFIX}{claim_id}").into_bytes()
}

pub(crate) fn notification_key(notification_id: &str) -> Vec<u8> {
    format!("{NOTIFICATION_PREFIX}{notification_id}").into_bytes()
}

pub(crate) fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, ClaimError> {
    minicbor::to_vec(value).map_err(|e| ClaimError::Codec(e.to_string()))
}

pub(crate) fn decode<'b, T: minicbor::Decode<'b, ()>>(bytes: &'b [u8]) -> Result<T, ClaimError> {
    minicbor::decode(bytes).map_err(|e| ClaimError::Codec(e.to_string()))
}

/// Collapse a sled transaction result: aborts carry our typed error,
/// everything else is a storage failure.
pub(crate) fn unwrap_tx<T>(res: TransactionResult<T, ClaimError>) -> Result<T, ClaimError> {
    res.map_err(|e| match e {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => ClaimError::Storage(err),
    })
}

pub(crate) fn abort<T>(
    err: ClaimError,
) -> Result<T, ConflictableTransactionError<ClaimError>> {
    Err(ConflictableTransactionError::Abort(err))
}

/// Lift a fallible step into a transaction body: failures abort.
pub(crate) fn tx_try<T>(
    res: Result<T, ClaimError>,
) -> Result<T, ConflictableTransactionError<ClaimError>> {
    res.map_err(ConflictableTransactionError::Abort)
}

impl ClaimStore {
    pub fn new(config: &StoreConfig) -> Result<Self, ClaimError> {
        Self::open(&config.data_dir)
    }

    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ClaimError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Drop every record. Test helper.
    pub fn clear(&self) -> Result<(), ClaimError> {
        self.db.clear()?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), ClaimError> {
        self.db.flush()?;
        Ok(())
    }

    pub fn get_claim(&self, claim_id: &str) -> Result<Option<Claim>, ClaimError> {
        match self.db.get(claim_key(claim_id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_detail(&self, detail_id: &str) -> Result<Option<AccidentDetail>, ClaimError> {
        match self.db.get(detail_key(detail_id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// The stored image set for a claim. A claim with no images has no
    /// record at all, which reads back as an empty set.
    pub fn get_images(&self, claim_id: &str) -> Result<Vec<EvidenceImage>, ClaimError> {
        match self.db.get(images_key(claim_id))? {
            Some(bytes) => Ok(decode(&bytes)?),
            None => Ok(vec![]),
        }
    }

    pub fn list_claims(&self) -> Result<Vec<Claim>, ClaimError> {
        let mut claims = Vec::new();
        for item in self.db.scan_prefix(CLAIM_PREFIX.as_bytes()) {
            let (_, value) = item?;
            claims.push(decode(&value)?);
        }
        Ok(claims)
    }

    /// The feed the delivery mechanism reads, newest first.
    pub fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, ClaimError> {
        let mut notifications = Vec::new();
        for item in self.db.scan_prefix(NOTIFICATION_PREFIX.as_bytes()) {
            let (_, value) = item?;
            let notification: Notification = decode(&value)?;
            if notification.user_id == user_id {
                notifications.push(notification);
            }
        }
        notifications.sort_by_key(|n| std::cmp::Reverse(n.created_at.to_datetime_utc()));
        Ok(notifications)
    }

    /// The one permitted notification mutation. Everything else about a
    /// notification row is append-only.
    pub fn mark_notification_read(&self, notification_id: &str) -> Result<Notification, ClaimError> {
        let key = notification_key(notification_id);
        let bytes = self
            .db
            .get(&key)?
            .ok_or_else(|| ClaimError::NotFound(notification_id.to_string()))?;

        let mut notification: Notification = decode(&bytes)?;
        notification.is_read = true;
        self.db.insert(key, encode(&notification)?)?;

        Ok(notification)
    }
}

// TRANSACTIONAL HELPERS
//
// Used inside writer transactions. Codec failures abort the whole
// transaction; sled conflicts propagate and trigger an internal retry.

pub(crate) fn tx_get_claim(
    tx: &TransactionalTree,
    claim_id: &str,
) -> Result<Option<Claim>, ConflictableTransactionError<ClaimError>> {
    match tx.get(claim_key(claim_id))? {
        Some(bytes) => match decode(&bytes) {
            Ok(claim) => Ok(Some(claim)),
            Err(e) => abort(e),
        },
        None => Ok(None),
    }
}

pub(crate) fn tx_put_claim(
    tx: &TransactionalTree,
    claim: &Claim,
) -> Result<(), ConflictableTransactionError<ClaimError>> {
    let bytes = match encode(claim) {
        Ok(bytes) => bytes,
        Err(e) => return abort(e),
    };
    tx.insert(claim_key(&claim.claim_id), bytes)?;
    Ok(())
}

pub(crate) fn tx_put_detail(
    tx: &TransactionalTree,
    detail: &AccidentDetail,
) -> Result<(), ConflictableTransactionError<ClaimError>> {
    let bytes = match encode(detail) {
        Ok(bytes) => bytes,
        Err(e) => return abort(e),
    };
    tx.insert(detail_key(&detail.detail_id), bytes)?;
    Ok(())
}

pub(crate) fn tx_remove_detail(
    tx: &TransactionalTree,
    detail_id: &str,
) -> Result<(), ConflictableTransactionError<ClaimError>> {
    tx.remove(detail_key(detail_id))?;
    Ok(())
}

pub(crate) fn tx_put_images(
    tx: &TransactionalTree,
    claim_id: &str,
    images: &Vec<EvidenceImage>,
) -> Result<(), ConflictableTransactionError<ClaimError>> {
    let bytes = match encode(images) {
        Ok(bytes) => bytes,
        Err(e) => return abort(e),
    };
    tx.insert(images_key(claim_id), bytes)?;
    Ok(())
}

pub(crate) fn tx_put_notification(
    tx: &TransactionalTree,
    notification: &Notification,
) -> Result<(), ConflictableTransactionError<ClaimError>> {
    let bytes = match encode(notification) {
        Ok(bytes) => bytes,
        Err(e) => return abort(e),
    };
    tx.insert(notification_key(&notification.notification_id), bytes)?;
    Ok(())
}
