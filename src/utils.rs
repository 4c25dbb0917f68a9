//! Utility functions for id minting

use crate::error::ClaimError;
use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique record id then encode using bech32. uuid7 is
// time-ordered, so ids sort in creation order.
pub fn new_uuid_to_bech32(hrp: &str) -> Result<String, ClaimError> {
    let hrp = bech32::Hrp::parse(hrp)
        .map_err(|e| ClaimError::Validation(format!("invalid id prefix: {e}")))?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())
        .map_err(|e| ClaimError::Validation(format!("failed to encode id: {e}")))?;
    Ok(encode)
}

pub fn new_claim_id() -> Result<String, ClaimError> {
    new_uuid_to_bech32("claim_")
}

pub fn new_detail_id() -> Result<String, ClaimError> {
    new_uuid_to_bech32("acc_")
}

pub fn new_image_id() -> Result<String, ClaimError> {
    new_uuid_to_bech32("img_")
}

pub fn new_notification_id() -> Result<String, ClaimError> {
    new_uuid_to_bech32("ntf_")
}
