//! Core claim records and request payload types
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Review status of a claim. Exactly these four values are ever persisted.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Rejected,
    #[n(3)]
    Incomplete,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Incomplete => "incomplete",
        }
    }

    /// Approved and rejected claims accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

// The history ledgers are JSON columns, so the timestamp also needs a
// serde codec. Same wire shape as the CBOR impl: i64 nanoseconds.
impl Serialize for TimeStamp<Utc> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.timestamp_nanos_opt() {
            Some(nsec) => serializer.serialize_i64(nsec),
            None => Err(serde::ser::Error::custom(
                "failed to encode timestamp. timestamp_nanos_opt returned None",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for TimeStamp<Utc> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let nsecs = i64::deserialize(deserializer)?;
        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// The aggregate root. One record per submitted claim; the two history
/// columns hold serialized JSON arrays managed by the history codec.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    #[n(0)]
    pub claim_id: String,
    #[n(1)]
    pub owner_id: String,
    #[n(2)]
    pub asset_id: String,
    // the insured-asset reference may be swapped once before first review
    #[n(3)]
    pub asset_reattached: bool,
    #[n(4)]
    pub accident_detail_id: String,
    #[n(5)]
    pub status: ClaimStatus,
    // reviewer-facing note, overwritten on each negative transition
    #[n(6)]
    pub admin_note: Option<String>,
    #[n(7)]
    pub approved_by: Option<String>,
    #[n(8)]
    pub approved_at: Option<TimeStamp<Utc>>,
    #[n(9)]
    pub rejected_by: Option<String>,
    #[n(10)]
    pub rejected_at: Option<TimeStamp<Utc>>,
    #[n(11)]
    pub incomplete_by: Option<String>,
    #[n(12)]
    pub incomplete_at: Option<TimeStamp<Utc>>,
    #[n(13)]
    pub incomplete_history: Option<String>,
    #[n(14)]
    pub resubmitted_history: Option<String>,
    #[n(15)]
    pub created_at: TimeStamp<Utc>,
    #[n(16)]
    pub updated_at: Option<TimeStamp<Utc>>,
}

impl Claim {
    /// True once any reviewer has acted on the claim.
    pub fn review_started(&self) -> bool {
        self.approved_at.is_some() || self.rejected_at.is_some() || self.incomplete_at.is_some()
    }

    /// Ordering key for list views: last update, falling back to creation.
    pub fn last_touched(&self) -> TimeStamp<Utc> {
        self.updated_at.clone().unwrap_or_else(|| self.created_at.clone())
    }
}

/// Evidence-media reference carried inside the accident description.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    #[n(0)]
    pub url: String,
    #[n(1)]
    pub kind: String,
}

/// One-to-one companion of a claim, replaced wholesale on resubmission.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct AccidentDetail {
    #[n(0)]
    pub detail_id: String,
    #[n(1)]
    pub accident_type: String,
    // date and time are kept as submitted; the engine never parses them
    #[n(2)]
    pub date: String,
    #[n(3)]
    pub time: String,
    #[n(4)]
    pub location_name: String,
    #[n(5)]
    pub lat: Option<f64>,
    #[n(6)]
    pub lng: Option<f64>,
    #[n(7)]
    pub area_type: Option<String>,
    #[n(8)]
    pub description: Option<String>,
    #[n(9)]
    pub media: Vec<MediaRef>,
    #[n(10)]
    pub created_at: TimeStamp<Utc>,
}

/// A damage photo attached to a claim. `side` is an opaque label
/// ("front", "back", compound "front-left", ...) and is not normalized.
/// `annotation` is an opaque payload written by the detection pipeline.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct EvidenceImage {
    #[n(0)]
    pub image_id: String,
    #[n(1)]
    pub url: String,
    #[n(2)]
    pub note: Option<String>,
    #[n(3)]
    pub side: String,
    #[n(4)]
    pub annotation: Option<String>,
}

pub const UNSPECIFIED_SIDE: &str = "unspecified";

// REQUEST PAYLOADS
//
// Every optional field means "not provided, keep the previous value";
// there are no sentinel nulls.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccidentPayload {
    pub accident_type: String,
    pub date: String,
    pub time: String,
    pub location_name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub area_type: Option<String>,
    pub description: Option<String>,
    pub media: Vec<MediaRef>,
}

impl AccidentPayload {
    pub fn new(accident_type: &str) -> Self {
        Self {
            accident_type: accident_type.to_string(),
            ..Self::default()
        }
    }
    pub fn set_occurred(mut self, date: &str, time: &str) -> Self {
        self.date = date.to_string();
        self.time = time.to_string();
        self
    }
    pub fn set_location(mut self, name: &str, lat: f64, lng: f64) -> Self {
        self.location_name = name.to_string();
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }
    pub fn set_area_type(mut self, area_type: &str) -> Self {
        self.area_type = Some(area_type.to_string());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
    pub fn add_media(mut self, url: &str, kind: &str) -> Self {
        self.media.push(MediaRef {
            url: url.to_string(),
            kind: kind.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidencePayload {
    pub url: String,
    pub note: Option<String>,
    pub side: Option<String>,
    pub annotation: Option<String>,
}

impl EvidencePayload {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }
    pub fn set_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
    pub fn set_side(mut self, side: &str) -> Self {
        self.side = Some(side.to_string());
        self
    }
    pub fn set_annotation(mut self, annotation: &str) -> Self {
        self.annotation = Some(annotation.to_string());
        self
    }
}

/// Creation payload for a new claim.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub owner_id: String,
    pub asset_id: String,
    pub accident: AccidentPayload,
    pub images: Vec<EvidencePayload>,
}

impl SubmitRequest {
    pub fn new(owner_id: &str, asset_id: &str, accident: AccidentPayload) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            asset_id: asset_id.to_string(),
            accident,
            images: vec![],
        }
    }
    pub fn add_image(mut self, image: EvidencePayload) -> Self {
        self.images.push(image);
        self
    }
}

/// Reviewer-initiated status change. The timestamp is supplied by the
/// caller and becomes the actor/time marker and the ledger entry time.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    pub status: ClaimStatus,
    pub actor_id: String,
    pub at: TimeStamp<Utc>,
    pub note: Option<String>,
}

impl TransitionRequest {
    pub fn new(status: ClaimStatus, actor_id: &str, at: TimeStamp<Utc>) -> Self {
        Self {
            status,
            actor_id: actor_id.to_string(),
            at,
            note: None,
        }
    }
    pub fn set_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

/// Customer resubmission of an incomplete claim. Replacement payloads
/// are wholesale: a provided accident payload re-points the detail
/// record, a provided image list replaces the full set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResubmitRequest {
    pub owner_id: String,
    pub note: Option<String>,
    pub accident: Option<AccidentPayload>,
    pub images: Option<Vec<EvidencePayload>>,
}

impl ResubmitRequest {
    pub fn new(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            note: None,
            accident: None,
            images: None,
        }
    }
    pub fn set_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
    pub fn replace_accident(mut self, accident: AccidentPayload) -> Self {
        self.accident = Some(accident);
        self
    }
    pub fn replace_images(mut self, images: Vec<EvidencePayload>) -> Self {
        self.images = Some(images);
        self
    }
}
