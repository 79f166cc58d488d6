use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const RESERVATION_STATUS_RESERVED: &str = "reserved";
pub const DEFAULT_RESERVATION_SOURCE: &str = "web";
pub const DEFAULT_CUSTOMER_NAME: &str = "ゲスト";
pub const RESERVATION_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;

/// Canonical reservation derived from an arbitrary stored value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub slot_id: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
}

/// Bookable window. Fields beyond the required five are carried through
/// untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub id: String,
    pub start: String,
    pub end: String,
    pub capacity: u32,
    pub remaining: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Record persisted by the booking path.
///
/// `date` is carried explicitly so later readers never have to recover it
/// from the slot identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredReservation {
    pub id: String,
    pub slot_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_id: Option<String>,
    pub source: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[serde(default, alias = "slot_id")]
    pub slot_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "menu_id")]
    pub menu_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Booking input after trimming and defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReservationRequest {
    pub slot_id: String,
    pub date: Option<String>,
    pub menu_id: Option<String>,
    pub source: String,
    pub name: String,
    pub phone: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListFilter {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl ListFilter {
    /// Drops blank bounds so `?date=` behaves like an absent parameter.
    pub fn normalized(self) -> Self {
        Self {
            date: non_blank(self.date),
            from: non_blank(self.from),
            to: non_blank(self.to),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReservationListing {
    pub items: Vec<Reservation>,
    pub count: usize,
    pub prefix: Option<String>,
}

impl ReservationListing {
    pub fn new(items: Vec<Reservation>, prefix: Option<String>) -> Self {
        Self {
            count: items.len(),
            items,
            prefix,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_request(
    payload: CreateReservationRequest,
) -> Result<ValidatedReservationRequest, ValidationError> {
    let Some(slot_id) = non_blank(payload.slot_id) else {
        return Err(ValidationError::new("slotId is required"));
    };

    let date = match non_blank(payload.date) {
        Some(value) => Some(crate::slots::parse_booking_date(&value)?.to_string()),
        None => None,
    };

    Ok(ValidatedReservationRequest {
        slot_id,
        date,
        menu_id: non_blank(payload.menu_id),
        source: non_blank(payload.source)
            .unwrap_or_else(|| DEFAULT_RESERVATION_SOURCE.to_string()),
        name: non_blank(payload.name).unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string()),
        phone: non_blank(payload.phone),
        note: non_blank(payload.note),
    })
}

pub fn require_identifier(id: Option<&str>) -> Result<String, ValidationError> {
    match id.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ValidationError::new("id is required")),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
