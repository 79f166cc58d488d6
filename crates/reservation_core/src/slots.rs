use chrono::{Duration, FixedOffset, NaiveDate, Offset, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::contract::{Slot, ValidationError};

pub const DEFAULT_SLOT_START_HOURS: [u32; 3] = [10, 12, 15];
pub const DEFAULT_SLOT_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_SLOT_CAPACITY: u32 = 1;
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 9 * 60;

const BOOKING_DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed daily schedule used when no slot list is persisted for a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    pub start_hours: Vec<u32>,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub offset: FixedOffset,
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self {
            start_hours: DEFAULT_SLOT_START_HOURS.to_vec(),
            duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            capacity: DEFAULT_SLOT_CAPACITY,
            offset: default_offset(),
        }
    }
}

pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix())
}

pub fn parse_booking_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    let invalid = || ValidationError::new(format!("date must be YYYY-MM-DD, got '{trimmed}'"));
    if trimmed.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(trimmed, BOOKING_DATE_FORMAT).map_err(|_| invalid())
}

pub fn fallback_slot_id(date: NaiveDate, index: usize) -> String {
    format!("S-{}-{index}", date.format(BOOKING_DATE_FORMAT))
}

/// Recovers the date from a generated `S-<YYYY-MM-DD>-<n>` identifier.
///
/// Only used once, when a booking arrives without an explicit date.
pub fn date_from_fallback_slot_id(slot_id: &str) -> Option<String> {
    let rest = slot_id.strip_prefix("S-")?;
    let (date, index) = rest.rsplit_once('-')?;
    if index.is_empty() || !index.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    parse_booking_date(date).ok().map(|parsed| parsed.to_string())
}

pub fn synthesize_slots(date: NaiveDate, schedule: &DailySchedule) -> Vec<Slot> {
    let capacity = schedule.capacity.max(1);
    schedule
        .start_hours
        .iter()
        .filter_map(|hour| date.and_hms_opt(*hour, 0, 0))
        .filter_map(|local| schedule.offset.from_local_datetime(&local).single())
        .enumerate()
        .map(|(index, start)| {
            let end = start + Duration::minutes(i64::from(schedule.duration_minutes));
            Slot {
                id: fallback_slot_id(date, index + 1),
                start: to_iso_instant(start),
                end: to_iso_instant(end),
                capacity,
                remaining: capacity,
                extra: Map::new(),
            }
        })
        .collect()
}

/// Accepts a persisted slot list only when every element is a well-formed slot.
pub fn parse_persisted_slots(value: &Value) -> Option<Vec<Slot>> {
    if !value.is_array() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

fn to_iso_instant(instant: chrono::DateTime<FixedOffset>) -> String {
    instant
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
