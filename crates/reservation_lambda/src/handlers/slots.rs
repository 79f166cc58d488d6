use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::json;

use crate::adapters::kv_store::KvStore;
use crate::handlers::HandlerError;
use crate::logging::log_warn;
use crate::runtime::contract::Slot;
use crate::runtime::slots::{parse_booking_date, parse_persisted_slots, synthesize_slots, DailySchedule};
use crate::runtime::storage_keys::slots_key;

const COMPONENT: &str = "slot_registry";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LabeledSlot {
    #[serde(flatten)]
    pub slot: Slot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlotListResponse {
    pub date: String,
    pub slots: Vec<LabeledSlot>,
}

/// Persisted slots for `date`, or the synthesized daily schedule.
///
/// Read-only: a synthesized set is never written back.
pub fn resolve_slots(
    store: &dyn KvStore,
    date: &str,
    schedule: &DailySchedule,
) -> Result<Vec<Slot>, HandlerError> {
    let date = parse_booking_date(date)?;
    let key = slots_key(&date.to_string());

    if let Some(value) = store.get_json(&key)? {
        match parse_persisted_slots(&value) {
            Some(slots) => return Ok(slots),
            None => log_warn(
                COMPONENT,
                "persisted_slots_malformed",
                json!({ "key": key }),
            ),
        }
    }

    Ok(synthesize_slots(date, schedule))
}

pub fn slot_label(slot: &Slot, offset: &FixedOffset) -> Option<String> {
    format_time_range(&slot.start, &slot.end, offset)
}

/// `HH:mm〜HH:mm` in `offset`; `None` when either bound is not RFC 3339.
pub fn format_time_range(start: &str, end: &str, offset: &FixedOffset) -> Option<String> {
    let start = DateTime::parse_from_rfc3339(start).ok()?;
    let end = DateTime::parse_from_rfc3339(end).ok()?;
    Some(format!(
        "{}〜{}",
        start.with_timezone(offset).format("%H:%M"),
        end.with_timezone(offset).format("%H:%M")
    ))
}

pub fn list_slots(
    store: &dyn KvStore,
    date: &str,
    schedule: &DailySchedule,
) -> Result<SlotListResponse, HandlerError> {
    let slots = resolve_slots(store, date, schedule)?
        .into_iter()
        .map(|slot| LabeledSlot {
            label: slot_label(&slot, &schedule.offset),
            slot,
        })
        .collect();

    Ok(SlotListResponse {
        date: date.trim().to_string(),
        slots,
    })
}
