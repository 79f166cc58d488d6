use chrono::SecondsFormat;
use serde_json::{json, Value};

use crate::adapters::kv_store::{KvStore, PutOptions};
use crate::handlers::slots::resolve_slots;
use crate::handlers::{AppContext, HandlerError};
use crate::logging::log_info;
use crate::runtime::contract::{
    require_identifier, validate_request, CreateReservationRequest, StoredReservation,
    RESERVATION_RETENTION_SECS, RESERVATION_STATUS_RESERVED,
};
use crate::runtime::slots::date_from_fallback_slot_id;
use crate::runtime::storage_keys::reservation_key;

const COMPONENT: &str = "reservation_store";

/// Validates, stamps, and persists a new reservation with a 7-day expiry.
///
/// Slot capacity is not checked or decremented; concurrent bookings of the
/// same slot can both succeed.
pub fn create_reservation(
    ctx: &AppContext<'_>,
    request: CreateReservationRequest,
) -> Result<StoredReservation, HandlerError> {
    let validated = validate_request(request)?;

    let date = validated
        .date
        .clone()
        .or_else(|| date_from_fallback_slot_id(&validated.slot_id));

    let slot = match date.as_deref() {
        Some(day) => resolve_slots(ctx.store, day, ctx.schedule)?
            .into_iter()
            .find(|slot| slot.id == validated.slot_id),
        None => None,
    };

    let record = StoredReservation {
        id: ctx.ids.next_id(),
        slot_id: validated.slot_id,
        date,
        start: slot.as_ref().map(|slot| slot.start.clone()).unwrap_or_default(),
        end: slot.as_ref().map(|slot| slot.end.clone()).unwrap_or_default(),
        menu_id: validated.menu_id,
        source: validated.source,
        name: validated.name,
        phone: validated.phone,
        note: validated.note,
        created_at: ctx
            .clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        status: RESERVATION_STATUS_RESERVED.to_string(),
    };

    let key = reservation_key(&record.id);
    let body = serde_json::to_string(&record).map_err(|source| HandlerError::Serialization {
        what: "reservation",
        source,
    })?;
    ctx.store.put(
        &key,
        &body,
        PutOptions::expiring_in(RESERVATION_RETENTION_SECS),
    )?;

    log_info(
        COMPONENT,
        "reservation_created",
        json!({
            "id": record.id.clone(),
            "slot_id": record.slot_id.clone(),
            "date": record.date.clone(),
            "slot_found": slot.is_some(),
            "source": record.source.clone(),
        }),
    );
    Ok(record)
}

/// Stored record for `id`; `None` when absent or not valid JSON.
pub fn get_reservation_by_id(
    store: &dyn KvStore,
    id: Option<&str>,
) -> Result<Option<Value>, HandlerError> {
    let id = require_identifier(id)?;
    Ok(store.get_json(&reservation_key(&id))?)
}
