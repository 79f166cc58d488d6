use serde_json::json;

use crate::adapters::clock::Clock;
use crate::adapters::kv_store::KvStore;
use crate::handlers::HandlerError;
use crate::logging::log_info;
use crate::runtime::contract::{ListFilter, ReservationListing};
use crate::runtime::query::build_listing;

const COMPONENT: &str = "reservation_query";

/// Re-derives canonical reservations from every stored value.
///
/// With `prefix == None` every key in the store is enumerated, since other
/// producers may store reservation-shaped data under any key. Keys whose
/// value vanished or is not JSON contribute nothing. Never writes.
pub fn list_reservations(
    store: &dyn KvStore,
    clock: &dyn Clock,
    filter: ListFilter,
    prefix: Option<&str>,
) -> Result<ReservationListing, HandlerError> {
    let filter = filter.normalized();
    let prefix = prefix.map(str::trim).filter(|value| !value.is_empty());

    let keys = store.list(prefix)?;
    let scanned = keys.len();

    let mut records = Vec::with_capacity(keys.len());
    for entry in keys {
        if let Some(value) = store.get_json(&entry.name)? {
            records.push((entry.name, value));
        }
    }

    let items = build_listing(records, &filter, clock.now());
    log_info(
        COMPONENT,
        "reservations_listed",
        json!({
            "keys_scanned": scanned,
            "reservations": items.len(),
            "prefix": prefix,
            "date": filter.date.clone(),
            "from": filter.from.clone(),
            "to": filter.to.clone(),
        }),
    );

    Ok(ReservationListing::new(items, prefix.map(str::to_string)))
}
