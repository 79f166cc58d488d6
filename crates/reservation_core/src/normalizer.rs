//! Maps loosely-structured stored values onto [`Reservation`].
//!
//! Every field is resolved through an ordered list of [`FieldPath`]
//! accessors; the first accessor that yields a value wins. A candidate is
//! missing when the key is absent or holds `null`. Strings resolve as-is and
//! numbers resolve to their decimal text; booleans, arrays and objects never
//! resolve.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::contract::Reservation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
    Key(&'static str),
    Nested(&'static str, &'static str),
}

impl FieldPath {
    pub fn lookup<'a>(&self, source: &'a Map<String, Value>) -> Option<&'a Value> {
        let value = match self {
            Self::Key(key) => source.get(*key),
            Self::Nested(parent, key) => source.get(*parent)?.as_object()?.get(*key),
        };
        value.filter(|value| !value.is_null())
    }
}

pub const ID_FIELDS: &[FieldPath] = &[FieldPath::Key("id")];

pub const SLOT_ID_FIELDS: &[FieldPath] = &[
    FieldPath::Key("slotId"),
    FieldPath::Key("slot_id"),
    FieldPath::Key("slotID"),
    FieldPath::Nested("slot", "id"),
];

pub const START_FIELDS: &[FieldPath] = &[
    FieldPath::Key("start"),
    FieldPath::Key("startAt"),
    FieldPath::Key("start_at"),
    FieldPath::Key("from"),
    FieldPath::Key("timeStart"),
    FieldPath::Nested("slot", "start"),
];

pub const END_FIELDS: &[FieldPath] = &[
    FieldPath::Key("end"),
    FieldPath::Key("endAt"),
    FieldPath::Key("end_at"),
    FieldPath::Key("to"),
    FieldPath::Key("timeEnd"),
    FieldPath::Nested("slot", "end"),
];

pub const DATE_FIELDS: &[FieldPath] = &[
    FieldPath::Key("date"),
    FieldPath::Key("day"),
    FieldPath::Key("dateStr"),
    FieldPath::Key("bookingDate"),
];

pub const NAME_FIELDS: &[FieldPath] = &[
    FieldPath::Key("name"),
    FieldPath::Key("customerName"),
    FieldPath::Key("userName"),
];

pub const CHANNEL_FIELDS: &[FieldPath] = &[FieldPath::Key("channel"), FieldPath::Key("source")];

pub const NOTE_FIELDS: &[FieldPath] = &[
    FieldPath::Key("note"),
    FieldPath::Key("memo"),
    FieldPath::Key("message"),
];

pub const CREATED_AT_FIELDS: &[FieldPath] = &[
    FieldPath::Key("createdAt"),
    FieldPath::Key("created_at"),
    FieldPath::Key("created"),
];

/// Length, in characters, of the `YYYY-MM-DD` prefix of an ISO-8601 timestamp.
const DATE_PREFIX_CHARS: usize = 10;

/// First ten characters of `start`; `None` when it is shorter.
pub fn date_prefix(start: &str) -> Option<String> {
    let prefix: String = start.chars().take(DATE_PREFIX_CHARS).collect();
    (prefix.chars().count() == DATE_PREFIX_CHARS).then_some(prefix)
}

pub fn normalize(source: &Value, fallback_id: &str) -> Option<Reservation> {
    normalize_at(source, fallback_id, Utc::now())
}

/// Same as [`normalize`] with an explicit instant used for a missing
/// `createdAt`.
pub fn normalize_at(source: &Value, fallback_id: &str, now: DateTime<Utc>) -> Option<Reservation> {
    let object = source.as_object()?;

    let slot_id = resolve_text(object, SLOT_ID_FIELDS).unwrap_or_default();
    let start = resolve_text(object, START_FIELDS).unwrap_or_default();
    let end = resolve_text(object, END_FIELDS).unwrap_or_default();

    let mut date = resolve_text(object, DATE_FIELDS).unwrap_or_default();
    if date.is_empty() {
        if let Some(prefix) = date_prefix(&start) {
            date = prefix;
        }
    }

    if slot_id.is_empty() || date.is_empty() {
        return None;
    }

    let created_at = CREATED_AT_FIELDS
        .iter()
        .filter_map(|path| path.lookup(object).and_then(Value::as_str))
        .chain(std::iter::once(start.as_str()))
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

    let id = resolve_text(object, ID_FIELDS)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| fallback_id.to_string());

    Some(Reservation {
        id,
        slot_id,
        date,
        start,
        end,
        name: resolve_text(object, NAME_FIELDS).unwrap_or_default(),
        channel: resolve_text(object, CHANNEL_FIELDS),
        note: resolve_text(object, NOTE_FIELDS),
        created_at,
    })
}

/// First accessor in `paths` yielding a textual value.
pub fn resolve_text(source: &Map<String, Value>, paths: &[FieldPath]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| path.lookup(source).and_then(value_as_text))
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
