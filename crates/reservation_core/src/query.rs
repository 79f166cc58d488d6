//! Listing over raw store dumps: wrapper extraction, date filtering and the
//! canonical listing order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::contract::{ListFilter, Reservation};
use crate::normalizer::normalize_at;

/// One way of locating a reservation-shaped object inside a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStrategy {
    Raw,
    Wrapped(&'static str),
}

impl CandidateStrategy {
    pub fn extract<'a>(&self, raw: &'a Value) -> Option<&'a Value> {
        match self {
            Self::Raw => Some(raw),
            Self::Wrapped(field) => raw.get(*field).filter(|value| !value.is_null()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Wrapped(field) => *field,
        }
    }
}

pub const CANDIDATE_STRATEGIES: [CandidateStrategy; 5] = [
    CandidateStrategy::Raw,
    CandidateStrategy::Wrapped("reservation"),
    CandidateStrategy::Wrapped("data"),
    CandidateStrategy::Wrapped("payload"),
    CandidateStrategy::Wrapped("body"),
];

/// Normalizes the first candidate of `raw` that yields a reservation.
///
/// A store key contributes at most one reservation.
pub fn reservation_from_record(raw: &Value, key: &str, now: DateTime<Utc>) -> Option<Reservation> {
    CANDIDATE_STRATEGIES.iter().find_map(|strategy| {
        strategy
            .extract(raw)
            .and_then(|candidate| normalize_at(candidate, key, now))
    })
}

pub fn matches_filter(reservation: &Reservation, filter: &ListFilter) -> bool {
    let date = reservation.date.as_str();
    if let Some(exact) = filter.date.as_deref() {
        if date != exact {
            return false;
        }
    }
    if let Some(from) = filter.from.as_deref() {
        if date < from {
            return false;
        }
    }
    if let Some(to) = filter.to.as_deref() {
        if date > to {
            return false;
        }
    }
    true
}

pub fn sort_key(reservation: &Reservation) -> String {
    format!("{}T{}", reservation.date, reservation.start)
}

/// Stable ascending sort by `"<date>T<start>"`.
///
/// Ordinal byte comparison. For well-formed ISO-8601 keys this matches
/// locale collation; for free-form start text it does not.
pub fn sort_reservations(reservations: &mut [Reservation]) {
    reservations.sort_by_cached_key(sort_key);
}

pub fn compare_reservations(left: &Reservation, right: &Reservation) -> Ordering {
    sort_key(left).cmp(&sort_key(right))
}

/// Builds the canonical listing from `(key, value)` pairs in any order.
pub fn build_listing<I>(records: I, filter: &ListFilter, now: DateTime<Utc>) -> Vec<Reservation>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut reservations: Vec<Reservation> = records
        .into_iter()
        .filter_map(|(key, raw)| reservation_from_record(&raw, &key, now))
        .filter(|reservation| matches_filter(reservation, filter))
        .collect();
    sort_reservations(&mut reservations);
    reservations
}
