mod support;

use serde_json::{json, Value};

use support::doubles::RecordingNotifier;
use support::harness::{http_api_event, rest_event, TestApi};

fn seeded_api() -> TestApi<RecordingNotifier> {
    let api = TestApi::new(RecordingNotifier::default());
    api.store.seed(
        "reservation:canonical",
        &json!({"id": "canonical", "slotId": "S-2025-02-02-1", "date": "2025-02-02", "start": "2025-02-02T01:00:00.000Z"}),
    );
    api.store.seed(
        "import/7",
        &json!({"payload": {"slotID": 7, "bookingDate": "2025-02-01", "timeStart": "09:00", "userName": "Mei"}}),
    );
    api.store.seed(
        "hook/1",
        &json!({"reservation": {"slot": {"id": "vip", "start": "2025-02-03T00:00:00Z"}}, "data": {"slotId": "ignored", "date": "2025-02-03"}}),
    );
    api.store.seed("slots:2025-02-02", &json!([]));
    api.store.seed("counter", &json!(12));
    api
}

fn ids(listing: &Value) -> Vec<String> {
    listing["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|item| item["id"].as_str().expect("id").to_string())
        .collect()
}

#[test]
fn lists_heterogeneous_records_in_canonical_order() {
    let api = seeded_api();
    let listing = api
        .call(rest_event("GET", "/admin/reservations", json!(null), None))
        .json_body();

    assert_eq!(ids(&listing), ["import/7", "canonical", "hook/1"]);
    assert_eq!(listing["count"], 3);
    assert_eq!(listing["items"][0]["slotId"], "7");
    assert_eq!(listing["items"][0]["name"], "Mei");
    assert_eq!(listing["items"][2]["slotId"], "vip");
}

#[test]
fn range_filters_are_inclusive() {
    let api = seeded_api();
    let listing = api
        .call(http_api_event(
            "GET",
            "/admin/reservations",
            json!({"from": "2025-02-02", "to": "2025-02-03"}),
        ))
        .json_body();

    assert_eq!(ids(&listing), ["canonical", "hook/1"]);
}

#[test]
fn blank_filters_are_ignored_and_prefix_is_echoed() {
    let api = seeded_api();
    let listing = api
        .call(http_api_event(
            "GET",
            "/admin/reservations",
            json!({"date": "", "prefix": "reservation:"}),
        ))
        .json_body();

    assert_eq!(ids(&listing), ["canonical"]);
    assert_eq!(listing["prefix"], "reservation:");
}

#[test]
fn repeated_listing_is_byte_identical() {
    let api = seeded_api();
    let first = api.call(rest_event("GET", "/admin/reservations", json!(null), None));
    let second = api.call(rest_event("GET", "/admin/reservations", json!(null), None));

    assert_eq!(first.body, second.body);
}
