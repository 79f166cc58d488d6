#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use reservation_lambda::adapters::clock::{ManualClock, SequenceIdGenerator};
use reservation_lambda::adapters::memory_store::MemoryKvStore;
use reservation_lambda::adapters::notifier::Notifier;
use reservation_lambda::handlers::router::route;
use reservation_lambda::handlers::{ApiGatewayResponse, AppContext};
use reservation_lambda::runtime::slots::DailySchedule;
use serde_json::{json, Value};

pub fn booking_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 5, 9, 30, 0)
        .single()
        .expect("valid instant")
}

/// In-memory service wired the way the Lambda binary wires it.
pub struct TestApi<N: Notifier> {
    pub clock: Arc<ManualClock>,
    pub store: MemoryKvStore,
    pub notifier: N,
    pub ids: SequenceIdGenerator,
    pub schedule: DailySchedule,
}

impl<N: Notifier> TestApi<N> {
    pub fn new(notifier: N) -> Self {
        let clock = Arc::new(ManualClock::starting_at(booking_instant()));
        Self {
            store: MemoryKvStore::with_clock(clock.clone()),
            clock,
            notifier,
            ids: SequenceIdGenerator::new("rsv"),
            schedule: DailySchedule::default(),
        }
    }

    pub fn call(&self, event: Value) -> ApiGatewayResponse {
        let ctx = AppContext {
            store: &self.store,
            notifier: &self.notifier,
            clock: self.clock.as_ref(),
            ids: &self.ids,
            schedule: &self.schedule,
        };
        route(event, &ctx)
    }
}

/// REST (v1) proxy event with a string body.
pub fn rest_event(method: &str, path: &str, query: Value, body: Option<Value>) -> Value {
    json!({
        "httpMethod": method,
        "path": path,
        "queryStringParameters": query,
        "body": body.map(|value| value.to_string()),
        "isBase64Encoded": false,
    })
}

/// HTTP API (v2) event.
pub fn http_api_event(method: &str, path: &str, query: Value) -> Value {
    json!({
        "version": "2.0",
        "rawPath": path,
        "requestContext": {"http": {"method": method, "path": path}},
        "queryStringParameters": query,
    })
}
