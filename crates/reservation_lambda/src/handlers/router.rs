use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::handlers::admin::list_reservations;
use crate::handlers::notify::notify_reservation;
use crate::handlers::reservations::{create_reservation, get_reservation_by_id};
use crate::handlers::slots::list_slots;
use crate::handlers::{
    error_response, handler_error_response, success_response, ApiGatewayResponse, AppContext,
    HandlerError,
};
use crate::logging::{log_error, log_warn};
use crate::runtime::contract::{CreateReservationRequest, ListFilter, ValidationError};

const COMPONENT: &str = "api_router";

/// Method, path, query and JSON body lifted out of an API Gateway event.
///
/// Both the REST (v1) and HTTP (v2) payload shapes are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub body: Value,
}

impl ApiRequest {
    pub fn from_event(event: &Value) -> Result<Self, ValidationError> {
        let Some(object) = event.as_object() else {
            return Err(ValidationError::new("Request payload must be a JSON object"));
        };

        let method = object
            .get("httpMethod")
            .and_then(Value::as_str)
            .or_else(|| event.pointer("/requestContext/http/method").and_then(Value::as_str))
            .map(str::to_ascii_uppercase)
            .ok_or_else(|| ValidationError::new("Request method is missing"))?;

        let path = object
            .get("path")
            .and_then(Value::as_str)
            .or_else(|| object.get("rawPath").and_then(Value::as_str))
            .or_else(|| event.pointer("/requestContext/http/path").and_then(Value::as_str))
            .ok_or_else(|| ValidationError::new("Request path is missing"))?
            .to_string();

        let query: BTreeMap<String, String> = object
            .get("queryStringParameters")
            .and_then(Value::as_object)
            .map(|params| {
                params
                    .iter()
                    .filter_map(|(name, value)| {
                        value.as_str().map(|text| (name.clone(), text.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let base64_encoded = object
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let body = decode_body(object.get("body"), base64_encoded)?;

        Ok(Self {
            method,
            path,
            query,
            body,
        })
    }

    fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    fn segments(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

fn decode_body(body: Option<&Value>, base64_encoded: bool) -> Result<Value, ValidationError> {
    match body {
        None | Some(Value::Null) => Ok(json!({})),
        Some(Value::Object(_)) => Ok(body.cloned().unwrap_or_default()),
        Some(Value::String(text)) => {
            let text = if base64_encoded {
                let bytes = STANDARD
                    .decode(text.trim())
                    .map_err(|error| ValidationError::new(format!("Malformed base64 body: {error}")))?;
                String::from_utf8(bytes)
                    .map_err(|error| ValidationError::new(format!("Body is not UTF-8: {error}")))?
            } else {
                text.clone()
            };
            if text.trim().is_empty() {
                return Ok(json!({}));
            }
            serde_json::from_str(&text)
                .map_err(|error| ValidationError::new(format!("Malformed JSON body: {error}")))
        }
        Some(_) => Err(ValidationError::new("Request body must be a JSON object")),
    }
}

/// Dispatches one API Gateway event to its handler.
pub fn route(event: Value, ctx: &AppContext<'_>) -> ApiGatewayResponse {
    let request = match ApiRequest::from_event(&event) {
        Ok(value) => value,
        Err(error) => return handler_error_response(&HandlerError::from(error)),
    };

    let response = match (request.method.as_str(), request.segments().as_slice()) {
        ("GET", ["slots"]) => {
            let date = match request.query_param("date").map(str::trim) {
                Some(value) if !value.is_empty() => value.to_string(),
                _ => ctx
                    .clock
                    .now()
                    .with_timezone(&ctx.schedule.offset)
                    .date_naive()
                    .to_string(),
            };
            list_slots(ctx.store, &date, ctx.schedule).map(|slots| success_response(200, slots))
        }
        ("POST", ["reservations"]) => {
            match serde_json::from_value::<CreateReservationRequest>(request.body.clone()) {
                Ok(payload) => {
                    create_reservation(ctx, payload).map(|record| success_response(201, record))
                }
                Err(error) => Err(HandlerError::from(ValidationError::new(format!(
                    "Malformed request: {error}"
                )))),
            }
        }
        ("GET", ["reservations", id]) => {
            get_reservation_by_id(ctx.store, Some(*id)).and_then(|record| match record {
                Some(value) => Ok(success_response(200, value)),
                None => Err(HandlerError::NotFound {
                    what: "reservation",
                    id: id.trim().to_string(),
                }),
            })
        }
        ("GET", ["admin", "reservations"]) => {
            let filter = ListFilter {
                date: request.query_param("date").map(str::to_string),
                from: request.query_param("from").map(str::to_string),
                to: request.query_param("to").map(str::to_string),
            };
            list_reservations(ctx.store, ctx.clock, filter, request.query_param("prefix"))
                .map(|listing| success_response(200, listing))
        }
        ("POST", ["notify"]) => {
            let id = request.body.get("id").and_then(Value::as_str);
            notify_reservation(ctx, id).map(|outcome| {
                if outcome.ok {
                    success_response(200, outcome)
                } else {
                    error_response(
                        502,
                        json!({
                            "ok": false,
                            "error": "notify_failed",
                            "id": outcome.id,
                            "message": outcome.error,
                        }),
                    )
                }
            })
        }
        _ => {
            log_warn(
                COMPONENT,
                "route_not_found",
                json!({ "method": &request.method, "path": &request.path }),
            );
            return error_response(
                404,
                json!({
                    "error": "route_not_found",
                    "message": format!("no route for {} {}", request.method, request.path),
                }),
            );
        }
    };

    response.unwrap_or_else(|error| {
        if error.status_code() >= 500 {
            log_error(
                COMPONENT,
                "request_failed",
                json!({
                    "method": &request.method,
                    "path": &request.path,
                    "error": error.to_string(),
                }),
            );
        }
        handler_error_response(&error)
    })
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::adapters::clock::{FixedClock, SequenceIdGenerator};
    use crate::adapters::kv_store::KvStore;
    use crate::adapters::memory_store::MemoryKvStore;
    use crate::adapters::notifier::NoopNotifier;
    use crate::runtime::slots::DailySchedule;

    fn dispatch(store: &dyn KvStore, event: Value) -> ApiGatewayResponse {
        // 2025-01-09T16:00Z is already 2025-01-10 at +09:00.
        let clock = FixedClock(
            Utc.with_ymd_and_hms(2025, 1, 9, 16, 0, 0)
                .single()
                .expect("valid instant"),
        );
        let ids = SequenceIdGenerator::new("rsv");
        let schedule = DailySchedule::default();
        let ctx = AppContext {
            store,
            notifier: &NoopNotifier,
            clock: &clock,
            ids: &ids,
            schedule: &schedule,
        };
        route(event, &ctx)
    }

    #[test]
    fn parses_rest_event_with_base64_body() {
        let event = json!({
            "httpMethod": "post",
            "path": "/reservations",
            "queryStringParameters": {"a": "1", "b": null},
            "isBase64Encoded": true,
            "body": STANDARD.encode(r#"{"slotId":"S1"}"#),
        });

        let request = ApiRequest::from_event(&event).expect("request");
        assert_eq!(request.method, "POST");
        assert_eq!(request.query.len(), 1);
        assert_eq!(request.body, json!({"slotId": "S1"}));
    }

    #[test]
    fn parses_http_api_event() {
        let event = json!({
            "rawPath": "/admin/reservations",
            "requestContext": {"http": {"method": "GET", "path": "/admin/reservations"}},
            "queryStringParameters": {"from": "2025-01-01"},
        });

        let request = ApiRequest::from_event(&event).expect("request");
        assert_eq!(request.method, "GET");
        assert_eq!(request.segments(), ["admin", "reservations"]);
        assert_eq!(request.body, json!({}));
    }

    #[test]
    fn malformed_body_is_a_validation_error() {
        let response = dispatch(
            &MemoryKvStore::new(),
            json!({"httpMethod": "POST", "path": "/reservations", "body": "{nope"}),
        );
        assert_eq!(response.status_code, 400);
        assert_eq!(response.json_body()["error"], "validation_error");
    }

    #[test]
    fn slots_default_to_today_in_local_offset() {
        let response = dispatch(
            &MemoryKvStore::new(),
            json!({"httpMethod": "GET", "path": "/slots"}),
        );

        assert_eq!(response.status_code, 200);
        let body = response.json_body();
        assert_eq!(body["date"], "2025-01-10");
        assert_eq!(body["slots"][0]["id"], "S-2025-01-10-1");
    }

    #[test]
    fn create_returns_created_record() {
        let store = MemoryKvStore::new();
        let response = dispatch(
            &store,
            json!({
                "httpMethod": "POST",
                "path": "/reservations",
                "body": r#"{"slotId":"S-2025-01-10-1","name":"Yui"}"#,
            }),
        );

        assert_eq!(response.status_code, 201);
        let body = response.json_body();
        assert_eq!(body["id"], "rsv-1");
        assert_eq!(body["date"], "2025-01-10");
        assert_eq!(body["name"], "Yui");
        assert_eq!(body["status"], "reserved");
        assert_eq!(
            store.get_json("reservation:rsv-1").expect("read"),
            Some(body)
        );
    }

    #[test]
    fn unknown_reservation_is_not_found() {
        let response = dispatch(
            &MemoryKvStore::new(),
            json!({"httpMethod": "GET", "path": "/reservations/missing"}),
        );
        assert_eq!(response.status_code, 404);
        assert_eq!(response.json_body()["error"], "not_found");
    }

    #[test]
    fn unknown_route_is_reported() {
        let response = dispatch(
            &MemoryKvStore::new(),
            json!({"httpMethod": "DELETE", "path": "/reservations/rsv-1"}),
        );
        assert_eq!(response.status_code, 404);
        assert_eq!(response.json_body()["error"], "route_not_found");
    }

    #[test]
    fn notify_requires_an_id() {
        let response = dispatch(
            &MemoryKvStore::new(),
            json!({"httpMethod": "POST", "path": "/notify", "body": {}}),
        );
        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.json_body(),
            json!({"error": "validation_error", "message": "id is required"})
        );
    }
}
