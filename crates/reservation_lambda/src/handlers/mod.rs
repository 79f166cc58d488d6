use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::adapters::clock::{Clock, IdGenerator};
use crate::adapters::kv_store::{KvStore, StoreError};
use crate::adapters::notifier::Notifier;
use crate::runtime::contract::ValidationError;
use crate::runtime::slots::DailySchedule;

pub mod admin;
pub mod notify;
pub mod reservations;
pub mod router;
pub mod slots;

/// Collaborators shared by every request handler.
pub struct AppContext<'a> {
    pub store: &'a dyn KvStore,
    pub notifier: &'a dyn Notifier,
    pub clock: &'a dyn Clock,
    pub ids: &'a dyn IdGenerator,
    pub schedule: &'a DailySchedule,
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl HandlerError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound { .. } => 404,
            Self::Store(_) => 502,
            Self::Serialization { .. } => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Store(_) => "store_unavailable",
            Self::Serialization { .. } => "serialization_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

impl ApiGatewayResponse {
    /// Parses the JSON body; `Value::Null` when it is not JSON.
    pub fn json_body(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

pub(crate) fn success_response(status_code: u16, payload: impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(&payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: json!({"Content-Type": "application/json"}),
            body,
        },
        Err(error) => error_response(
            500,
            json!({
                "error": "serialization_error",
                "message": error.to_string(),
            }),
        ),
    }
}

pub(crate) fn error_response(status_code: u16, payload: Value) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: payload.to_string(),
    }
}

pub(crate) fn handler_error_response(error: &HandlerError) -> ApiGatewayResponse {
    error_response(
        error.status_code(),
        json!({
            "error": error.error_code(),
            "message": error.to_string(),
        }),
    )
}
