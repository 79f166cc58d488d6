//! Environment-driven runtime configuration.

use chrono::FixedOffset;
use thiserror::Error;

use crate::runtime::slots::{
    DailySchedule, DEFAULT_SLOT_CAPACITY, DEFAULT_SLOT_DURATION_MINUTES, DEFAULT_SLOT_START_HOURS,
    DEFAULT_UTC_OFFSET_MINUTES,
};

pub const KV_BACKEND_VAR: &str = "KV_BACKEND";
pub const BUCKET_VAR: &str = "RESERVATION_BUCKET";
pub const PREFIX_VAR: &str = "RESERVATION_PREFIX";
pub const TZ_OFFSET_VAR: &str = "RESERVATION_TZ_OFFSET_MINUTES";
pub const SLOT_HOURS_VAR: &str = "RESERVATION_SLOT_HOURS";
pub const SLOT_MINUTES_VAR: &str = "RESERVATION_SLOT_MINUTES";
pub const LINE_TOKEN_VAR: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const LINE_TO_VAR: &str = "LINE_NOTIFY_TO";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvBackend {
    S3 { bucket: String, prefix: String },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConfig {
    pub channel_access_token: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub backend: KvBackend,
    pub schedule: DailySchedule,
    pub line: Option<LineConfig>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend = match var(KV_BACKEND_VAR).as_deref() {
            None | Some("s3") => KvBackend::S3 {
                bucket: var(BUCKET_VAR).ok_or(ConfigError::Missing(BUCKET_VAR))?,
                prefix: var(PREFIX_VAR).unwrap_or_default(),
            },
            Some("memory") => KvBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: KV_BACKEND_VAR,
                    value: other.to_string(),
                    reason: "expected 's3' or 'memory'".to_string(),
                })
            }
        };

        let offset_minutes = match var(TZ_OFFSET_VAR) {
            Some(value) => parse_number::<i32>(TZ_OFFSET_VAR, &value)?,
            None => DEFAULT_UTC_OFFSET_MINUTES,
        };
        let offset = FixedOffset::east_opt(offset_minutes.saturating_mul(60)).ok_or_else(|| {
            ConfigError::Invalid {
                var: TZ_OFFSET_VAR,
                value: offset_minutes.to_string(),
                reason: "offset must be within +/-24h".to_string(),
            }
        })?;

        let start_hours = match var(SLOT_HOURS_VAR) {
            Some(value) => parse_hours(&value)?,
            None => DEFAULT_SLOT_START_HOURS.to_vec(),
        };
        let duration_minutes = match var(SLOT_MINUTES_VAR) {
            Some(value) => parse_number::<u32>(SLOT_MINUTES_VAR, &value)?,
            None => DEFAULT_SLOT_DURATION_MINUTES,
        };
        if duration_minutes == 0 {
            return Err(ConfigError::Invalid {
                var: SLOT_MINUTES_VAR,
                value: "0".to_string(),
                reason: "slot duration must be positive".to_string(),
            });
        }

        let line = match (var(LINE_TOKEN_VAR), var(LINE_TO_VAR)) {
            (Some(channel_access_token), Some(to)) => Some(LineConfig {
                channel_access_token,
                to,
            }),
            (Some(_), None) => return Err(ConfigError::Missing(LINE_TO_VAR)),
            (None, _) => None,
        };

        Ok(Self {
            backend,
            schedule: DailySchedule {
                start_hours,
                duration_minutes,
                capacity: DEFAULT_SLOT_CAPACITY,
                offset,
            },
            line,
        })
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|error| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: error.to_string(),
    })
}

fn parse_hours(value: &str) -> Result<Vec<u32>, ConfigError> {
    let hours = value
        .split(',')
        .map(|part| parse_number::<u32>(SLOT_HOURS_VAR, part.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    if hours.is_empty() || hours.iter().any(|hour| *hour > 23) {
        return Err(ConfigError::Invalid {
            var: SLOT_HOURS_VAR,
            value: value.to_string(),
            reason: "hours must be a comma-separated list within 0..=23".to_string(),
        });
    }
    Ok(hours)
}
