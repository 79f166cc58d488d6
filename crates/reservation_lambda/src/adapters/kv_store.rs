use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read '{key}' from store: {message}")]
    Read { key: String, message: String },
    #[error("failed to write '{key}' to store: {message}")]
    Write { key: String, message: String },
    #[error("failed to list store keys: {message}")]
    List { message: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub expiration_ttl_secs: Option<u64>,
}

impl PutOptions {
    pub fn expiring_in(secs: u64) -> Self {
        Self {
            expiration_ttl_secs: Some(secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    pub name: String,
}

/// Durable string-keyed store holding JSON text.
///
/// Expired entries behave as absent on read. Listing may still report a
/// recently expired or recently written key; readers must tolerate both.
pub trait KvStore: Send + Sync {
    fn get_text(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn put(&self, key: &str, value: &str, options: PutOptions) -> Result<(), StoreError>;

    fn list(&self, prefix: Option<&str>) -> Result<Vec<KeyEntry>, StoreError>;

    /// Reads `key` as JSON; text that fails to parse reads as absent.
    fn get_json(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .get_text(key)?
            .and_then(|text| serde_json::from_str(&text).ok()))
    }
}
