use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use crate::adapters::clock::{Clock, SystemClock};
use crate::adapters::kv_store::{KeyEntry, KvStore, PutOptions, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// In-process store with the same expiry semantics as the S3 adapter.
///
/// Used for local invocations and tests; state lives as long as the process.
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            clock,
        }
    }

    /// Writes `value` without expiry, bypassing the JSON text contract.
    pub fn seed(&self, key: &str, value: &serde_json::Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                Entry {
                    text: value.to_string(),
                    expires_at: None,
                },
            );
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Entry>>, String> {
        self.entries
            .lock()
            .map_err(|_| "memory store mutex poisoned".to_string())
    }
}

impl KvStore for MemoryKvStore {
    fn get_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        let entries = self.lock().map_err(|message| StoreError::Read {
            key: key.to_string(),
            message,
        })?;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.text.clone()))
    }

    fn put(&self, key: &str, value: &str, options: PutOptions) -> Result<(), StoreError> {
        let expires_at = match options.expiration_ttl_secs {
            Some(secs) => {
                let ttl = i64::try_from(secs).map_err(|_| StoreError::Write {
                    key: key.to_string(),
                    message: format!("expiration ttl {secs}s is out of range"),
                })?;
                Some(self.clock.now() + Duration::seconds(ttl))
            }
            None => None,
        };

        let mut entries = self.lock().map_err(|message| StoreError::Write {
            key: key.to_string(),
            message,
        })?;
        entries.insert(
            key.to_string(),
            Entry {
                text: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn list(&self, prefix: Option<&str>) -> Result<Vec<KeyEntry>, StoreError> {
        let now = self.clock.now();
        let entries = self.lock().map_err(|message| StoreError::List { message })?;
        Ok(entries
            .iter()
            .filter(|(key, entry)| {
                entry.is_live(now) && prefix.map_or(true, |prefix| key.starts_with(prefix))
            })
            .map(|(key, _)| KeyEntry { name: key.clone() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::adapters::clock::ManualClock;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .expect("valid instant")
    }

    #[test]
    fn expiring_entries_are_readable_until_ttl_elapses() {
        let clock = Arc::new(ManualClock::starting_at(start()));
        let store = MemoryKvStore::with_clock(clock.clone());

        store
            .put("reservation:1", "{\"id\":\"1\"}", PutOptions::expiring_in(60))
            .expect("put should succeed");

        clock.advance(Duration::seconds(59));
        assert_eq!(
            store.get_text("reservation:1").expect("read"),
            Some("{\"id\":\"1\"}".to_string())
        );
        assert_eq!(store.list(None).expect("list").len(), 1);

        clock.advance(Duration::seconds(1));
        assert_eq!(store.get_text("reservation:1").expect("read"), None);
        assert!(store.list(None).expect("list").is_empty());
    }

    #[test]
    fn list_filters_by_prefix_in_key_order() {
        let store = MemoryKvStore::new();
        store.seed("slots:2025-01-02", &json!([]));
        store.seed("reservation:b", &json!({}));
        store.seed("reservation:a", &json!({}));

        let names: Vec<String> = store
            .list(Some("reservation:"))
            .expect("list")
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, ["reservation:a", "reservation:b"]);
        assert_eq!(store.list(None).expect("list").len(), 3);
    }

    #[test]
    fn get_json_treats_unparsable_text_as_absent() {
        let store = MemoryKvStore::new();
        store
            .put("broken", "{not json", PutOptions::default())
            .expect("put should succeed");

        assert_eq!(store.get_json("broken").expect("read"), None);
        assert!(store.get_text("broken").expect("read").is_some());
    }
}
