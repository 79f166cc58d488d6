use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;

use crate::adapters::kv_store::{KeyEntry, KvStore, PutOptions, StoreError};
use crate::runtime::storage_keys::{logical_key, object_key};

/// Object metadata entry carrying the expiry instant (unix seconds).
pub const EXPIRES_AT_METADATA_KEY: &str = "expires-at";

/// Key-value store over an S3 bucket, one object per key.
///
/// Expiry is recorded as object metadata and enforced on read; pair the
/// bucket with a lifecycle rule to reclaim the objects themselves.
pub struct S3KvStore {
    bucket: String,
    prefix: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3KvStore {
    pub fn new(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        s3_client: aws_sdk_s3::Client,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            s3_client,
        }
    }
}

impl KvStore for S3KvStore {
    fn get_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        let bucket = self.bucket.clone();
        let full_key = object_key(&self.prefix, key);
        let client = self.s3_client.clone();
        let read_error = |message: String| StoreError::Read {
            key: key.to_string(),
            message,
        };

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = match client.get_object().bucket(bucket).key(full_key).send().await {
                    Ok(output) => output,
                    Err(error) => {
                        let missing = error
                            .as_service_error()
                            .map(|service_error| service_error.is_no_such_key())
                            .unwrap_or(false);
                        if missing {
                            return Ok(None);
                        }
                        return Err(read_error(format!("failed to read object from s3: {error}")));
                    }
                };

                let expires_at = output
                    .metadata()
                    .and_then(|metadata| metadata.get(EXPIRES_AT_METADATA_KEY))
                    .and_then(|value| value.parse::<i64>().ok());
                if let Some(expires_at) = expires_at {
                    if Utc::now().timestamp() >= expires_at {
                        return Ok(None);
                    }
                }

                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|error| read_error(format!("failed to read object body: {error}")))?
                    .into_bytes();
                String::from_utf8(bytes.to_vec())
                    .map(Some)
                    .map_err(|error| read_error(format!("object body is not UTF-8: {error}")))
            })
        })
    }

    fn put(&self, key: &str, value: &str, options: PutOptions) -> Result<(), StoreError> {
        let bucket = self.bucket.clone();
        let full_key = object_key(&self.prefix, key);
        let body_bytes = value.as_bytes().to_vec();
        let client = self.s3_client.clone();
        let expires_at = options.expiration_ttl_secs.map(|secs| {
            let ttl = i64::try_from(secs).unwrap_or(i64::MAX);
            Utc::now().timestamp().saturating_add(ttl)
        });

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut request = client
                    .put_object()
                    .bucket(bucket)
                    .key(full_key)
                    .content_type("application/json")
                    .body(ByteStream::from(body_bytes));
                if let Some(expires_at) = expires_at {
                    request = request.metadata(EXPIRES_AT_METADATA_KEY, expires_at.to_string());
                }
                request
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| StoreError::Write {
                        key: key.to_string(),
                        message: format!("failed to write object to s3: {error}"),
                    })
            })
        })
    }

    fn list(&self, prefix: Option<&str>) -> Result<Vec<KeyEntry>, StoreError> {
        let bucket = self.bucket.clone();
        let base_prefix = self.prefix.clone();
        let list_prefix = object_key(&self.prefix, prefix.unwrap_or_default());
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut entries = Vec::new();
                let mut continuation_token: Option<String> = None;
                loop {
                    let page = client
                        .list_objects_v2()
                        .bucket(bucket.clone())
                        .prefix(list_prefix.clone())
                        .set_continuation_token(continuation_token.take())
                        .send()
                        .await
                        .map_err(|error| StoreError::List {
                            message: format!("failed to list objects in s3: {error}"),
                        })?;

                    entries.extend(
                        page.contents()
                            .iter()
                            .filter_map(|object| object.key())
                            .filter_map(|key| logical_key(&base_prefix, key))
                            .map(|name| KeyEntry {
                                name: name.to_string(),
                            }),
                    );

                    match page.next_continuation_token() {
                        Some(token) if page.is_truncated().unwrap_or(false) => {
                            continuation_token = Some(token.to_string());
                        }
                        _ => break,
                    }
                }
                Ok(entries)
            })
        })
    }
}
