pub mod clock;
pub mod kv_store;
pub mod line_notifier;
pub mod memory_store;
pub mod notifier;
pub mod s3_store;
