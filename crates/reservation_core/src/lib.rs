//! Shared reservation domain primitives.
//!
//! This crate owns the canonical reservation shape, record normalization,
//! slot synthesis, and listing order. It intentionally excludes AWS SDK,
//! HTTP, and Lambda runtime concerns; every function here is pure.

pub mod contract;
pub mod normalizer;
pub mod query;
pub mod slots;
pub mod storage_keys;
