//! AWS-oriented adapters and handlers for the reservation service.
//!
//! This crate owns runtime integration details (Lambda handler, API Gateway
//! routing, key-value store and notifier adapters) and exposes a single
//! runtime module boundary for contract, normalization, slot, and storage
//! key primitives.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod runtime;
