//! # bulkflow engine
//!
//! Core library for running one asynchronous operation over a large collection
//! of items. Runs are admitted through an operation registry, executed in
//! bounded-concurrency windows with per-item retries, and summarised into a
//! single aggregated result.
//!
//! ## Modules
//!
//! - [`bulk_operations`] - Registry, retry executor, window scheduler, progress tracking
//! - [`enhancements`] - HTTP client and bulk descriptor for location enhancements
//! - [`common`] - Error types and the outgoing request rate limiter

pub mod bulk_operations;
pub mod common;
pub mod enhancements;
