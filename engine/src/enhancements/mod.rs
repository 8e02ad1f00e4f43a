//! Location enhancements: the bulk job the directory builder runs against its
//! backend API.
//!
//! - `client`: HTTP client for `POST /api/location-enhancements`
//! - `operation`: Factory for the bulk descriptor that enhances many locations

pub mod client;
pub mod operation;

pub use client::{ApiConfig, EnhancementClient, EnhancementRequest};
pub use operation::{
    ENHANCEMENT_CONCURRENCY, ENHANCEMENT_RETRY_ATTEMPTS, ENHANCEMENT_RETRY_DELAY,
    EnhancementBatch, location_enhancement_operation,
};
