use super::client::{EnhancementClient, EnhancementRequest};
use crate::bulk_operations::BulkOperation;
use crate::common::HttpError;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

pub const ENHANCEMENT_CONCURRENCY: usize = 5;
pub const ENHANCEMENT_RETRY_ATTEMPTS: u32 = 3;
pub const ENHANCEMENT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Fields shared by every enhancement in one bulk run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementBatch {
    pub directory_name: String,
    pub user_id: i64,
    pub enhancement_config: Map<String, Value>,
}

impl EnhancementBatch {
    pub fn request_for(&self, location_id: String) -> EnhancementRequest {
        EnhancementRequest {
            ghl_location_id: location_id,
            directory_name: self.directory_name.clone(),
            user_id: self.user_id,
            enhancement_config: self.enhancement_config.clone(),
            is_active: true,
        }
    }
}

/// Builds the bulk descriptor that enhances every location in
/// `location_ids`: 5 in flight, 3 retries, 1s base backoff.
///
/// The id is `location_enhancement_bulk_<unix millis>`. Callers can still
/// attach callbacks or override the tuning on the returned descriptor.
pub fn location_enhancement_operation(
    client: EnhancementClient,
    location_ids: Vec<String>,
    batch: EnhancementBatch,
) -> BulkOperation<String, Value, HttpError> {
    let batch = Arc::new(batch);
    let id = format!(
        "location_enhancement_bulk_{}",
        chrono::Utc::now().timestamp_millis()
    );

    BulkOperation::new(id, location_ids, move |location_id: String| {
        let client = client.clone();
        let request = batch.request_for(location_id);
        async move { client.create_enhancement(&request).await }
    })
    .with_concurrency(ENHANCEMENT_CONCURRENCY)
    .with_retry_attempts(ENHANCEMENT_RETRY_ATTEMPTS)
    .with_retry_delay(ENHANCEMENT_RETRY_DELAY)
}
