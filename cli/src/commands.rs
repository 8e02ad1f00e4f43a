use crate::config::AppConfig;
use crate::ids::{read_id_file, validate_location_id};
use anyhow::{Context, Result};
use clap::Args;
use engine::bulk_operations::{
    BulkOperationProcessor, BulkResult, OperationRegistry, ProgressCallback, ProgressTracker,
    ValidationOutcome,
};
use engine::common::HttpError;
use engine::enhancements::{EnhancementBatch, EnhancementClient, location_enhancement_operation};
use serde_json::{Map, Value};
use std::fmt::Write;
use std::path::PathBuf;
use std::time::Duration;

pub type EnhancementResult = BulkResult<String, Value, HttpError>;

#[derive(Debug, Clone, Args)]
pub struct EnhanceArgs {
    /// File with one location id per line
    #[arg(long)]
    pub ids: PathBuf,

    /// Directory the locations are enhanced for
    #[arg(long = "directory")]
    pub directory_name: String,

    #[arg(long)]
    pub user_id: i64,

    /// JSON object stored as the enhancement config of every location
    #[arg(long)]
    pub enhancement_config: Option<String>,

    /// Overrides the default of 5 locations in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Overrides the default 1000ms base retry delay
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// File with one location id per line
    #[arg(long)]
    pub ids: PathBuf,
}

fn processor(config: &AppConfig) -> BulkOperationProcessor {
    BulkOperationProcessor::new(OperationRegistry::new(), config.bulk().clone())
}

fn progress_printer(config: &AppConfig) -> ProgressCallback {
    ProgressTracker::with_throttle(
        |update| println!("Progress: {update}"),
        config.bulk().progress_throttle(),
    )
    .into_callback()
}

pub fn parse_enhancement_config(raw: Option<&str>) -> Result<Map<String, Value>> {
    match raw {
        None => Ok(Map::new()),
        Some(raw) => serde_json::from_str(raw)
            .context("--enhancement-config must be a JSON object"),
    }
}

/// Enhances every location listed in the id file.
pub async fn run_enhance(config: &AppConfig, args: &EnhanceArgs) -> Result<EnhancementResult> {
    let api = config
        .api()
        .context("No [api] section configured; set api.base_url or BULKFLOW__API__BASE_URL")?;
    let location_ids = read_id_file(&args.ids)?;
    let batch = EnhancementBatch {
        directory_name: args.directory_name.clone(),
        user_id: args.user_id,
        enhancement_config: parse_enhancement_config(args.enhancement_config.as_deref())?,
    };

    let client = EnhancementClient::new(api)?;
    let mut operation = location_enhancement_operation(client, location_ids, batch)
        .on_progress(progress_printer(config));
    if let Some(concurrency) = args.concurrency {
        operation = operation.with_concurrency(concurrency);
    }
    if let Some(retry_delay_ms) = args.retry_delay_ms {
        operation = operation.with_retry_delay(Duration::from_millis(retry_delay_ms));
    }

    log::info!(
        "Enhancing {} location(s) for directory '{}'",
        operation.len(),
        args.directory_name
    );
    Ok(processor(config).process(operation).await?)
}

/// Checks the syntax of every location id in the id file.
pub async fn run_validate(config: &AppConfig, args: &ValidateArgs) -> Result<ValidationOutcome<String>> {
    let location_ids = read_id_file(&args.ids)?;
    log::info!("Validating {} location id(s)", location_ids.len());

    let outcome = processor(config)
        .validate_bulk_items(
            location_ids,
            validate_location_id,
            Some(progress_printer(config)),
        )
        .await?;
    Ok(outcome)
}

pub fn render_enhancement_summary(result: &EnhancementResult) -> String {
    let mut out = format!(
        "{} succeeded, {} failed ({:.1}%)\n",
        result.succeeded_count(),
        result.failed_count(),
        result.success_rate
    );
    let mut failed: Vec<_> = result.failed.iter().collect();
    failed.sort_by_key(|record| record.index);
    for record in failed {
        let _ = writeln!(out, "  {}: {}", record.item, record.error);
    }
    out
}

pub fn render_validation_summary(outcome: &ValidationOutcome<String>) -> String {
    let mut out = format!(
        "{} valid, {} invalid\n",
        outcome.valid.len(),
        outcome.invalid.len()
    );
    for invalid in &outcome.invalid {
        let _ = writeln!(out, "  {}: {}", invalid.item, invalid.errors.join("; "));
    }
    out
}
