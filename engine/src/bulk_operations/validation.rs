use super::processor::BulkOperationProcessor;
use super::types::{BulkOperation, ProgressCallback};
use crate::common::BulkError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Verdict of a validator for one item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }

    /// Valid exactly when `errors` is empty.
    pub fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self::valid()
        } else {
            Self::invalid(errors)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidItem<T> {
    pub item: T,
    pub errors: Vec<String>,
}

/// Items partitioned by their validation verdict, each list in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome<T> {
    pub valid: Vec<T>,
    pub invalid: Vec<InvalidItem<T>>,
}

impl<T> ValidationOutcome<T> {
    pub fn total(&self) -> usize {
        self.valid.len() + self.invalid.len()
    }

    pub fn all_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

#[derive(Debug)]
struct Partition<T> {
    valid: Vec<(usize, T)>,
    invalid: Vec<(usize, InvalidItem<T>)>,
}

impl<T> Partition<T> {
    fn into_outcome(mut self) -> ValidationOutcome<T> {
        self.valid.sort_by_key(|(index, _)| *index);
        self.invalid.sort_by_key(|(index, _)| *index);
        ValidationOutcome {
            valid: self.valid.into_iter().map(|(_, item)| item).collect(),
            invalid: self.invalid.into_iter().map(|(_, item)| item).collect(),
        }
    }
}

impl BulkOperationProcessor {
    /// Runs `validator` over every item and partitions them into valid and
    /// invalid.
    ///
    /// Uses the configured validation concurrency (default 10) and no retries.
    /// A validator that fails for an item puts that item in `invalid` with the
    /// error message as its only error.
    pub async fn validate_bulk_items<T, F, Fut, E>(
        &self,
        items: Vec<T>,
        validator: F,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ValidationOutcome<T>, BulkError>
    where
        T: Clone + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ValidationReport, E>> + Send + 'static,
        E: Display + 'static,
    {
        let partition = Arc::new(Mutex::new(Partition {
            valid: Vec::new(),
            invalid: Vec::new(),
        }));
        let on_valid = partition.clone();
        let on_failed = partition.clone();

        let mut operation = BulkOperation::new(
            format!("validation_bulk_{}", Uuid::new_v4()),
            items,
            validator,
        )
        .with_concurrency(self.config().validation_concurrency())
        .with_retry_attempts(0)
        .with_retry_delay(Duration::ZERO)
        .on_item_complete(move |item: &T, report: &ValidationReport, index| {
            let mut partition = on_valid.lock().unwrap_or_else(|p| p.into_inner());
            if report.is_valid {
                partition.valid.push((index, item.clone()));
            } else {
                partition.invalid.push((
                    index,
                    InvalidItem {
                        item: item.clone(),
                        errors: report.errors.clone(),
                    },
                ));
            }
        })
        .on_item_error(move |item: &T, error: &E, index| {
            let mut partition = on_failed.lock().unwrap_or_else(|p| p.into_inner());
            partition.invalid.push((
                index,
                InvalidItem {
                    item: item.clone(),
                    errors: vec![error.to_string()],
                },
            ));
        });
        if let Some(on_progress) = on_progress {
            operation = operation.on_progress(on_progress);
        }

        let result = self.process(operation).await?;
        log::info!(
            "Bulk validation finished: {} of {} items processed without validator errors",
            result.succeeded_count(),
            result.total
        );

        let partition = match Arc::try_unwrap(partition) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|p| p.into_inner()),
            Err(shared) => {
                let mut guard = shared.lock().unwrap_or_else(|p| p.into_inner());
                Partition {
                    valid: std::mem::take(&mut guard.valid),
                    invalid: std::mem::take(&mut guard.invalid),
                }
            }
        };
        Ok(partition.into_outcome())
    }
}
