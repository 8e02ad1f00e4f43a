//! Location id files and the location id syntax check used by `validate`.

use engine::bulk_operations::ValidationReport;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MIN_LOCATION_ID_LEN: usize = 8;
pub const MAX_LOCATION_ID_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum IdFileError {
    #[error("Failed to read id file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Id file '{}' contains no ids", path.display())]
    Empty { path: PathBuf },
}

/// One id per line. Surrounding whitespace is trimmed; blank lines and lines
/// starting with `#` are skipped.
pub fn parse_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_id_file(path: &Path) -> Result<Vec<String>, IdFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| IdFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let ids = parse_ids(&content);
    if ids.is_empty() {
        return Err(IdFileError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(ids)
}

/// Collects every syntax problem with `location_id`.
pub fn location_id_errors(location_id: &str) -> Vec<String> {
    if location_id.is_empty() {
        return vec!["Location id is empty".to_string()];
    }

    let mut errors = Vec::new();
    let len = location_id.chars().count();
    if !(MIN_LOCATION_ID_LEN..=MAX_LOCATION_ID_LEN).contains(&len) {
        errors.push(format!(
            "Location id must be {MIN_LOCATION_ID_LEN} to {MAX_LOCATION_ID_LEN} characters, got {len}"
        ));
    }
    if !location_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push("Location id may only contain ASCII letters and digits".to_string());
    }
    errors
}

/// Validator passed to the bulk validation helper.
pub async fn validate_location_id(location_id: String) -> Result<ValidationReport, Infallible> {
    Ok(ValidationReport::from_errors(location_id_errors(
        &location_id,
    )))
}
