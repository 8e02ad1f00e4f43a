use config::{Config, ConfigError, Environment, File};
use engine::bulk_operations::BulkConfig;
use engine::enhancements::ApiConfig;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "BULKFLOW";

/// Application configuration, layered from `config.toml` (or `--config`)
/// and `BULKFLOW__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    bulk: BulkConfig,
    api: Option<ApiConfig>,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    level: Option<String>,
    file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Some("info".to_string()),
            file: None,
        }
    }
}

impl AppConfig {
    pub fn bulk(&self) -> &BulkConfig {
        &self.bulk
    }

    /// `None` when no `[api]` section was configured.
    pub fn api(&self) -> Option<&ApiConfig> {
        self.api.as_ref()
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

/// Loads `.env`, then the config file, then environment overrides.
///
/// An explicit `path` must exist; the default `config.toml` is optional.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    dotenv::dotenv().ok();

    let file_source = match path {
        Some(path) => File::from(path).required(true),
        None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
    };
    let env_source = Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true);

    Config::builder()
        .add_source(file_source)
        .add_source(env_source)
        .build()?
        .try_deserialize::<AppConfig>()
}
