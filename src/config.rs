//! Pipeline configuration
//!
//! Configuration is loaded from a YAML file and may be overridden from the
//! command line. Only the storage layer ever looks at `credentials`.

use crate::error::{Error, Result};
use crate::types::{BackoffType, CompressionCodec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Pipeline Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root holding `song_data/` and `log_data/` (local path or object store URL)
    #[serde(default)]
    pub input_root: String,

    /// Root the five tables are written under
    #[serde(default)]
    pub output_root: String,

    /// Glob (relative to `input_root`) matching catalog files
    #[serde(default = "default_song_data_glob")]
    pub song_data_glob: String,

    /// Glob (relative to `input_root`) matching activity log files
    #[serde(default = "default_log_data_glob")]
    pub log_data_glob: String,

    /// Worker threads for table builds (0 = one per core)
    #[serde(default)]
    pub workers: usize,

    /// Records per shard handed to a worker
    #[serde(default = "default_shard_size")]
    pub shard_size: usize,

    /// Storage retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Parquet output settings
    #[serde(default)]
    pub parquet: ParquetConfig,

    /// Object store credentials
    #[serde(default)]
    pub credentials: Credentials,
}

fn default_song_data_glob() -> String {
    "song_data/*/*/*/*.json".to_string()
}

fn default_log_data_glob() -> String {
    "log_data/*/*/*.json".to_string()
}

fn default_shard_size() -> usize {
    4096
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_root: String::new(),
            output_root: String::new(),
            song_data_glob: default_song_data_glob(),
            log_data_glob: default_log_data_glob(),
            workers: 0,
            shard_size: default_shard_size(),
            retry: RetryConfig::default(),
            parquet: ParquetConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a config with the given roots and defaults everywhere else
    pub fn new(input_root: impl Into<String>, output_root: impl Into<String>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.input_root.trim().is_empty() {
            return Err(Error::missing_field("input_root"));
        }
        if self.output_root.trim().is_empty() {
            return Err(Error::missing_field("output_root"));
        }
        if self.song_data_glob.trim().is_empty() {
            return Err(Error::invalid_value("song_data_glob", "must not be empty"));
        }
        if self.log_data_glob.trim().is_empty() {
            return Err(Error::invalid_value("log_data_glob", "must not be empty"));
        }
        if self.shard_size == 0 {
            return Err(Error::invalid_value("shard_size", "must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::invalid_value(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }
        if self.parquet.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Retry Config
// ============================================================================

/// Bounded retry settings for storage I/O
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound on any single delay, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Backoff strategy
    #[serde(default)]
    pub backoff: BackoffType,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff: BackoffType::default(),
        }
    }
}

impl RetryConfig {
    /// Initial delay as a `Duration`
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Maximum delay as a `Duration`
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// ============================================================================
// Parquet Config
// ============================================================================

/// Parquet writer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParquetConfig {
    /// Compression codec
    #[serde(default)]
    pub compression: CompressionCodec,

    /// Maximum rows per row group
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

impl Default for ParquetConfig {
    fn default() -> Self {
        Self {
            compression: CompressionCodec::default(),
            row_group_size: default_row_group_size(),
        }
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Object store credentials
///
/// Any field left unset falls back to the provider's environment variables.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub aws_access_key_id: Option<String>,

    #[serde(default)]
    pub aws_secret_access_key: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible stores (R2, MinIO)
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("aws_access_key_id", &self.aws_access_key_id.as_ref().map(|_| "***"))
            .field(
                "aws_secret_access_key",
                &self.aws_secret_access_key.as_ref().map(|_| "***"),
            )
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new("/in", "/out");
        assert_eq!(config.song_data_glob, "song_data/*/*/*/*.json");
        assert_eq!(config.log_data_glob, "log_data/*/*/*.json");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.parquet.compression, CompressionCodec::Snappy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r"
input_root: s3a://udacity-dend/
output_root: s3://lake/output/
workers: 4
retry:
  max_attempts: 5
  backoff: constant
parquet:
  compression: zstd
credentials:
  aws_access_key_id: AKIA
  aws_secret_access_key: secret
";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.input_root, "s3a://udacity-dend/");
        assert_eq!(config.workers, 4);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 200);
        assert_eq!(config.retry.backoff, BackoffType::Constant);
        assert_eq!(config.parquet.compression, CompressionCodec::Zstd);
        assert_eq!(config.credentials.aws_access_key_id.as_deref(), Some("AKIA"));
    }

    #[test]
    fn test_validate_rejects_missing_roots() {
        let config = PipelineConfig::new("", "/out");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("input_root"));

        let config = PipelineConfig::new("/in", "  ");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output_root"));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = PipelineConfig::new("/in", "/out");
        config.shard_size = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::new("/in", "/out");
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let creds = Credentials {
            aws_access_key_id: Some("AKIA123".to_string()),
            aws_secret_access_key: Some("topsecret".to_string()),
            ..Credentials::default()
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("AKIA123"));
    }
}
