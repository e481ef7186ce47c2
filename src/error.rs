//! Error types for sparkify-lake
//!
//! This module defines the error hierarchy for the entire pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Record-level problems (`RecordParse`, `Schema`) are normally counted and
//! skipped by the transformers rather than propagated; storage and
//! configuration errors abort the run.

use thiserror::Error;

/// The main error type for sparkify-lake
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Record Errors
    // ============================================================================
    #[error("Malformed record in {path} at line {line}: {message}")]
    RecordParse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Required field '{field}' is null for table '{table}'")]
    Schema { table: String, field: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage error at '{path}': {message}")]
    Storage {
        path: String,
        message: String,
        transient: bool,
    },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Table '{table}' is incomplete: {message}")]
    PartialWrite { table: String, message: String },

    #[error("Max attempts ({max_attempts}) exceeded for {operation}: {last_error}")]
    RetriesExhausted {
        operation: String,
        max_attempts: u32,
        last_error: String,
    },

    // ============================================================================
    // Arrow/Parquet Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Pipeline Errors
    // ============================================================================
    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a record parse error
    pub fn record_parse(path: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::RecordParse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a schema error for a null required field
    pub fn schema(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Schema {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create a storage error worth retrying
    pub fn transient_storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            transient: true,
        }
    }

    /// Create a partial write error
    pub fn partial_write(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PartialWrite {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a stage failure
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Only storage unavailability is transient. Data errors never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Storage { transient, .. } => *transient,
            Error::ObjectStore(e) => is_transient_store_error(e),
            Error::Io(e) => is_transient_io_error(e),
            _ => false,
        }
    }

    /// Whether this error describes a single bad input record
    pub fn is_record_level(&self) -> bool {
        matches!(self, Error::RecordParse { .. } | Error::Schema { .. })
    }
}

/// Check if an object store error is worth retrying
fn is_transient_store_error(err: &object_store::Error) -> bool {
    !matches!(
        err,
        object_store::Error::NotFound { .. }
            | object_store::Error::InvalidPath { .. }
            | object_store::Error::AlreadyExists { .. }
            | object_store::Error::Precondition { .. }
            | object_store::Error::NotModified { .. }
            | object_store::Error::NotSupported { .. }
            | object_store::Error::NotImplemented
            | object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. }
            | object_store::Error::UnknownConfigurationKey { .. }
    )
}

/// Check if an I/O error is worth retrying
fn is_transient_io_error(err: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        err.kind(),
        ErrorKind::Interrupted
            | ErrorKind::TimedOut
            | ErrorKind::WouldBlock
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionRefused
            | ErrorKind::BrokenPipe
    )
}

/// Result type alias for sparkify-lake
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("input_root");
        assert_eq!(err.to_string(), "Missing required config field: input_root");

        let err = Error::schema("songs", "song_id");
        assert_eq!(
            err.to_string(),
            "Required field 'song_id' is null for table 'songs'"
        );

        let err = Error::record_parse("log_data/a.json", 3, "invalid ts");
        assert_eq!(
            err.to_string(),
            "Malformed record in log_data/a.json at line 3: invalid ts"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::transient_storage("a", "connection reset").is_retryable());
        assert!(Error::Io(std::io::Error::from(std::io::ErrorKind::TimedOut)).is_retryable());
        assert!(Error::ObjectStore(object_store::Error::Generic {
            store: "S3",
            source: "503 Slow Down".into(),
        })
        .is_retryable());

        assert!(!Error::partial_write("songs", "no marker").is_retryable());
        assert!(!Error::ObjectStore(object_store::Error::NotFound {
            path: "a".to_string(),
            source: "gone".into(),
        })
        .is_retryable());
        assert!(!Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied))
            .is_retryable());
        assert!(!Error::record_parse("p", 1, "bad").is_retryable());
        assert!(!Error::config("test").is_retryable());
    }

    #[test]
    fn test_is_record_level() {
        assert!(Error::record_parse("p", 1, "bad").is_record_level());
        assert!(Error::schema("users", "user_id").is_record_level());
        assert!(!Error::transient_storage("p", "down").is_record_level());
    }
}
