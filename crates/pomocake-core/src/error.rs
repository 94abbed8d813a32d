//! Core error types for pomocake-core.
//!
//! Timer operations themselves never fail. These types cover the edges that
//! touch the outside world: configuration files, the statistics store and the
//! notification sink.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomocake-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Statistics store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Statistics store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read statistics from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write statistics to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Statistics file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Notification sink errors. These are logged by the engine and never
/// propagated to callers.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification backend unavailable: {0}")]
    Unavailable(String),

    #[error("Notification failed: {0}")]
    Failed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidValue { field, message } => {
                ConfigError::InvalidValue { key: field, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_into_config_error() {
        let err: ConfigError = ValidationError::InvalidValue {
            field: "schedule.work_minutes".into(),
            message: "must be at least 1".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'schedule.work_minutes': must be at least 1"
        );
    }

    #[test]
    fn storage_error_wraps_into_core() {
        let err: CoreError = StorageError::Corrupt {
            path: PathBuf::from("/tmp/stats.json"),
            message: "trailing data".into(),
        }
        .into();
        assert!(err.to_string().starts_with("Storage error:"));
    }
}
