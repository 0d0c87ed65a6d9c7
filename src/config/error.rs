//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Inactivity window must be at least 60 seconds")]
    InactivityWindowTooShort,

    #[error("History window must hold at least one turn")]
    HistoryWindowTooSmall,

    #[error("Utterance length limit must be nonzero")]
    InvalidUtteranceLimit,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("Cache capacity must be nonzero when the cache is enabled")]
    InvalidCacheCapacity,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid provider base URL")]
    InvalidProviderUrl,

    #[error("Cache TTL must be nonzero when the cache is enabled")]
    InvalidCacheTtl,

    #[error("Session directory must not be empty")]
    EmptySessionDir,
}
