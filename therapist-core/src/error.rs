//! Structured error types for therapist-core.
//!
//! Library consumers get `thiserror` enums; the server binary wraps them
//! in `anyhow` at the top level.

use thiserror::Error;

/// Settings could not be loaded. Always fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required key was absent or blank
    #[error("Missing required setting '{key}'")]
    Missing { key: &'static str },

    /// A key was present but could not be parsed into its declared type
    #[error("Invalid value {value:?} for setting '{key}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// An explicitly requested env file could not be read or parsed
    #[error("Failed to load env file: {source}")]
    EnvFile {
        #[from]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    /// Create a missing-key error
    pub fn missing(key: &'static str) -> Self {
        Self::Missing { key }
    }

    /// Create an invalid-value error
    pub fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// The settings key this error is about, if any
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::Missing { key } | Self::Invalid { key, .. } => Some(key),
            Self::EnvFile { .. } => None,
        }
    }
}

/// Session provider failures.
#[derive(Error, Debug)]
pub enum DbError {
    /// No pooled connection became available within the acquisition timeout
    #[error("Timed out after {timeout_secs}s waiting for a pooled database connection")]
    AcquireTimeout { timeout_secs: u64 },

    /// A liveness check did not finish within its deadline
    #[error("Database did not answer a liveness check within {timeout_ms}ms")]
    CheckTimeout { timeout_ms: u64 },

    /// The pool has been closed (process shutting down)
    #[error("Database pool is closed")]
    PoolClosed,

    /// Anything else reported by the driver (unreachable host, auth, query)
    #[error("Database error: {0}")]
    Connection(#[from] sqlx::Error),
}

impl DbError {
    /// Translate a driver error raised while checking out a connection.
    pub(crate) fn from_acquire(err: sqlx::Error, timeout_secs: u64) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::AcquireTimeout { timeout_secs },
            sqlx::Error::PoolClosed => Self::PoolClosed,
            other => Self::Connection(other),
        }
    }
}
