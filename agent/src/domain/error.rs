//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

use crate::domain::bundle::BundleId;

// ── Bundle errors ─────────────────────────────────────────────────────────────

/// Errors raised by the bundle store for state transitions it refuses.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle {0} is not installed")]
    NotInstalled(BundleId),

    #[error("bundle {0} must be installed before it can be enabled")]
    EnableWithoutInstall(BundleId),

    #[error("cannot enable bundle {id}: {path} exists and is not a symlink")]
    EnablePathOccupied { id: BundleId, path: String },
}

// ── Blobstore errors ──────────────────────────────────────────────────────────

/// Errors related to fetching and verifying job artifacts.
#[derive(Debug, Error)]
pub enum BlobstoreError {
    #[error("blob '{0}' not found")]
    NotFound(String),

    #[error("invalid blob id '{0}': must be a single path component")]
    InvalidId(String),

    #[error("unsupported digest '{0}': expected 40 hex chars (sha1) or sha256:<64 hex chars>")]
    UnsupportedDigest(String),

    #[error("digest mismatch for blob '{id}': expected {expected}, got {actual}")]
    DigestMismatch {
        id: String,
        expected: String,
        actual: String,
    },
}

// ── Supervisor errors ─────────────────────────────────────────────────────────

/// Errors reported by the process supervisor adapter.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("supervisor reload `{command}` exited with {code}: {stderr}")]
    ReloadFailed {
        command: String,
        code: String,
        stderr: String,
    },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to agent configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}\n\nExpected an absolute path")]
    RelativePath { key: String, value: String },

    #[error("Invalid value for reload_timeout_secs: 0\n\nExpected a positive number of seconds")]
    ZeroTimeout,

    #[error("Invalid value for log_level: {value}\n\nValid values: {valid}")]
    InvalidLogLevel { value: String, valid: String },
}
