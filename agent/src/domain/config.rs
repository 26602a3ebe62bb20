//! Domain types and validators for agent configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `/etc/job-agent/config.yaml`.
///
/// Every directory the agent touches is derived from `base_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Root of the agent's on-disk layout.
    pub base_dir: PathBuf,
    /// Command run after supervisor registrations change. Empty disables reload.
    pub reload_command: Vec<String>,
    /// Upper bound for the reload command.
    pub reload_timeout_secs: u64,
    /// Default tracing level when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/var/vcap"),
            reload_command: vec!["monit".to_string(), "reload".to_string()],
            reload_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl AgentConfig {
    /// Persistent data owned by the agent.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Where bundle payloads are installed, one `<name>/<version>` per bundle.
    #[must_use]
    pub fn jobs_install_dir(&self) -> PathBuf {
        self.data_dir().join("jobs")
    }

    /// Where enabled bundles are linked, one `<name>` symlink per job.
    #[must_use]
    pub fn jobs_enable_dir(&self) -> PathBuf {
        self.base_dir.join("jobs")
    }

    /// Local blob cache the blobstore serves artifacts from.
    #[must_use]
    pub fn blobstore_dir(&self) -> PathBuf {
        self.data_dir().join("blobs")
    }

    /// Scratch space for fetched blobs and extraction temp directories.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.data_dir().join("tmp")
    }

    /// Directory the supervisor reads job registrations from.
    #[must_use]
    pub fn monit_jobs_dir(&self) -> PathBuf {
        self.base_dir.join("monit").join("job")
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a loaded configuration.
///
/// # Errors
///
/// Returns an error if `base_dir` is relative, the reload timeout is zero, or
/// the log level is unknown.
pub fn validate_config(config: &AgentConfig) -> Result<()> {
    require_absolute("base_dir", &config.base_dir)?;
    if config.reload_timeout_secs == 0 {
        return Err(ConfigError::ZeroTimeout.into());
    }
    if !VALID_LOG_LEVELS.contains(&config.log_level.as_str()) {
        return Err(ConfigError::InvalidLogLevel {
            value: config.log_level.clone(),
            valid: VALID_LOG_LEVELS.join(", "),
        }
        .into());
    }
    Ok(())
}

fn require_absolute(key: &str, path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(ConfigError::RelativePath {
            key: key.to_string(),
            value: path.display().to_string(),
        }
        .into());
    }
    Ok(())
}
