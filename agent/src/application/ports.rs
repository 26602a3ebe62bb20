//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `job_models`: never from
//! `crate::infra`, `crate::commands`, or `crate::output`.
//!
//! Ports backed by local filesystem work are synchronous so that scoped
//! guards can release resources from `Drop`. Ports that reach the network or
//! spawn processes are async.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;
use job_models::{Job, JobIndex};

use crate::domain::{AgentConfig, BundleId};

// ── Bundle Ports ──────────────────────────────────────────────────────────────

/// Registry mapping a job's identity to its on-disk bundle.
pub trait BundleCollection {
    type Bundle: Bundle;

    /// Resolve the bundle a job maps to. The bundle need not be installed.
    fn get(&self, job: &Job) -> Result<Self::Bundle>;
    /// All bundles currently installed.
    fn list(&self) -> Result<Vec<Self::Bundle>>;
}

/// One job's installed, linkable on-disk unit.
///
/// Every operation is individually atomic and safe to retry.
pub trait Bundle {
    /// Identity shared by every handle to the same bundle.
    fn id(&self) -> &BundleId;
    fn is_installed(&self) -> Result<bool>;
    fn is_enabled(&self) -> Result<bool>;
    /// Install the payload found at `source`. No-op when already installed.
    fn install(&self, source: &Path) -> Result<()>;
    /// Link the installed payload into the active set.
    fn enable(&self) -> Result<()>;
    /// Remove this bundle's activation link, if present.
    fn disable(&self) -> Result<()>;
    /// Remove the installed payload.
    fn uninstall(&self) -> Result<()>;
    /// Directory holding the installed payload.
    fn install_path(&self) -> Result<PathBuf>;
}

// ── Artifact Ports ────────────────────────────────────────────────────────────

/// Content-addressed artifact store supplying job payloads.
#[allow(async_fn_in_trait)]
pub trait Blobstore {
    /// Fetch a blob into a local file and verify it against `digest`.
    async fn get(&self, blobstore_id: &str, digest: &str) -> Result<PathBuf>;
    /// Release a file previously returned by `get`.
    fn clean_up(&self, file: &Path) -> Result<()>;
}

/// Archive decompressor.
#[allow(async_fn_in_trait)]
pub trait Compressor {
    /// Extract the archive at `file` into the existing directory `dir`.
    async fn decompress_file_to_dir(&self, file: &Path, dir: &Path) -> Result<()>;
}

/// Filesystem primitives used by the engine.
pub trait FileSystem {
    /// Create a fresh, uniquely named temp directory.
    fn temp_dir(&self, prefix: &str) -> Result<PathBuf>;
    /// Remove a file or directory tree. Missing paths are not an error.
    fn remove_all(&self, path: &Path) -> Result<()>;
    /// Match the final component of `pattern` (`*`, `?`) within its parent
    /// directory. Results are sorted; a missing parent yields no matches.
    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>>;
    fn chmod(&self, path: &Path, mode: u32) -> Result<()>;
    fn file_exists(&self, path: &Path) -> bool;
}

// ── Supervisor Ports ──────────────────────────────────────────────────────────

/// Process supervisor the agent registers job configuration with.
#[allow(async_fn_in_trait)]
pub trait JobSupervisor {
    /// Register `config_path` under `name` for the given instance index.
    async fn add_job(&self, name: &str, index: JobIndex, config_path: &Path) -> Result<()>;
    /// Drop every registration.
    async fn remove_all_jobs(&self) -> Result<()>;
    /// Ask the supervisor to pick up registration changes.
    async fn reload(&self) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading the agent configuration.
pub trait ConfigStore {
    /// Load and validate the configuration, using defaults when none exists.
    fn load(&self) -> Result<AgentConfig>;
    /// Location the configuration is read from.
    fn path(&self) -> PathBuf;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
