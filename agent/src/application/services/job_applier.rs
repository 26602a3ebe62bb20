//! Application service: job lifecycle engine.
//!
//! Brings the node's bundles into agreement with the desired jobs:
//! `apply` installs and enables a job, `configure` registers its supervisor
//! configuration, and `keep_only` removes every bundle that is no longer
//! desired. The engine holds no state of its own; everything lives in the
//! bundle collection, so every call is safe to repeat after a crash.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use job_models::{Job, JobIndex};

use crate::application::ports::{
    Blobstore, Bundle, BundleCollection, Compressor, FileSystem, JobSupervisor,
};
use crate::domain::BundleId;
use crate::domain::monit::{MONIT_FILE_GLOB, MONIT_FILE_NAME, sub_job_label, sub_job_name};

const TEMP_DIR_PREFIX: &str = "job-agent-apply-";

/// Mode applied to everything under a job's `bin/` directory.
const BINARY_MODE: u32 = 0o755;

/// Job lifecycle engine over injected collaborators.
pub struct JobApplier<'a, C, B, Z, F, S> {
    bundles: &'a C,
    blobstore: &'a B,
    compressor: &'a Z,
    fs: &'a F,
    supervisor: &'a S,
}

impl<'a, C, B, Z, F, S> JobApplier<'a, C, B, Z, F, S>
where
    C: BundleCollection,
    B: Blobstore,
    Z: Compressor,
    F: FileSystem,
    S: JobSupervisor,
{
    #[must_use]
    pub fn new(
        bundles: &'a C,
        blobstore: &'a B,
        compressor: &'a Z,
        fs: &'a F,
        supervisor: &'a S,
    ) -> Self {
        Self {
            bundles,
            blobstore,
            compressor,
            fs,
            supervisor,
        }
    }

    /// Ensure the job is installed and enabled.
    ///
    /// Installation only happens when the bundle reports not installed;
    /// `enable` is always called so a bundle installed by an interrupted
    /// earlier run still gets linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be resolved, installation fails
    /// (the job stays absent), or enabling fails.
    pub async fn apply(&self, job: &Job) -> Result<()> {
        tracing::debug!(job = %job.name, version = %job.version, "applying job");

        let bundle = self.bundles.get(job).context("getting job bundle")?;

        let installed = bundle
            .is_installed()
            .context("checking if job is installed")?;

        if !installed {
            self.download_and_install(job, &bundle).await?;
        }

        bundle.enable().context("enabling job")?;
        Ok(())
    }

    async fn download_and_install(&self, job: &Job, bundle: &C::Bundle) -> Result<()> {
        let tmp_dir = ScopedTempDir::create(self.fs, TEMP_DIR_PREFIX).context("getting temp dir")?;

        let blob = FetchedBlob::fetch(self.blobstore, &job.source.blobstore_id, &job.source.sha1)
            .await
            .context("getting job source from blobstore")?;

        self.compressor
            .decompress_file_to_dir(blob.path(), tmp_dir.path())
            .await
            .context("decompressing files to temp dir")?;

        let payload_dir = payload_dir(tmp_dir.path(), &job.source.path_in_archive);

        let binaries = self
            .fs
            .glob(&payload_dir.join("bin").join("*"))
            .context("finding job binary files")?;

        for file in &binaries {
            self.fs
                .chmod(file, BINARY_MODE)
                .with_context(|| format!("making {} executable", file.display()))?;
        }

        bundle
            .install(&payload_dir)
            .context("installing job bundle")?;

        tracing::info!(bundle = %bundle.id(), "installed job bundle");
        Ok(())
    }

    /// Register the job's supervisor configuration under the given index.
    ///
    /// A `monit` file in the install directory is registered under the job
    /// name; every `<label>.monit` file is registered as `<job>_<label>`.
    /// Registrations are not diffed against earlier calls.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failed lookup or registration. Earlier
    /// registrations are kept.
    pub async fn configure(&self, job: &Job, index: JobIndex) -> Result<()> {
        tracing::debug!(job = %job.name, index, "configuring job");

        let bundle = self.bundles.get(job).context("getting job bundle")?;

        let job_dir = bundle
            .install_path()
            .context("looking up job directory")?;

        let monit_file = job_dir.join(MONIT_FILE_NAME);
        if self.fs.file_exists(&monit_file) {
            self.supervisor
                .add_job(&job.name, index, &monit_file)
                .await
                .context("adding monit configuration")?;
        }

        let monit_files = self
            .fs
            .glob(&job_dir.join(MONIT_FILE_GLOB))
            .context("looking for additional monit files")?;

        for path in &monit_files {
            let Some(label) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(sub_job_label)
            else {
                tracing::warn!(path = %path.display(), "skipping monit file with a non UTF-8 name");
                continue;
            };

            self.supervisor
                .add_job(&sub_job_name(&job.name, label), index, path)
                .await
                .with_context(|| format!("adding additional monit configuration {label}"))?;
        }

        Ok(())
    }

    /// Remove every installed bundle that none of `jobs` resolves to.
    ///
    /// Each removed bundle is disabled first and uninstalled second. Returns
    /// the ids of the bundles removed.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failed lookup, disable, or uninstall.
    /// Bundles removed before the failure stay removed; a bundle whose
    /// disable failed is left installed and enabled.
    pub fn keep_only(&self, jobs: &[Job]) -> Result<Vec<BundleId>> {
        tracing::debug!(
            jobs = ?jobs.iter().map(|j| j.name.as_str()).collect::<Vec<_>>(),
            "keeping only jobs"
        );

        let installed = self
            .bundles
            .list()
            .context("retrieving installed bundles")?;

        let mut removed = Vec::new();
        for bundle in &installed {
            if self.is_desired(bundle, jobs)? {
                continue;
            }

            // An uninstalled bundle drops out of `list`, so its enable link
            // must be gone before the payload is.
            bundle.disable().context("disabling job bundle")?;
            bundle.uninstall().context("uninstalling job bundle")?;

            tracing::info!(bundle = %bundle.id(), "removed job bundle");
            removed.push(bundle.id().clone());
        }

        Ok(removed)
    }

    fn is_desired(&self, installed: &C::Bundle, jobs: &[Job]) -> Result<bool> {
        for job in jobs {
            let desired = self.bundles.get(job).context("getting job bundle")?;
            if desired.id() == installed.id() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn payload_dir(tmp_dir: &Path, path_in_archive: &str) -> PathBuf {
    if path_in_archive.is_empty() {
        tmp_dir.to_path_buf()
    } else {
        tmp_dir.join(path_in_archive)
    }
}

// ── Scoped resources ──────────────────────────────────────────────────────────

/// Temp directory removed through the filesystem port when dropped.
struct ScopedTempDir<'a, F: FileSystem> {
    fs: &'a F,
    path: PathBuf,
}

impl<'a, F: FileSystem> ScopedTempDir<'a, F> {
    fn create(fs: &'a F, prefix: &str) -> Result<Self> {
        let path = fs.temp_dir(prefix)?;
        Ok(Self { fs, path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: FileSystem> Drop for ScopedTempDir<'_, F> {
    fn drop(&mut self) {
        if let Err(e) = self.fs.remove_all(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temp dir");
        }
    }
}

/// Fetched blob handed back to the blobstore for clean-up when dropped.
struct FetchedBlob<'a, B: Blobstore> {
    blobstore: &'a B,
    path: PathBuf,
}

impl<'a, B: Blobstore> FetchedBlob<'a, B> {
    async fn fetch(blobstore: &'a B, blobstore_id: &str, digest: &str) -> Result<Self> {
        let path = blobstore.get(blobstore_id, digest).await?;
        Ok(Self { blobstore, path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl<B: Blobstore> Drop for FetchedBlob<'_, B> {
    fn drop(&mut self) {
        if let Err(e) = self.blobstore.clean_up(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to clean up fetched blob");
        }
    }
}
