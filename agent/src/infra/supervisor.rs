//! Monit supervisor adapter: implements the `JobSupervisor` port.
//!
//! Registrations are plain files in the monit jobs directory, named
//! `<index:04>_<name>.monitrc`, which monit includes on reload.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use job_models::JobIndex;

use crate::application::ports::{CommandRunner, JobSupervisor};
use crate::domain::SupervisorError;
use crate::domain::monit::monitrc_file_name;
use crate::infra::fs::remove_all;

/// Registers job configuration with monit.
pub struct MonitJobSupervisor<R: CommandRunner> {
    jobs_dir: PathBuf,
    reload_command: Vec<String>,
    runner: R,
}

impl<R: CommandRunner> MonitJobSupervisor<R> {
    /// `reload_command` is run by `reload`; an empty command disables reload.
    #[must_use]
    pub fn new(jobs_dir: PathBuf, reload_command: Vec<String>, runner: R) -> Self {
        Self {
            jobs_dir,
            reload_command,
            runner,
        }
    }

    #[must_use]
    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }
}

impl<R: CommandRunner> JobSupervisor for MonitJobSupervisor<R> {
    async fn add_job(&self, name: &str, index: JobIndex, config_path: &Path) -> Result<()> {
        let target = self.jobs_dir.join(monitrc_file_name(name, index));
        let jobs_dir = self.jobs_dir.clone();
        let source = config_path.to_path_buf();
        let dest = target.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&jobs_dir)
                .with_context(|| format!("creating directory {}", jobs_dir.display()))?;
            std::fs::copy(&source, &dest).with_context(|| {
                format!("copying {} to {}", source.display(), dest.display())
            })?;
            Ok::<(), anyhow::Error>(())
        })
        .await
        .context("spawn_blocking for add_job")??;

        tracing::debug!(job = name, index, path = %target.display(), "registered monit job");
        Ok(())
    }

    async fn remove_all_jobs(&self) -> Result<()> {
        let jobs_dir = self.jobs_dir.clone();
        tokio::task::spawn_blocking(move || remove_all(&jobs_dir))
            .await
            .context("spawn_blocking for remove_all_jobs")?
    }

    async fn reload(&self) -> Result<()> {
        let Some((program, args)) = self.reload_command.split_first() else {
            tracing::debug!("no reload command configured");
            return Ok(());
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self.runner.run(program, &args).await?;
        if !output.status.success() {
            return Err(SupervisorError::ReloadFailed {
                command: self.reload_command.join(" "),
                code: output
                    .status
                    .code()
                    .map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        tracing::info!(command = %self.reload_command.join(" "), "reloaded supervisor");
        Ok(())
    }
}
