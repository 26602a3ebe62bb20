//! Application context: unified state passed to every command handler.
//!
//! Built once from the loaded `AgentConfig`; every production collaborator
//! the job engine needs is rooted at a directory derived from `base_dir`.

use std::time::Duration;

use crate::application::services::job_applier::JobApplier;
use crate::domain::AgentConfig;
use crate::infra::{
    FileBundleCollection, LocalBlobstore, MonitJobSupervisor, OsFileSystem, TarGzCompressor,
    TokioCommandRunner,
};
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

impl OutputFlags {
    #[must_use]
    pub fn mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

/// Job lifecycle engine over the production collaborators.
pub type AgentApplier<'a> = JobApplier<
    'a,
    FileBundleCollection,
    LocalBlobstore,
    TarGzCompressor,
    OsFileSystem,
    MonitJobSupervisor<TokioCommandRunner>,
>;

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Loaded agent configuration.
    pub config: AgentConfig,
    pub bundles: FileBundleCollection,
    pub blobstore: LocalBlobstore,
    pub compressor: TarGzCompressor,
    pub fs: OsFileSystem,
    pub supervisor: MonitJobSupervisor<TokioCommandRunner>,
}

impl AppContext {
    /// Construct an `AppContext` from CLI flags and the loaded configuration.
    #[must_use]
    pub fn new(flags: &OutputFlags, config: AgentConfig) -> Self {
        let runner = TokioCommandRunner::new(Duration::from_secs(config.reload_timeout_secs));
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            mode: flags.mode(),
            bundles: FileBundleCollection::new(config.jobs_install_dir(), config.jobs_enable_dir()),
            blobstore: LocalBlobstore::new(config.blobstore_dir(), config.scratch_dir()),
            compressor: TarGzCompressor,
            fs: OsFileSystem::with_temp_root(config.scratch_dir()),
            supervisor: MonitJobSupervisor::new(
                config.monit_jobs_dir(),
                config.reload_command.clone(),
                runner,
            ),
            config,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        renderer_for(self.mode, &self.output)
    }

    /// The job lifecycle engine wired to this context's collaborators.
    #[must_use]
    pub fn applier(&self) -> AgentApplier<'_> {
        JobApplier::new(
            &self.bundles,
            &self.blobstore,
            &self.compressor,
            &self.fs,
            &self.supervisor,
        )
    }
}

/// Renderer for `mode` over `output`.
#[must_use]
pub fn renderer_for(mode: OutputMode, output: &OutputContext) -> Renderer<'_> {
    match mode {
        OutputMode::Human => Renderer::Human(HumanRenderer::new(output)),
        OutputMode::Json => Renderer::Json(JsonRenderer),
    }
}
