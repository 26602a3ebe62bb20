//! `job-agent apply`: reconcile the node against a desired-state manifest.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use job_models::DesiredState;

use crate::app::AppContext;
use crate::application::services::reconcile::{ReconcileOutcome, reconcile};
use crate::output::Renderer;
use crate::output::reporter::{SilentReporter, TerminalReporter};

/// Arguments for the apply command.
#[derive(Args)]
pub struct ApplyArgs {
    /// Desired-state manifest (YAML or JSON)
    pub manifest: PathBuf,
}

/// Run the apply command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or any reconcile step fails.
pub async fn run(app: &AppContext, args: &ApplyArgs) -> Result<ExitCode> {
    let desired = load_manifest(&args.manifest)?;
    tracing::info!(
        manifest = %args.manifest.display(),
        jobs = desired.jobs.len(),
        index = desired.index,
        "applying desired state"
    );

    let applier = app.applier();
    let outcome: ReconcileOutcome = if app.is_json() {
        reconcile(&applier, &app.supervisor, &desired, &SilentReporter).await?
    } else {
        let reporter = TerminalReporter::new(&app.output);
        reconcile(&applier, &app.supervisor, &desired, &reporter).await?
    };

    match app.renderer() {
        Renderer::Human(r) => r.render_outcome(&outcome),
        Renderer::Json(r) => r.render(&outcome)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse a manifest file. JSON manifests parse as YAML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_manifest(path: &Path) -> Result<DesiredState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read manifest {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("cannot parse manifest {}", path.display()))
}
