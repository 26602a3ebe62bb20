//! Application service: one full reconciliation cycle.
//!
//! Drives the job lifecycle engine over a desired state in a fixed order:
//! apply every job, collect undesired bundles, rebuild supervisor
//! registrations, then reload the supervisor.
//!
//! Imports only from `crate::domain`, `crate::application`, and `job_models`.

use anyhow::{Context, Result};
use job_models::DesiredState;
use serde::Serialize;

use crate::application::ports::{
    Blobstore, BundleCollection, Compressor, FileSystem, JobSupervisor, ProgressReporter,
};
use crate::application::services::job_applier::JobApplier;
use crate::domain::BundleId;

/// Outcome of a successful reconciliation.
#[derive(Debug, Serialize)]
pub struct ReconcileOutcome {
    /// Names of the jobs applied and configured, in manifest order.
    pub applied: Vec<String>,
    /// Bundles removed because no desired job resolves to them.
    pub removed: Vec<BundleId>,
}

/// Reconcile the node against `desired`.
///
/// Stops at the first failure. Every step is idempotent, so the whole
/// cycle can simply be re-run.
///
/// # Errors
///
/// Returns an error if the desired state is invalid or any step fails.
pub async fn reconcile<C, B, Z, F, S>(
    applier: &JobApplier<'_, C, B, Z, F, S>,
    supervisor: &S,
    desired: &DesiredState,
    reporter: &impl ProgressReporter,
) -> Result<ReconcileOutcome>
where
    C: BundleCollection,
    B: Blobstore,
    Z: Compressor,
    F: FileSystem,
    S: JobSupervisor,
{
    desired.validate().context("validating desired state")?;

    for job in &desired.jobs {
        reporter.step(&format!("applying {} ({})", job.name, job.version));
        applier
            .apply(job)
            .await
            .with_context(|| format!("applying job {}", job.name))?;
    }

    reporter.step("removing undesired jobs...");
    let removed = applier.keep_only(&desired.jobs)?;
    for id in &removed {
        reporter.success(&format!("removed {id}"));
    }

    supervisor
        .remove_all_jobs()
        .await
        .context("removing supervisor registrations")?;

    for job in &desired.jobs {
        reporter.step(&format!("configuring {} (index {})", job.name, desired.index));
        applier
            .configure(job, desired.index)
            .await
            .with_context(|| format!("configuring job {}", job.name))?;
    }

    reporter.step("reloading supervisor...");
    supervisor.reload().await.context("reloading supervisor")?;

    let applied: Vec<String> = desired.jobs.iter().map(|j| j.name.clone()).collect();
    if applied.is_empty() {
        reporter.warn("desired state has no jobs; node is now empty");
    }
    reporter.success(&format!("{} job(s) applied", applied.len()));

    Ok(ReconcileOutcome { applied, removed })
}
