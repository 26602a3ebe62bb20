//! `job-agent list`: show installed bundles and whether each is enabled.

use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::application::ports::{Bundle, BundleCollection};
use crate::domain::{BundleListing, BundleState};
use crate::output::Renderer;

/// Collect the state of every installed bundle.
///
/// # Errors
///
/// Returns an error if the bundle collection cannot be read.
pub fn collect(bundles: &impl BundleCollection) -> Result<Vec<BundleListing>> {
    bundles
        .list()
        .context("retrieving installed bundles")?
        .iter()
        .map(|bundle| {
            let installed = bundle.is_installed()?;
            let enabled = bundle.is_enabled()?;
            Ok(BundleListing {
                id: bundle.id().clone(),
                state: BundleState::from_flags(installed, enabled),
            })
        })
        .collect()
}

/// Run the list command.
///
/// # Errors
///
/// Returns an error if the bundle collection cannot be read.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let listing = collect(&app.bundles)?;
    match app.renderer() {
        Renderer::Human(r) => r.render_bundles(&listing),
        Renderer::Json(r) => r.render(&listing)?,
    }
    Ok(ExitCode::SUCCESS)
}
