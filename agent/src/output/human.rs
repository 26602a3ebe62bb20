//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::reconcile::ReconcileOutcome;
use crate::domain::BundleListing;
use crate::output::OutputContext;

/// Renders agent results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the agent version.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("job-agent {version}");
    }

    /// Summarise a finished reconciliation.
    pub fn render_outcome(&self, outcome: &ReconcileOutcome) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header("Reconciled:");
        for name in &outcome.applied {
            self.ctx.success(name);
        }
        for id in &outcome.removed {
            self.ctx.removed(&format!("removed {id}"));
        }
    }

    /// Render installed bundles and their enable state.
    pub fn render_bundles(&self, bundles: &[BundleListing]) {
        if self.ctx.quiet {
            return;
        }
        if bundles.is_empty() {
            println!("No job bundles installed.");
            return;
        }
        for bundle in bundles {
            let label = bundle.state.label();
            let state = label.style(self.ctx.styles.for_state(bundle.state));
            println!(
                "  {:<24} {:<16} {state}",
                bundle.id.name, bundle.id.version
            );
        }
    }
}
