//! Terminal colors for agent output, keyed by what the text reports.

use owo_colors::Style;

use crate::domain::BundleState;

/// Stylesheet for human output. The default applies no escapes; see
/// [`Styles::colored`].
#[derive(Default, Clone, Copy)]
pub struct Styles {
    /// Jobs applied during a reconcile.
    pub applied: Style,
    /// Bundles removed by garbage collection.
    pub removed: Style,
    /// In-progress reconcile steps.
    pub step: Style,
    pub warning: Style,
    pub header: Style,
    /// Listing state of a linked bundle.
    pub enabled: Style,
    /// Listing state of an installed but unlinked bundle.
    pub disabled: Style,
}

impl Styles {
    #[must_use]
    pub fn colored() -> Self {
        Self {
            applied: Style::new().green(),
            removed: Style::new().red(),
            step: Style::new().blue(),
            warning: Style::new().yellow(),
            header: Style::new().bold().cyan(),
            enabled: Style::new().bold().green(),
            disabled: Style::new().dimmed(),
        }
    }

    /// Style for a bundle state in `list` output.
    #[must_use]
    pub fn for_state(&self, state: BundleState) -> Style {
        match state {
            BundleState::InstalledEnabled => self.enabled,
            BundleState::InstalledDisabled => self.disabled,
            BundleState::Absent => self.removed,
        }
    }
}
