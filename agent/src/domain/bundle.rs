//! Bundle identity and lifecycle state.

use std::fmt;

use job_models::Job;
use serde::Serialize;

/// Stable identity of an on-disk bundle.
///
/// Two handles refer to the same bundle exactly when their ids are equal,
/// regardless of how or when the handles were constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BundleId {
    pub name: String,
    pub version: String,
}

impl BundleId {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The bundle a job definition resolves to.
    #[must_use]
    pub fn for_job(job: &Job) -> Self {
        Self::new(job.name.clone(), job.version.clone())
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Lifecycle state of a bundle.
///
/// `InstalledEnabled` is only reachable from `InstalledDisabled`, and removal
/// always passes back through `InstalledDisabled` before `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleState {
    Absent,
    InstalledDisabled,
    InstalledEnabled,
}

impl BundleState {
    /// Derive the state from the two observable flags. An enable link without
    /// an installed payload is reported as `Absent`.
    #[must_use]
    pub fn from_flags(installed: bool, enabled: bool) -> Self {
        match (installed, enabled) {
            (false, _) => Self::Absent,
            (true, false) => Self::InstalledDisabled,
            (true, true) => Self::InstalledEnabled,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::InstalledDisabled => "disabled",
            Self::InstalledEnabled => "enabled",
        }
    }
}

/// An installed bundle together with its observed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleListing {
    #[serde(flatten)]
    pub id: BundleId,
    pub state: BundleState,
}
