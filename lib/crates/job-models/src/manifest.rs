// lib/crates/job-models/src/manifest.rs

use serde::{Deserialize, Serialize};

use crate::job::{Job, JobIndex, JobValidationError, validate_job};

/// Desired state for one node: the jobs that must be running and the
/// instance index they are configured with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DesiredState {
    #[serde(default)]
    pub index: JobIndex,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl DesiredState {
    /// Validates every job in order, reporting the first invalid one.
    pub fn validate(&self) -> Result<(), JobValidationError> {
        self.jobs.iter().try_for_each(validate_job)
    }

    /// Names of the desired jobs, in manifest order.
    #[must_use]
    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }
}
