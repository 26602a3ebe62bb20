// lib/crates/job-models/src/job.rs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordinal distinguishing instances of the same job on a multi-instance
/// deployment.
pub type JobIndex = u32;

/// A named unit of configuration and payload that should be present on a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    /// Build of the job; together with `name` it identifies the installed bundle.
    pub version: String,
    pub source: JobSource,
}

/// Where the job payload comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSource {
    pub blobstore_id: String,
    /// Content digest handed to the blobstore for verification.
    pub sha1: String,
    /// Subdirectory of the decompressed archive holding the job payload.
    #[serde(default)]
    pub path_in_archive: String,
}

/// Reasons a job definition cannot be turned into an on-disk bundle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobValidationError {
    #[error("job name must not be empty")]
    EmptyName,

    #[error("job '{0}' has an empty version")]
    EmptyVersion(String),

    #[error("job '{job}' has an invalid {field} '{value}': must be a single path component")]
    InvalidComponent {
        job: String,
        field: &'static str,
        value: String,
    },

    #[error("job '{job}' has a hidden {field} '{value}': must not start with '.'")]
    HiddenComponent {
        job: String,
        field: &'static str,
        value: String,
    },

    #[error("job '{0}' has an empty blobstore id")]
    EmptyBlobstoreId(String),

    #[error("job '{job}' has path_in_archive '{value}' escaping the archive root")]
    EscapingArchivePath { job: String, value: String },
}

/// Checks that a job can be safely mapped onto filesystem paths.
///
/// `name` and `version` become directory names, so they must be single path
/// components and must not start with `.`: the bundle store treats dot
/// entries as its own and never lists them. `path_in_archive` may be nested but must stay inside the
/// extracted archive.
pub fn validate_job(job: &Job) -> Result<(), JobValidationError> {
    if job.name.is_empty() {
        return Err(JobValidationError::EmptyName);
    }
    if !is_single_component(&job.name) {
        return Err(JobValidationError::InvalidComponent {
            job: job.name.clone(),
            field: "name",
            value: job.name.clone(),
        });
    }
    if job.name.starts_with('.') {
        return Err(JobValidationError::HiddenComponent {
            job: job.name.clone(),
            field: "name",
            value: job.name.clone(),
        });
    }
    if job.version.is_empty() {
        return Err(JobValidationError::EmptyVersion(job.name.clone()));
    }
    if !is_single_component(&job.version) {
        return Err(JobValidationError::InvalidComponent {
            job: job.name.clone(),
            field: "version",
            value: job.version.clone(),
        });
    }
    if job.version.starts_with('.') {
        return Err(JobValidationError::HiddenComponent {
            job: job.name.clone(),
            field: "version",
            value: job.version.clone(),
        });
    }
    if job.source.blobstore_id.is_empty() {
        return Err(JobValidationError::EmptyBlobstoreId(job.name.clone()));
    }
    let path = &job.source.path_in_archive;
    if path.starts_with('/') || path.split(['/', '\\']).any(|part| part == "..") {
        return Err(JobValidationError::EscapingArchivePath {
            job: job.name.clone(),
            value: path.clone(),
        });
    }
    Ok(())
}

fn is_single_component(value: &str) -> bool {
    value != "." && value != ".." && !value.contains(['/', '\\', '\0'])
}
