pub mod job;
pub mod manifest;

pub use job::{Job, JobIndex, JobSource, JobValidationError, validate_job};
pub use manifest::DesiredState;
