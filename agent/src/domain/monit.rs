//! Naming rules for supervisor (monit) registrations.

use job_models::JobIndex;

/// Primary supervisor config file at the root of a job's install directory.
pub const MONIT_FILE_NAME: &str = "monit";

/// Glob matching additional supervisor config files in the install directory.
pub const MONIT_FILE_GLOB: &str = "*.monit";

const MONIT_SUFFIX: &str = ".monit";

/// Label of an additional config file: its name without the `.monit` suffix.
///
/// Returns `None` when the name lacks the suffix. A file named `.monit` has
/// the empty label and registers as `<job>_`.
#[must_use]
pub fn sub_job_label(file_name: &str) -> Option<&str> {
    file_name.strip_suffix(MONIT_SUFFIX)
}

/// Registration name for an additional config file: `<job>_<label>`.
#[must_use]
pub fn sub_job_name(job_name: &str, label: &str) -> String {
    format!("{job_name}_{label}")
}

/// File name under which a registration is stored in the monit jobs directory.
#[must_use]
pub fn monitrc_file_name(name: &str, index: JobIndex) -> String {
    format!("{index:04}_{name}.monitrc")
}
