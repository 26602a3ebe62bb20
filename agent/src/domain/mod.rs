//! Domain layer: pure types, naming rules, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod bundle;
pub mod config;
pub mod error;
pub mod monit;

pub use bundle::{BundleId, BundleListing, BundleState};
pub use config::{AgentConfig, validate_config};
pub use error::{BlobstoreError, BundleError, ConfigError, SupervisorError};
