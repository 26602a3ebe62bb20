//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the on-disk bundle store,
//! the local blobstore, archive extraction, filesystem primitives, the monit
//! supervisor adapter, process execution, and configuration loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod blobstore;
pub mod bundle_collection;
pub mod command_runner;
pub mod compressor;
pub mod config;
pub mod fs;
pub mod logging;
pub mod supervisor;

pub use blobstore::LocalBlobstore;
pub use bundle_collection::{FileBundle, FileBundleCollection};
pub use command_runner::TokioCommandRunner;
pub use compressor::TarGzCompressor;
pub use config::YamlConfigStore;
pub use fs::OsFileSystem;
pub use supervisor::MonitJobSupervisor;
