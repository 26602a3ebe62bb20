//! Command implementations

pub mod apply;
pub mod list;
pub mod version;
