//! Utility functions shared across the crate
//!
//! Formatting helpers and path management for the download tree.

mod format;
mod path;

pub use format::*;
pub use path::*;
