//! Ignore rules for the working tree
//!
//! The core never reads `.ignore` itself; it asks an `IgnoreFilter`. The
//! command layer uses `IgnorePatterns`, loaded from the `.ignore` file at the
//! root of the working tree.

pub mod patterns;

use std::path::Path;

/// Name of the ignore file at the working tree root
pub const IGNORE_FILE: &str = ".ignore";

pub trait IgnoreFilter {
    /// `path` is relative to the working tree root
    fn is_ignored(&self, path: &Path) -> bool;
}

/// Ignores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIgnore;

impl IgnoreFilter for NoIgnore {
    fn is_ignored(&self, _path: &Path) -> bool {
        false
    }
}
