//! Working tree status
//!
//! Compares the working tree against HEAD with the staged changes applied.
//!
//! - `file_change`: change kinds and their labels
//! - `status_info`: staged, unstaged and untracked sets

pub mod file_change;
pub mod status_info;
