//! Working tree checkout
//!
//! Switching to another commit rewrites the working tree from the current tree
//! to the target tree. Every conflict is detected before any file is touched.

pub mod conflict;
pub mod migration;
