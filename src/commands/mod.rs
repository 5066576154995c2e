//! Command implementations
//!
//! Each command is an `impl Repository` block that prints through
//! `Repository::writer`.
//!
//! - `plumbing`: direct object access (cat-file)
//! - `porcelain`: the everyday workflow (add, commit, branch, merge, ...)

pub mod plumbing;
pub mod porcelain;
