//! Tree comparison
//!
//! - `tree_diff`: file-level changes between two trees, used by `diff`, `status`,
//!   checkout and the merge engine

pub mod tree_diff;
