//! Plumbing commands
//!
//! - `cat-file`: print a stored object

pub mod cat_file;
