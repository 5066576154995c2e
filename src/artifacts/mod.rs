//! Data structures and algorithms
//!
//! - `branch`: branch names, HEAD and revision expressions
//! - `checkout`: working tree migration between trees
//! - `database`: tree entries and transferable object records
//! - `diff`: file-level tree diffs
//! - `ignore`: ignore-pattern filters
//! - `index`: staging entries, the on-disk format and the tree builder
//! - `log`: ancestor traversal
//! - `merge`: merge-base search and three-way reconciliation
//! - `objects`: blob, tree and commit objects and their ids
//! - `status`: working tree status

pub mod branch;
pub mod checkout;
pub mod database;
pub mod diff;
pub mod ignore;
pub mod index;
pub mod log;
pub mod merge;
pub mod objects;
pub mod status;
