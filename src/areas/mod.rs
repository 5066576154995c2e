//! Repository areas
//!
//! - `database`: append-only object store for blobs, trees and commits
//! - `index`: staging area with pending changes for the next commit
//! - `refs`: branch refs, HEAD and MERGE_HEAD
//! - `repository`: the handle that coordinates the other areas
//! - `workspace`: the user's working tree

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
