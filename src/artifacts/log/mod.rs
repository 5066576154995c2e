//! Commit history traversal
//!
//! `rev_list` walks a commit and all of its ancestors, newest first among the
//! commits whose children have all been visited.

pub mod rev_list;
