//! Porcelain commands
//!
//! - `init`: create a repository
//! - `add`: stage files and directories
//! - `commit`: record the staged changes
//! - `status`: staged, unstaged and untracked files
//! - `diff`: changed files between two revisions
//! - `log`: commit history
//! - `branch`: create, list and delete branches
//! - `checkout`: switch branches or detach HEAD
//! - `merge`: three-way merge of another revision
//! - `clone`: copy a repository
//! - `ignore`: manage ignore patterns and list the files they let through

pub mod add;
pub mod branch;
pub mod checkout;
pub mod clone;
pub mod commit;
pub mod diff;
pub mod ignore;
pub mod init;
pub mod log;
pub mod merge;
pub mod status;
