//! Repository error taxonomy
//!
//! Object-store corruption (`MalformedTree`, `DanglingParent`, `NotFound`,
//! `CorruptObject`, `WrongObjectType`) is fatal for the running operation and is never repaired.
//! Ref and staging errors name the offending ref or paths so they can be acted on.
//! `MergeConflict` is part of the normal merge workflow: it carries everything a
//! caller needs to present the conflicts and finish the merge with a plain commit.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::merge::conflict::MergeConflicts;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Repository result type
pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    /// A tree's entry list is unsorted, has duplicate names or invalid names
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    /// A commit references a parent that is not stored
    #[error("dangling parent: commit {0} does not exist")]
    DanglingParent(ObjectId),

    /// No object with this id is stored
    #[error("object {0} not found")]
    NotFound(ObjectId),

    /// Stored or imported bytes do not hash to the id they were filed under
    #[error("object {0} does not match its digest")]
    CorruptObject(ObjectId),

    /// An object exists but has a different kind than the caller asked for
    #[error("object {oid} is a {found}, expected a {expected}")]
    WrongObjectType {
        oid: ObjectId,
        expected: ObjectType,
        found: ObjectType,
    },

    #[error("a branch named '{0}' already exists")]
    BranchExists(BranchName),

    #[error("invalid branch name '{0}'")]
    InvalidBranchName(String),

    /// Neither a branch name nor a resolvable commit id
    #[error("unknown revision '{0}'")]
    UnknownRef(String),

    #[error("cannot operate on a detached HEAD")]
    DetachedHead,

    /// Staged changes overlap paths the operation would overwrite
    #[error("staged changes to the following paths would be overwritten: {}", format_paths(.0))]
    DirtyStaging(Vec<PathBuf>),

    #[error("refusing to merge unrelated histories ({ours} and {theirs})")]
    UnrelatedHistories { ours: ObjectId, theirs: ObjectId },

    /// A conflicted merge of this commit is recorded and not yet committed
    #[error("merging {0} is still in progress; resolve the conflicts and commit first")]
    MergeInProgress(ObjectId),

    #[error("merge conflict in {}", format_conflicts(.0))]
    MergeConflict(Box<MergeConflicts>),

    #[error("not a repository: {0}")]
    NotARepository(PathBuf),

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("nothing to commit")]
    NothingToCommit,

    /// The staging file failed its checksum or could not be decoded
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepoError {
    /// True for the recoverable merge outcome that awaits conflict resolution
    pub fn is_merge_conflict(&self) -> bool {
        matches!(self, RepoError::MergeConflict(_))
    }

    /// Conflicts carried by a `MergeConflict`, if this is one
    pub fn merge_conflicts(&self) -> Option<&MergeConflicts> {
        match self {
            RepoError::MergeConflict(conflicts) => Some(conflicts),
            _ => None,
        }
    }

    /// True for object-store corruption and I/O failures
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            RepoError::MalformedTree(_)
                | RepoError::DanglingParent(_)
                | RepoError::NotFound(_)
                | RepoError::CorruptObject(_)
                | RepoError::WrongObjectType { .. }
                | RepoError::CorruptIndex(_)
                | RepoError::Io(_)
                | RepoError::Other(_)
        )
    }
}

fn format_conflicts(conflicts: &MergeConflicts) -> String {
    format_paths(&conflicts.paths())
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::merge::conflict::Conflict;

    fn oid(c: char) -> ObjectId {
        ObjectId::try_parse(c.to_string().repeat(64)).unwrap()
    }

    #[test]
    fn merge_conflict_is_not_a_fault() {
        let error = RepoError::MergeConflict(Box::new(MergeConflicts::new(
            oid('a'),
            oid('b'),
            oid('c'),
            vec![Conflict::new(PathBuf::from("a.txt"), None, None, None)],
            Vec::new(),
        )));

        assert!(error.is_merge_conflict());
        assert_eq!(
            error.merge_conflicts().map(MergeConflicts::paths),
            Some(vec![PathBuf::from("a.txt")])
        );
        assert!(!error.is_fault());
        assert_eq!(error.to_string(), "merge conflict in a.txt");
    }

    #[test]
    fn store_corruption_is_a_fault() {
        assert!(RepoError::NotFound(oid('d')).is_fault());
        assert!(RepoError::DanglingParent(oid('d')).is_fault());
        assert!(!RepoError::UnknownRef("nope".to_string()).is_fault());
        assert!(!RepoError::MergeInProgress(oid('d')).is_fault());
        assert!(RepoError::NotFound(oid('d')).merge_conflicts().is_none());
    }

    #[test]
    fn dirty_staging_names_the_paths() {
        let error = RepoError::DirtyStaging(vec![PathBuf::from("a.txt"), PathBuf::from("b/c")]);

        assert_eq!(
            error.to_string(),
            "staged changes to the following paths would be overwritten: a.txt, b/c"
        );
    }
}
