use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_diff::PathChange;
use crate::artifacts::ignore::IgnoreFilter;
use crate::artifacts::index::index_entry::StagedChange;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::file_change::{FileChange, FileChangeType, WorkspaceChange};
use derive_new::new;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub type FileTree = BTreeMap<PathBuf, DatabaseEntry>;
pub type ChangeSet = BTreeMap<PathBuf, FileChangeType>;

#[derive(Debug, Clone, Default)]
pub struct StatusInfo {
    /// Staged changes relative to HEAD
    pub staged_changeset: ChangeSet,
    /// Working tree files that differ from HEAD with the staged changes applied
    pub workspace_changeset: ChangeSet,
    pub untracked_files: BTreeSet<PathBuf>,
}

impl StatusInfo {
    pub fn is_clean(&self) -> bool {
        self.staged_changeset.is_empty()
            && self.workspace_changeset.is_empty()
            && self.untracked_files.is_empty()
    }

    /// Per tracked path, both halves of its status
    pub fn changed_files(&self) -> BTreeMap<PathBuf, FileChange> {
        let mut changed_files = BTreeMap::<PathBuf, FileChange>::new();

        for (path, change) in &self.staged_changeset {
            if let FileChangeType::Staged(kind) = change {
                changed_files.entry(path.clone()).or_default().staged = Some(*kind);
            }
        }
        for (path, change) in &self.workspace_changeset {
            if let FileChangeType::Workspace(change) = change {
                changed_files.entry(path.clone()).or_default().workspace = Some(*change);
            }
        }

        changed_files
    }
}

#[derive(new)]
pub struct Status<'r> {
    database: &'r Database,
    workspace: &'r Workspace,
    ignore: &'r dyn IgnoreFilter,
}

impl<'r> Status<'r> {
    pub fn initialize(&self, index: &Index, head_tree: Option<&ObjectId>) -> anyhow::Result<StatusInfo> {
        let head_files = self.flatten_tree(head_tree)?;
        let expected_files = Self::overlay_staged(&head_files, index);

        let staged_changeset = Self::compare_trees(&head_files, &expected_files);
        let (workspace_changeset, untracked_files) = self.scan_workspace(&expected_files)?;

        Ok(StatusInfo {
            staged_changeset,
            workspace_changeset,
            untracked_files,
        })
    }

    fn flatten_tree(&self, tree_oid: Option<&ObjectId>) -> anyhow::Result<FileTree> {
        Ok(self
            .database
            .tree_diff(None, tree_oid)?
            .into_iter()
            .filter_map(|change| change.new.map(|entry| (change.path, entry)))
            .collect())
    }

    /// HEAD files as the next commit would record them
    fn overlay_staged(head_files: &FileTree, index: &Index) -> FileTree {
        let mut files = head_files.clone();

        for (path, change) in index.entries() {
            files.retain(|file, _| !file.starts_with(path) && !path.starts_with(file));
            if let StagedChange::Upsert(entry) = change {
                files.insert(path.clone(), entry.clone());
            }
        }

        files
    }

    fn compare_trees(old: &FileTree, new: &FileTree) -> ChangeSet {
        let paths = old.keys().chain(new.keys()).collect::<BTreeSet<_>>();

        paths
            .into_iter()
            .filter_map(|path| {
                PathChange::from_entries(path.clone(), old.get(path).cloned(), new.get(path).cloned())
            })
            .map(|change| (change.path, FileChangeType::Staged(change.kind)))
            .collect()
    }

    fn scan_workspace(
        &self,
        expected_files: &FileTree,
    ) -> anyhow::Result<(ChangeSet, BTreeSet<PathBuf>)> {
        let mut workspace_changeset = ChangeSet::new();

        for (path, entry) in expected_files {
            if let Some(change) = self.check_file(path, entry)? {
                workspace_changeset.insert(path.clone(), FileChangeType::Workspace(change));
            }
        }

        let untracked_files = self
            .workspace
            .list_files(self.ignore)?
            .into_iter()
            .filter(|path| !expected_files.contains_key(path))
            .collect();

        Ok((workspace_changeset, untracked_files))
    }

    fn check_file(&self, path: &Path, entry: &DatabaseEntry) -> anyhow::Result<Option<WorkspaceChange>> {
        if !self.workspace.is_file(path) {
            return Ok(Some(WorkspaceChange::Deleted));
        }

        let current = self.workspace.hash_file(path)?;
        Ok((&current != entry).then_some(WorkspaceChange::Modified))
    }
}
