//! Working tree migration between two trees
//!
//! Given the file changes from the current tree to a target tree, plans the
//! file system operations that turn one into the other and refuses, before
//! touching anything, when they would destroy work that exists only in the
//! working tree:
//!
//! - a tracked file whose content differs from both the current and target version
//! - an untracked file where the target puts a file, or a directory
//! - a directory holding untracked files where the target puts a file

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::checkout::conflict::{ConflictMessage, ConflictType};
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_diff::{ChangeKind, PathChange};
use crate::artifacts::ignore::NoIgnore;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionType {
    Add,
    Delete,
    Modify,
}

pub type ActionsSet = BTreeMap<ActionType, Vec<(PathBuf, Option<DatabaseEntry>)>>;
pub type ConflictsSet = BTreeMap<ConflictType, BTreeSet<PathBuf>>;

pub struct Migration<'r> {
    database: &'r Database,
    workspace: &'r Workspace,
    changes: Vec<PathChange>,
    actions: ActionsSet,
    conflicts: ConflictsSet,
    /// Directories to create, outermost first
    mkdirs: BTreeSet<PathBuf>,
    /// Directories to remove when left empty
    rmdirs: BTreeSet<PathBuf>,
}

impl<'r> Migration<'r> {
    pub fn new(database: &'r Database, workspace: &'r Workspace, changes: Vec<PathChange>) -> Self {
        Migration {
            database,
            workspace,
            changes,
            actions: BTreeMap::new(),
            conflicts: BTreeMap::new(),
            mkdirs: BTreeSet::new(),
            rmdirs: BTreeSet::new(),
        }
    }

    pub fn actions_of(&self, action: ActionType) -> &[(PathBuf, Option<DatabaseEntry>)] {
        self.actions.get(&action).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn mkdirs(&self) -> &BTreeSet<PathBuf> {
        &self.mkdirs
    }

    pub fn rmdirs(&self) -> &BTreeSet<PathBuf> {
        &self.rmdirs
    }

    pub fn apply_changes(&mut self) -> anyhow::Result<()> {
        self.plan_changes()?;
        self.workspace.apply_migration(self)
    }

    fn plan_changes(&mut self) -> anyhow::Result<()> {
        let removed = self
            .changes
            .iter()
            .filter(|change| change.old.is_some())
            .map(|change| change.path.clone())
            .collect::<HashSet<_>>();

        let changes = std::mem::take(&mut self.changes);
        for change in &changes {
            self.check_for_conflict(change, &removed)?;
            self.record_change(change);
        }
        self.changes = changes;

        let errors = self.collect_errors();
        if !errors.is_empty() {
            let errors = errors
                .iter()
                .map(|e| format!("error: {e}"))
                .collect::<Vec<_>>()
                .join("\n\n");
            anyhow::bail!("\n{errors}\n\nAborting");
        }

        Ok(())
    }

    fn collect_errors(&self) -> Vec<String> {
        self.conflicts
            .iter()
            .filter(|(_, paths)| !paths.is_empty())
            .map(|(conflict_type, paths)| {
                let paths = paths
                    .iter()
                    .map(|p| format!("\t{}", p.display()))
                    .collect::<Vec<_>>();

                let ConflictMessage { header, footer } = conflict_type.into();
                format!("{}\n{}\n{}", header, paths.join("\n"), footer)
            })
            .collect()
    }

    fn check_for_conflict(
        &mut self,
        change: &PathChange,
        removed: &HashSet<PathBuf>,
    ) -> anyhow::Result<()> {
        let path = change.path.as_path();

        if self.workspace.is_dir(path) {
            // only files the current tree tracks may be cleared away
            let untracked = self
                .workspace
                .list_files_under(path, &NoIgnore)?
                .into_iter()
                .any(|file| !removed.contains(&file));
            if untracked && change.new.is_some() {
                self.add_conflict(ConflictType::get_conflict_type(true, None), path);
            }
        } else if self.workspace.is_file(path) {
            let current = self.workspace.hash_file(path)?;
            let matches_old = change.old.as_ref() == Some(&current);
            let matches_new = change.new.as_ref() == Some(&current);

            if !matches_old && !matches_new {
                self.add_conflict(
                    ConflictType::get_conflict_type(false, change.old.as_ref()),
                    path,
                );
            }
        }

        if change.new.is_some()
            && let Some(parent) = self.untracked_parent(path, removed)
        {
            self.add_conflict(ConflictType::UntrackedOverwritten, &parent);
        }

        Ok(())
    }

    /// An untracked file standing where the target needs a directory
    fn untracked_parent(&self, path: &Path, removed: &HashSet<PathBuf>) -> Option<PathBuf> {
        path.ancestors()
            .skip(1)
            .filter(|parent| !parent.as_os_str().is_empty())
            .find(|parent| self.workspace.is_file(parent) && !removed.contains(*parent))
            .map(Path::to_path_buf)
    }

    fn add_conflict(&mut self, conflict_type: ConflictType, path: &Path) {
        self.conflicts
            .entry(conflict_type)
            .or_default()
            .insert(path.to_path_buf());
    }

    fn record_change(&mut self, change: &PathChange) {
        let parents = change
            .path
            .ancestors()
            .skip(1)
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf);

        let action = match change.kind {
            ChangeKind::Added => ActionType::Add,
            ChangeKind::Removed => ActionType::Delete,
            ChangeKind::Modified => ActionType::Modify,
        };

        match action {
            ActionType::Delete => self.rmdirs.extend(parents),
            ActionType::Add | ActionType::Modify => self.mkdirs.extend(parents),
        }

        self.actions
            .entry(action)
            .or_default()
            .push((change.path.clone(), change.new.clone()));
    }

    pub fn load_blob_data(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        Ok(self.database.load_blob(object_id)?.into_data())
    }
}
