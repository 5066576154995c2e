//! Repository handle
//!
//! Ties the object store, refs, staging index and working tree of one repository
//! together. Every operation that changes refs or the index goes through the
//! index mutex, and every one that writes objects does so before its single ref
//! update.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::head::{Head, RefRecord};
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_diff::PathChange;
use crate::artifacts::ignore::IGNORE_FILE;
use crate::artifacts::ignore::patterns::IgnorePatterns;
use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::index::tree_builder::TreeBuilder;
use crate::artifacts::merge::conflict::{Conflict, MergeConflicts};
use crate::artifacts::merge::outcome::{MergeOutcome, MergePlan};
use crate::artifacts::merge::resolve::reconcile;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::status_info::{Status, StatusInfo};
use crate::errors::{RepoError, RepoResult};
use anyhow::Context;
use bytes::Bytes;
use std::cell::{RefCell, RefMut};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Name of the repository directory inside the working tree
pub const REPO_DIR: &str = ".repo";

pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn Write>>,
    index: Arc<Mutex<Index>>,
    database: Database,
    workspace: Workspace,
    refs: Refs,
}

impl Repository {
    /// Handle on `path`, whether or not a repository exists there yet
    pub fn new(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Unable to create directory {}", path.display()))?;
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("Unable to resolve {}", path.display()))?;
        let repo_path = path.join(REPO_DIR);

        Ok(Repository {
            index: Arc::new(Mutex::new(Index::new(
                repo_path.join("index").into_boxed_path(),
            ))),
            database: Database::new(repo_path.join("objects").into_boxed_path()),
            workspace: Workspace::new(path.clone().into_boxed_path()),
            refs: Refs::new(repo_path.into_boxed_path()),
            writer: RefCell::new(writer),
            path: path.into_boxed_path(),
        })
    }

    /// Handle on an existing repository
    pub fn open(path: &Path, writer: Box<dyn Write>) -> RepoResult<Self> {
        if !path.join(REPO_DIR).join("HEAD").is_file() {
            return Err(RepoError::NotARepository(path.to_path_buf()));
        }

        Ok(Self::new(path, writer)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repo_path(&self) -> PathBuf {
        self.path.join(REPO_DIR)
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }

    pub fn index(&self) -> Arc<Mutex<Index>> {
        self.index.clone()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn is_initialized(&self) -> bool {
        self.refs.head_path().is_file()
    }

    /// Create the object store, `refs/heads` and an unborn default branch
    pub fn init_storage(&self) -> RepoResult<()> {
        if self.is_initialized() {
            return Err(RepoError::AlreadyInitialized(self.repo_path()));
        }

        std::fs::create_dir_all(self.database.objects_path()).with_context(|| {
            format!("Unable to create {}", self.database.objects_path().display())
        })?;
        self.refs.init_head(&BranchName::default_branch())?;

        info!(path = %self.repo_path().display(), "initialized repository");
        Ok(())
    }

    pub fn ignore_patterns(&self) -> anyhow::Result<IgnorePatterns> {
        IgnorePatterns::load(&self.path.join(IGNORE_FILE))
    }

    /// Append patterns to the ignore file; returns the ones that were new
    pub fn add_ignore_patterns(&self, patterns: &[String]) -> anyhow::Result<Vec<String>> {
        let mut ignore = self.ignore_patterns()?;
        let mut added = Vec::new();

        for pattern in patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() || ignore.patterns().iter().any(|p| p == pattern) {
                continue;
            }
            ignore.add(pattern)?;
            added.push(pattern.to_string());
        }

        if !added.is_empty() {
            let ignore_path = self.path.join(IGNORE_FILE);
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&ignore_path)
                .with_context(|| format!("Unable to open {}", ignore_path.display()))?;
            for pattern in &added {
                writeln!(file, "{pattern}")?;
            }
        }

        Ok(added)
    }

    /// The commit a revision expression names
    pub fn resolve(&self, revision: &str) -> RepoResult<ObjectId> {
        Revision::try_parse(revision)?
            .resolve(&self.refs, &self.database)
            .map_err(|error| match error {
                RepoError::NotFound(_)
                | RepoError::InvalidBranchName(_)
                | RepoError::WrongObjectType { .. } => RepoError::UnknownRef(revision.to_string()),
                error => error,
            })
    }

    pub fn head_commit(&self) -> RepoResult<Option<ObjectId>> {
        self.refs.head_commit()
    }

    pub fn head_tree(&self) -> RepoResult<Option<ObjectId>> {
        self.head_commit()?
            .map(|oid| self.commit_tree(&oid))
            .transpose()
    }

    fn commit_tree(&self, commit_id: &ObjectId) -> RepoResult<ObjectId> {
        Ok(self.database.load_commit(commit_id)?.tree_oid().clone())
    }

    /// Store `data` as a blob and stage it at `path`
    pub async fn stage_file(
        &self,
        path: &Path,
        data: impl Into<Bytes>,
        mode: FileMode,
    ) -> RepoResult<ObjectId> {
        let oid = self.database.put_blob(data)?;

        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;
        index.stage(path, oid.clone(), mode)?;
        index.write_updates()?;

        Ok(oid)
    }

    pub async fn stage_delete(&self, path: &Path) -> RepoResult<()> {
        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;
        index.stage_delete(path)?;
        index.write_updates()
    }

    /// Record the staged changes as a commit on top of HEAD
    ///
    /// A pending `MERGE_HEAD` becomes the second parent and is cleared.
    pub async fn commit_staged(&self, author: Author, message: &str) -> RepoResult<ObjectId> {
        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let head = self.head_commit()?;
        let merge_head = self.refs.read_merge_head()?;
        if index.is_empty() && merge_head.is_none() {
            return Err(RepoError::NothingToCommit);
        }

        let base_tree = head.as_ref().map(|oid| self.commit_tree(oid)).transpose()?;
        let tree = index.build_tree(&self.database, base_tree.as_ref())?;
        if merge_head.is_none() && base_tree.as_ref() == Some(&tree) {
            return Err(RepoError::NothingToCommit);
        }

        let parents = head.into_iter().chain(merge_head).collect::<Vec<_>>();
        let commit = Commit::new(parents, tree, author, message.trim().to_string());
        let commit_id = self.database.put_commit(&commit)?;
        self.refs.update_head(&commit_id)?;

        index.clear();
        index.write_updates()?;
        self.refs.clear_merge_head()?;

        info!(oid = %commit_id, parents = commit.parents().len(), "created commit");
        Ok(commit_id)
    }

    /// New branch at `start` (HEAD when absent)
    pub fn create_branch(&self, name: &str, start: Option<&str>) -> RepoResult<ObjectId> {
        let name = BranchName::try_parse(name)?;
        let oid = match start {
            Some(start) => self.resolve(start)?,
            None => self
                .head_commit()?
                .ok_or_else(|| RepoError::UnknownRef("HEAD".to_string()))?,
        };

        self.refs.create_branch(&name, &oid)?;
        Ok(oid)
    }

    pub fn delete_branch(&self, name: &str) -> RepoResult<ObjectId> {
        self.refs.delete_branch(&BranchName::try_parse(name)?)
    }

    pub fn list_branches(&self) -> RepoResult<Vec<RefRecord>> {
        self.refs.list_branches()
    }

    /// Point HEAD at a branch (or detach it at a commit) and rewrite the
    /// working tree to match
    ///
    /// Refuses when staged paths overlap what the switch would change. Staged
    /// changes elsewhere stay staged.
    pub async fn checkout(&self, target: &str) -> RepoResult<Head> {
        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;
        self.ensure_no_pending_merge()?;

        let branch = BranchName::try_parse(target)
            .ok()
            .filter(|name| self.refs.branch_exists(name));
        let (head, target_oid) = match branch {
            Some(name) => {
                let oid = self
                    .refs
                    .read_branch(&name)?
                    .ok_or_else(|| RepoError::UnknownRef(target.to_string()))?;
                (Head::Branch(name), oid)
            }
            None => {
                let oid = self.resolve(target)?;
                (Head::Detached(oid.clone()), oid)
            }
        };

        let current_tree = self.head_tree()?;
        let target_tree = self.commit_tree(&target_oid)?;
        let changes = self
            .database
            .tree_diff(current_tree.as_ref(), Some(&target_tree))?;
        self.ensure_clean_staging(&index, &changes)?;

        Migration::new(&self.database, &self.workspace, changes).apply_changes()?;
        self.refs.set_head(&head)?;

        debug!(target, oid = %target_oid, "checked out");
        Ok(head)
    }

    /// A recorded conflicted merge must be concluded by a commit on its branch
    fn ensure_no_pending_merge(&self) -> RepoResult<()> {
        match self.refs.read_merge_head()? {
            Some(merge_head) => Err(RepoError::MergeInProgress(merge_head)),
            None => Ok(()),
        }
    }

    fn ensure_clean_staging(&self, index: &Index, changes: &[PathChange]) -> RepoResult<()> {
        let paths = changes
            .iter()
            .map(|change| change.path.clone())
            .collect::<Vec<_>>();
        let overlapping = index.overlapping(&paths);

        if overlapping.is_empty() {
            Ok(())
        } else {
            Err(RepoError::DirtyStaging(overlapping))
        }
    }

    /// Merge `source` into the current branch
    ///
    /// On conflicts nothing is written but objects; the returned
    /// `MergeConflict` carries what `record_merge_conflicts` needs.
    pub async fn merge(
        &self,
        source: &str,
        author: Author,
        message: Option<&str>,
    ) -> RepoResult<MergeOutcome> {
        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        // tips are read under the lock so no commit can land in between
        let Head::Branch(branch) = self.refs.read_head()? else {
            return Err(RepoError::DetachedHead);
        };
        self.ensure_no_pending_merge()?;
        let ours = self
            .refs
            .read_branch(&branch)?
            .ok_or_else(|| RepoError::UnknownRef("HEAD".to_string()))?;
        let theirs = self.resolve(source)?;

        match self.prepare_merge(&ours, &theirs, &index)? {
            MergePlan::AlreadyUpToDate { head } => {
                info!(%head, "already up to date");
                Ok(MergeOutcome::AlreadyUpToDate { head })
            }
            MergePlan::FastForward { from, to } => {
                let changes = self
                    .database
                    .tree_diff(Some(&self.commit_tree(&from)?), Some(&self.commit_tree(&to)?))?;
                Migration::new(&self.database, &self.workspace, changes).apply_changes()?;
                self.refs.set_branch(&branch, &to)?;

                info!(%from, %to, "fast-forward");
                Ok(MergeOutcome::FastForward { from, to })
            }
            MergePlan::ThreeWay {
                ours,
                theirs,
                base,
                tree,
            } => {
                let message = message
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Merge {source} into {branch}"));
                let commit = Commit::new(vec![ours.clone(), theirs], tree.clone(), author, message);
                let commit_id = self.database.put_commit(&commit)?;

                let changes = self
                    .database
                    .tree_diff(Some(&self.commit_tree(&ours)?), Some(&tree))?;
                Migration::new(&self.database, &self.workspace, changes).apply_changes()?;
                self.refs.set_branch(&branch, &commit_id)?;

                info!(commit = %commit_id, %base, "merged");
                Ok(MergeOutcome::Merged {
                    commit: commit_id,
                    base,
                })
            }
            MergePlan::Conflicted(conflicts) => {
                warn!(count = conflicts.conflicts.len(), "merge stopped on conflicts");
                Err(RepoError::MergeConflict(conflicts))
            }
        }
    }

    /// Classify a merge of `theirs` into `ours` and store the merged tree if clean
    pub fn prepare_merge(
        &self,
        ours: &ObjectId,
        theirs: &ObjectId,
        index: &Index,
    ) -> RepoResult<MergePlan> {
        if ours == theirs {
            return Ok(MergePlan::AlreadyUpToDate { head: ours.clone() });
        }

        let base = self
            .database
            .bca_finder()
            .find_best_common_ancestor(ours, theirs)?
            .ok_or_else(|| RepoError::UnrelatedHistories {
                ours: ours.clone(),
                theirs: theirs.clone(),
            })?;

        if &base == theirs {
            return Ok(MergePlan::AlreadyUpToDate { head: ours.clone() });
        }

        let ours_tree = self.commit_tree(ours)?;
        let theirs_tree = self.commit_tree(theirs)?;

        if &base == ours {
            let incoming = self.database.tree_diff(Some(&ours_tree), Some(&theirs_tree))?;
            self.ensure_clean_staging(index, &incoming)?;
            return Ok(MergePlan::FastForward {
                from: ours.clone(),
                to: theirs.clone(),
            });
        }

        let base_tree = self.commit_tree(&base)?;
        let ours_changes = self.database.tree_diff(Some(&base_tree), Some(&ours_tree))?;
        let theirs_changes = self.database.tree_diff(Some(&base_tree), Some(&theirs_tree))?;
        self.ensure_clean_staging(index, &theirs_changes)?;

        let reconciliation = reconcile(&ours_changes, &theirs_changes);
        debug!(
            ours = ours_changes.len(),
            theirs = theirs_changes.len(),
            conflicts = reconciliation.conflicts.len(),
            "reconciled changes"
        );

        if !reconciliation.is_clean() {
            return Ok(MergePlan::Conflicted(Box::new(MergeConflicts::new(
                ours.clone(),
                theirs.clone(),
                base,
                reconciliation.conflicts.clone(),
                reconciliation.accepted_list(),
            ))));
        }

        let mut builder = TreeBuilder::new(&self.database, Some(&base_tree))?;
        for (path, entry) in reconciliation.accepted {
            builder.apply(&path, entry)?;
        }
        let tree = builder.write()?;

        Ok(MergePlan::ThreeWay {
            ours: ours.clone(),
            theirs: theirs.clone(),
            base,
            tree,
        })
    }

    /// Leave a conflicted merge in the working tree for the user to finish
    ///
    /// Clean changes coming from the other side are written and staged, each
    /// conflicted file gets inline markers, and `MERGE_HEAD` is recorded so the
    /// next commit gets both parents.
    pub async fn record_merge_conflicts(
        &self,
        conflicts: &MergeConflicts,
        source_label: &str,
    ) -> RepoResult<()> {
        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let ours_files = self.flatten_tree(Some(&self.commit_tree(&conflicts.ours)?))?;
        let incoming = conflicts
            .accepted
            .iter()
            .filter_map(|(path, entry)| {
                PathChange::from_entries(path.clone(), ours_files.get(path).cloned(), entry.clone())
            })
            .collect::<Vec<_>>();

        Migration::new(&self.database, &self.workspace, incoming.clone()).apply_changes()?;

        for change in &incoming {
            match &change.new {
                Some(entry) => {
                    index.stage(&change.path, entry.oid.clone(), FileMode::try_from(entry.mode)?)?
                }
                None => index.stage_delete(&change.path)?,
            }
        }

        for conflict in &conflicts.conflicts {
            self.write_conflict(conflict, source_label)?;
        }

        self.refs.write_merge_head(&conflicts.theirs)?;
        index.write_updates()?;

        Ok(())
    }

    /// Every file of a tree with its entry; `None` is the empty tree
    pub fn flatten_tree(
        &self,
        tree_oid: Option<&ObjectId>,
    ) -> RepoResult<BTreeMap<PathBuf, DatabaseEntry>> {
        Ok(self
            .database
            .tree_diff(None, tree_oid)?
            .into_iter()
            .filter_map(|change| change.new.map(|entry| (change.path, entry)))
            .collect())
    }

    fn write_conflict(&self, conflict: &Conflict, source_label: &str) -> RepoResult<()> {
        let blocked = conflict
            .path
            .ancestors()
            .skip(1)
            .any(|parent| !parent.as_os_str().is_empty() && self.workspace.is_file(parent));
        if blocked {
            warn!(path = %conflict.path.display(), "conflict path lies under a file, left untouched");
            return Ok(());
        }

        let (data, mode) = match (&conflict.ours, &conflict.theirs) {
            (Some(ours), Some(theirs)) => {
                let mut data = Vec::new();
                data.extend_from_slice(b"<<<<<<< ours\n");
                self.append_side(&mut data, ours)?;
                data.extend_from_slice(b"=======\n");
                self.append_side(&mut data, theirs)?;
                data.extend_from_slice(format!(">>>>>>> {source_label}\n").as_bytes());
                (data, FileMode::try_from(ours.mode)?)
            }
            (Some(entry), None) | (None, Some(entry)) => {
                if self.workspace.is_dir(&conflict.path) {
                    return Ok(());
                }
                let data = self.database.load_blob(&entry.oid)?.into_data();
                (data.to_vec(), FileMode::try_from(entry.mode)?)
            }
            (None, None) => return Ok(()),
        };

        self.workspace.write_file(&conflict.path, &data, mode)?;
        Ok(())
    }

    fn append_side(&self, data: &mut Vec<u8>, entry: &DatabaseEntry) -> RepoResult<()> {
        let content = self.database.load_blob(&entry.oid)?.into_data();
        data.extend_from_slice(&content);
        if !content.is_empty() && !content.ends_with(b"\n") {
            data.push(b'\n');
        }

        Ok(())
    }

    /// File changes between the trees of two revisions
    pub fn diff_revisions(&self, old: &str, new: &str) -> RepoResult<Vec<PathChange>> {
        let old_tree = self.commit_tree(&self.resolve(old)?)?;
        let new_tree = self.commit_tree(&self.resolve(new)?)?;

        self.database.tree_diff(Some(&old_tree), Some(&new_tree))
    }

    pub async fn status_info(&self) -> RepoResult<StatusInfo> {
        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let ignore = self.ignore_patterns()?;
        let head_tree = self.head_tree()?;

        Ok(Status::new(&self.database, &self.workspace, &ignore)
            .initialize(&index, head_tree.as_ref())?)
    }

    /// Copy this repository into a new directory and check out its HEAD there
    pub fn clone_into(&self, target: &Path) -> RepoResult<Repository> {
        if target.exists() {
            return Err(anyhow::anyhow!(
                "destination path '{}' already exists",
                target.display()
            )
            .into());
        }

        let clone = Repository::new(target, Box::new(std::io::sink()))?;
        clone.init_storage()?;

        let objects = clone
            .database
            .import_objects(self.database.export_all_objects()?)?;
        let branches = clone.refs.import_refs(self.refs.export_all_refs()?)?;
        clone.refs.set_head(&self.refs.read_head()?)?;

        if let Some(tree) = clone.head_tree()? {
            let changes = clone.database.tree_diff(None, Some(&tree))?;
            Migration::new(&clone.database, &clone.workspace, changes).apply_changes()?;
        }

        info!(objects, branches, target = %clone.path.display(), "cloned repository");
        Ok(clone)
    }
}
