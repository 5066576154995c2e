//! Branch refs and HEAD
//!
//! Refs are small text files under the repository directory:
//!
//! - `HEAD`: `ref: refs/heads/<name>` or a commit id (detached)
//! - `refs/heads/<name>`: the commit id a branch points to
//! - `MERGE_HEAD`: the incoming commit of a merge waiting for conflict resolution
//!
//! Every write goes to `<file>.lock` under an exclusive file lock and is then
//! renamed over the ref, so a reader sees either the old or the new value.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::head::{Head, RefRecord};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepoError, RepoResult};
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const HEAD_FILE: &str = "HEAD";
const MERGE_HEAD_FILE: &str = "MERGE_HEAD";
const LOCK_SUFFIX: &str = ".lock";

#[derive(Debug, new)]
pub struct Refs {
    /// The repository directory (`.repo`)
    path: Box<Path>,
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_FILE)
    }

    pub fn heads_path(&self) -> PathBuf {
        self.path.join("refs").join("heads")
    }

    fn merge_head_path(&self) -> PathBuf {
        self.path.join(MERGE_HEAD_FILE)
    }

    fn branch_path(&self, name: &BranchName) -> PathBuf {
        self.path.join(name.ref_path())
    }

    /// Create `refs/heads` and point HEAD at the (unborn) `branch`
    pub fn init_head(&self, branch: &BranchName) -> RepoResult<()> {
        std::fs::create_dir_all(self.heads_path())
            .with_context(|| format!("Unable to create {}", self.heads_path().display()))?;
        self.set_head(&Head::Branch(branch.clone()))
    }

    pub fn read_head(&self) -> RepoResult<Head> {
        let content = std::fs::read_to_string(self.head_path())
            .with_context(|| format!("Unable to read {}", self.head_path().display()))?;

        Head::try_parse(&content)
    }

    pub fn set_head(&self, head: &Head) -> RepoResult<()> {
        write_ref_file(&self.head_path(), &head.to_content())?;
        debug!(head = %head.to_content().trim(), "moved HEAD");
        Ok(())
    }

    /// Commit HEAD resolves to; `None` while the current branch is unborn
    pub fn head_commit(&self) -> RepoResult<Option<ObjectId>> {
        match self.read_head()? {
            Head::Branch(name) => self.read_branch(&name),
            Head::Detached(oid) => Ok(Some(oid)),
        }
    }

    /// Advance whatever HEAD points at: the current branch, or HEAD itself when detached
    pub fn update_head(&self, oid: &ObjectId) -> RepoResult<()> {
        match self.read_head()? {
            Head::Branch(name) => self.set_branch(&name, oid),
            Head::Detached(_) => self.set_head(&Head::Detached(oid.clone())),
        }
    }

    pub fn is_current_branch(&self, name: &BranchName) -> RepoResult<bool> {
        Ok(self.read_head()?.branch() == Some(name))
    }

    pub fn branch_exists(&self, name: &BranchName) -> bool {
        self.branch_path(name).is_file()
    }

    pub fn read_branch(&self, name: &BranchName) -> RepoResult<Option<ObjectId>> {
        let path = self.branch_path(name);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Unable to read ref {}", path.display()))?;
        let oid = ObjectId::try_parse(content.trim().to_string())
            .with_context(|| format!("Ref {} does not hold a commit id", path.display()))?;

        Ok(Some(oid))
    }

    pub fn create_branch(&self, name: &BranchName, oid: &ObjectId) -> RepoResult<()> {
        if self.branch_exists(name) {
            return Err(RepoError::BranchExists(name.clone()));
        }

        self.set_branch(name, oid)
    }

    /// Point `name` at `oid`, creating the branch if needed
    pub fn set_branch(&self, name: &BranchName, oid: &ObjectId) -> RepoResult<()> {
        write_ref_file(&self.branch_path(name), &format!("{oid}\n"))?;
        debug!(branch = %name, %oid, "updated branch");
        Ok(())
    }

    /// Remove a branch that is not checked out; returns the commit it pointed to
    pub fn delete_branch(&self, name: &BranchName) -> RepoResult<ObjectId> {
        if self.is_current_branch(name)? {
            return Err(anyhow::anyhow!("cannot delete the checked out branch '{name}'").into());
        }

        let oid = self
            .read_branch(name)?
            .ok_or_else(|| RepoError::UnknownRef(name.to_string()))?;
        let path = self.branch_path(name);
        std::fs::remove_file(&path)
            .with_context(|| format!("Unable to delete ref {}", path.display()))?;

        self.prune_empty_parents(&path)?;
        debug!(branch = %name, "deleted branch");

        Ok(oid)
    }

    /// All branches in name order
    pub fn list_branches(&self) -> RepoResult<Vec<RefRecord>> {
        let heads_path = self.heads_path();
        if !heads_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in WalkDir::new(&heads_path).min_depth(1) {
            let entry = entry.with_context(|| format!("Unable to list {}", heads_path.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(name) = entry
                .path()
                .strip_prefix(&heads_path)
                .ok()
                .and_then(Path::to_str)
                .filter(|name| !name.ends_with(LOCK_SUFFIX))
            else {
                continue;
            };

            let name = BranchName::try_parse(name.replace(std::path::MAIN_SEPARATOR, "/"))?;
            if let Some(oid) = self.read_branch(&name)? {
                records.push(RefRecord::new(name, oid));
            }
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    pub fn read_merge_head(&self) -> RepoResult<Option<ObjectId>> {
        let path = self.merge_head_path();
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Unable to read {}", path.display()))?;
        let oid = ObjectId::try_parse(content.trim().to_string())
            .with_context(|| format!("{} does not hold a commit id", path.display()))?;

        Ok(Some(oid))
    }

    pub fn write_merge_head(&self, oid: &ObjectId) -> RepoResult<()> {
        write_ref_file(&self.merge_head_path(), &format!("{oid}\n"))
    }

    pub fn clear_merge_head(&self) -> RepoResult<()> {
        let path = self.merge_head_path();
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Unable to remove {}", path.display()))?;
        }

        Ok(())
    }

    pub fn export_all_refs(&self) -> RepoResult<Vec<RefRecord>> {
        self.list_branches()
    }

    /// Add branches from another repository; returns how many were created
    ///
    /// Existing branches are left alone, even when they point elsewhere.
    pub fn import_refs(&self, records: Vec<RefRecord>) -> RepoResult<usize> {
        let mut imported = 0;

        for record in records {
            match self.read_branch(&record.name)? {
                Some(existing) if existing == record.oid => {}
                Some(existing) => {
                    warn!(branch = %record.name, %existing, incoming = %record.oid, "keeping existing branch");
                }
                None => {
                    self.set_branch(&record.name, &record.oid)?;
                    imported += 1;
                }
            }
        }

        Ok(imported)
    }

    fn prune_empty_parents(&self, path: &Path) -> RepoResult<()> {
        let heads_path = self.heads_path();
        let mut current = path.parent();

        while let Some(dir) = current {
            if dir == heads_path || !dir.starts_with(&heads_path) {
                break;
            }
            let is_empty = std::fs::read_dir(dir)?.next().is_none();
            if !is_empty {
                break;
            }
            std::fs::remove_dir(dir)?;
            current = dir.parent();
        }

        Ok(())
    }
}

/// Replace the content of a ref file through `<file>.lock`
fn write_ref_file(path: &Path, content: &str) -> RepoResult<()> {
    let parent = path
        .parent()
        .with_context(|| format!("Invalid ref path {}", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Unable to create ref directory {}", parent.display()))?;

    let mut lock_name = path.as_os_str().to_owned();
    lock_name.push(LOCK_SUFFIX);
    let lock_path = PathBuf::from(lock_name);

    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Unable to open ref lock {}", lock_path.display()))?;
    let mut lock = file_guard::lock(&mut lock_file, Lock::Exclusive, 0, 1)?;
    lock.deref_mut().write_all(content.as_bytes())?;
    lock.deref_mut().sync_all()?;
    drop(lock);

    std::fs::rename(&lock_path, path)
        .with_context(|| format!("Unable to update ref {}", path.display()))?;

    Ok(())
}
