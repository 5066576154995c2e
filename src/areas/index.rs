//! Staging area
//!
//! Records the pending changes for the next commit as path-level upserts and
//! deletions. The set is persisted to `.repo/index` and survives restarts; a file
//! that fails its checksum or cannot be decoded is reported as `CorruptIndex`
//! and never silently discarded.
//!
//! ## Invariants
//!
//! - No staged path is a proper ancestor of another staged upsert: staging a file
//!   drops staged changes below it and upserts above it
//! - Staging a deletion of a directory drops every staged change below it

use crate::areas::database::Database;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::entry_mode::FileMode;
use crate::artifacts::index::index_entry::{IndexEntry, StagedChange};
use crate::artifacts::index::tree_builder::TreeBuilder;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepoError, RepoResult};
use anyhow::{Context, anyhow};
use byteorder::{ByteOrder, NetworkEndian};
use std::collections::BTreeMap;
use std::io::Read;
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (`.repo/index`)
    path: Box<Path>,
    changes: BTreeMap<PathBuf, StagedChange>,
    /// Set when the staged set differs from what was last loaded or written
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            changes: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn get(&self, path: &Path) -> Option<&StagedChange> {
        self.changes.get(path)
    }

    /// Staged changes in path order
    pub fn entries(&self) -> impl Iterator<Item = (&PathBuf, &StagedChange)> {
        self.changes.iter()
    }

    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.changes.keys().cloned().collect()
    }

    /// Stage `path` to become the given blob on the next commit
    pub fn stage(&mut self, path: &Path, oid: ObjectId, mode: FileMode) -> RepoResult<()> {
        IndexEntry::validate_path(path)?;
        let entry = IndexEntry::new(path.to_path_buf(), StagedChange::upsert(oid, mode));

        self.discard_conflicts(&entry);
        self.changes.insert(entry.path, entry.change);
        self.changed = true;

        Ok(())
    }

    /// Stage the removal of `path` (a file, or a directory and everything under it)
    pub fn stage_delete(&mut self, path: &Path) -> RepoResult<()> {
        IndexEntry::validate_path(path)?;

        self.remove_children(path);
        self.changes.insert(path.to_path_buf(), StagedChange::Delete);
        self.changed = true;

        Ok(())
    }

    /// Drop the staged change at `path` and below it
    pub fn unstage(&mut self, path: &Path) {
        let removed = self.changes.remove(path).is_some();
        let removed_children = self.remove_children(path);

        if removed || removed_children {
            self.changed = true;
        }
    }

    pub fn clear(&mut self) {
        if !self.changes.is_empty() {
            self.changed = true;
        }
        self.changes.clear();
    }

    /// Staged paths that equal, contain or lie under any of `paths`
    pub fn overlapping(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        self.changes
            .keys()
            .filter(|staged| {
                paths
                    .iter()
                    .any(|path| staged.starts_with(path) || path.starts_with(staged))
            })
            .cloned()
            .collect()
    }

    /// Apply the staged changes on top of `base_tree` and store the result
    pub fn build_tree(
        &self,
        database: &Database,
        base_tree: Option<&ObjectId>,
    ) -> RepoResult<ObjectId> {
        let mut builder = TreeBuilder::new(database, base_tree)?;

        for (path, change) in &self.changes {
            builder.apply(path, change.entry().cloned())?;
        }

        builder.write()
    }

    /// Replace the in-memory set with the one on disk
    ///
    /// A missing index file means nothing is staged.
    pub fn rehydrate(&mut self) -> RepoResult<()> {
        self.changes.clear();
        self.changed = false;

        if !self.path.exists() {
            return Ok(());
        }

        let mut index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.path)
            .with_context(|| format!("Unable to open index file {}", self.path.display()))?;
        let mut lock = file_guard::lock(&mut index_file, file_guard::Lock::Shared, 0, 1)?;

        let mut reader = Checksum::new(lock.deref_mut());
        let changes = Self::parse(&mut reader)
            .map_err(|error| RepoError::CorruptIndex(format!("{error:#}")))?;

        self.changes = changes;
        debug!(staged = self.changes.len(), "loaded index");

        Ok(())
    }

    fn parse<R: Read>(reader: &mut Checksum<R>) -> anyhow::Result<BTreeMap<PathBuf, StagedChange>> {
        let header = reader.read(HEADER_SIZE)?;
        if &header[0..4] != SIGNATURE {
            return Err(anyhow!("Invalid index file signature"));
        }

        let version = NetworkEndian::read_u32(&header[4..8]);
        if version != VERSION {
            return Err(anyhow!("Unsupported index file version: {version}"));
        }

        let count = NetworkEndian::read_u32(&header[8..12]);
        let mut changes = BTreeMap::new();
        for _ in 0..count {
            let entry = IndexEntry::deserialize_from(reader)?;
            changes.insert(entry.path, entry.change);
        }

        reader.verify()?;

        Ok(changes)
    }

    /// Persist the staged set; a no-op when nothing changed since the last load
    ///
    /// The new content goes to `index.lock` under an exclusive lock and is
    /// renamed over the index, so readers see either the old or the new set.
    pub fn write_updates(&mut self) -> RepoResult<()> {
        if !self.changed {
            return Ok(());
        }

        let lock_path = self.path.with_extension("lock");

        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Unable to open index lock {}", lock_path.display()))?;
        let mut lock = file_guard::lock(&mut lock_file, file_guard::Lock::Exclusive, 0, 1)?;

        {
            let mut writer = Checksum::new(lock.deref_mut());

            let mut header = [0u8; HEADER_SIZE];
            header[0..4].copy_from_slice(SIGNATURE);
            NetworkEndian::write_u32(&mut header[4..8], VERSION);
            NetworkEndian::write_u32(&mut header[8..12], self.changes.len() as u32);
            writer.write(&header)?;

            for (path, change) in &self.changes {
                let entry = IndexEntry::new(path.clone(), change.clone());
                writer.write(&entry.serialize()?)?;
            }

            writer.write_checksum()?;
        }
        lock.deref_mut().sync_all()?;
        drop(lock);

        std::fs::rename(&lock_path, &self.path)
            .with_context(|| format!("Unable to replace index file {}", self.path.display()))?;
        self.changed = false;

        debug!(staged = self.changes.len(), "wrote index");
        Ok(())
    }

    /// Upserts above the new path and anything staged below it give way
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            if let Some(StagedChange::Upsert(_)) = self.changes.get(parent) {
                self.changes.remove(parent);
            }
        }
        self.remove_children(&entry.path);
    }

    fn remove_children(&mut self, path: &Path) -> bool {
        let children = self
            .changes
            .keys()
            .filter(|staged| staged.as_path() != path && staged.starts_with(path))
            .cloned()
            .collect::<Vec<_>>();

        for child in &children {
            self.changes.remove(child);
        }

        !children.is_empty()
    }
}
