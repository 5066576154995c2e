//! Tree-level diff
//!
//! Compares two trees entry by entry and records one `PathChange` per file whose
//! blob or mode differs. Subtrees with equal ids are skipped without being loaded.
//! A file replaced by a directory (or the reverse) shows up as a removal at that
//! path plus additions for everything underneath.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepoResult;
use bitflags::bitflags;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DiffFilter: u32 {
        const ADDED = 0b0001;
        const REMOVED = 0b0010;
        const MODIFIED = 0b0100;
    }
}

impl DiffFilter {
    /// Parse a filter such as `AM`; `None` for unknown letters
    pub fn try_parse(s: &str) -> Option<Self> {
        let mut filter = Self::empty();

        for c in s.chars() {
            match c {
                'A' => filter |= Self::ADDED,
                'D' => filter |= Self::REMOVED,
                'M' => filter |= Self::MODIFIED,
                _ => return None,
            }
        }

        Some(filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    pub fn status_char(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Removed => 'D',
            ChangeKind::Modified => 'M',
        }
    }

    pub fn matches_filter(&self, filter: DiffFilter) -> bool {
        match self {
            ChangeKind::Added => filter.contains(DiffFilter::ADDED),
            ChangeKind::Removed => filter.contains(DiffFilter::REMOVED),
            ChangeKind::Modified => filter.contains(DiffFilter::MODIFIED),
        }
    }
}

/// One changed file: `old` is absent for additions, `new` for removals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub old: Option<DatabaseEntry>,
    pub new: Option<DatabaseEntry>,
}

impl PathChange {
    pub fn from_entries(
        path: PathBuf,
        old: Option<DatabaseEntry>,
        new: Option<DatabaseEntry>,
    ) -> Option<Self> {
        let kind = match (&old, &new) {
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Removed,
            (Some(old), Some(new)) if old != new => ChangeKind::Modified,
            _ => return None,
        };

        Some(PathChange {
            path,
            kind,
            old,
            new,
        })
    }
}

pub type ChangeSet = BTreeMap<PathBuf, PathChange>;
pub type TreeEntryMap = BTreeMap<String, DatabaseEntry>;

/// Order paths by their raw bytes, so `a-b` sorts before `a/b`
pub fn sort_by_path_bytes(changes: &mut [PathChange]) {
    changes.sort_by(|a, b| {
        a.path
            .as_os_str()
            .as_encoded_bytes()
            .cmp(b.path.as_os_str().as_encoded_bytes())
    });
}

#[derive(Debug)]
pub struct TreeDiff<'r> {
    database: &'r Database,
    change_set: ChangeSet,
}

impl<'r> TreeDiff<'r> {
    pub fn new(database: &'r Database) -> Self {
        TreeDiff {
            database,
            change_set: BTreeMap::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.change_set
    }

    /// Changes in byte-lexicographic path order
    pub fn into_changes(self) -> Vec<PathChange> {
        let mut changes = self.change_set.into_values().collect::<Vec<_>>();
        sort_by_path_bytes(&mut changes);
        changes
    }

    pub fn compare_oids(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        prefix: &Path,
    ) -> RepoResult<()> {
        if old == new {
            return Ok(());
        }

        let old_tree_entries = self.inflate_oid_to_tree_entries(old)?;
        let new_tree_entries = self.inflate_oid_to_tree_entries(new)?;

        self.detect_deletions(&old_tree_entries, &new_tree_entries, prefix)?;
        self.detect_additions(&old_tree_entries, &new_tree_entries, prefix)?;

        Ok(())
    }

    fn inflate_oid_to_tree_entries(&self, oid: Option<&ObjectId>) -> RepoResult<TreeEntryMap> {
        match oid {
            None => Ok(BTreeMap::new()),
            Some(oid) => Ok(self.database.load_tree(oid)?.into_entries().collect()),
        }
    }

    fn detect_deletions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &Path,
    ) -> RepoResult<()> {
        for (name, entry) in old {
            let path = prefix.join(name);
            let other = new.get(name);

            if other == Some(entry) {
                continue;
            }

            let tree_a_oid = entry.is_tree().then_some(&entry.oid);
            let tree_b_oid = other.filter(|other| other.is_tree()).map(|other| &other.oid);
            self.compare_oids(tree_a_oid, tree_b_oid, &path)?;

            let blob_a = (!entry.is_tree()).then(|| entry.clone());
            let blob_b = other.filter(|other| !other.is_tree()).cloned();

            if let Some(change) = PathChange::from_entries(path.clone(), blob_a, blob_b) {
                self.change_set.insert(path, change);
            }
        }

        Ok(())
    }

    fn detect_additions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &Path,
    ) -> RepoResult<()> {
        for (name, entry) in new {
            if old.contains_key(name) {
                continue;
            }

            let path = prefix.join(name);
            if entry.is_tree() {
                self.compare_oids(None, Some(&entry.oid), &path)?;
            } else if let Some(change) = PathChange::from_entries(path.clone(), None, Some(entry.clone())) {
                self.change_set.insert(path, change);
            }
        }

        Ok(())
    }
}
