//! Tree overlay
//!
//! Applies path-level changes on top of an existing tree and writes only the
//! directories that were touched. Subtrees off the changed paths stay as the
//! original entries and keep their ids; directories left empty are pruned.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepoResult;
use anyhow::anyhow;
use std::collections::BTreeMap;
use std::path::{Component, Path};

#[derive(Debug, Clone)]
enum Node {
    /// A file, or a subtree that has not been expanded
    Entry(DatabaseEntry),
    /// An expanded directory
    Dir(BTreeMap<String, Node>),
}

#[derive(Debug)]
pub struct TreeBuilder<'r> {
    database: &'r Database,
    root: BTreeMap<String, Node>,
}

impl<'r> TreeBuilder<'r> {
    /// Start from `base`, or from the empty tree
    pub fn new(database: &'r Database, base: Option<&ObjectId>) -> RepoResult<Self> {
        let root = match base {
            Some(oid) => expand(database, oid)?,
            None => BTreeMap::new(),
        };

        Ok(TreeBuilder { database, root })
    }

    /// Put `entry` at `path`, or remove whatever is there when `entry` is `None`
    ///
    /// Files standing where a directory is needed are replaced. Removing a path
    /// below a file or below nothing leaves the tree as it is.
    pub fn apply(&mut self, path: &Path, entry: Option<DatabaseEntry>) -> RepoResult<()> {
        let components = path
            .components()
            .map(|component| match component {
                Component::Normal(name) => name
                    .to_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("path {} is not valid UTF-8", path.display())),
                _ => Err(anyhow!("path {} is not a plain relative path", path.display())),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        if components.is_empty() {
            return Err(anyhow!("cannot apply a change to the tree root").into());
        }

        apply_at(self.database, &mut self.root, &components, entry)
    }

    /// Write every touched directory and return the root tree id
    pub fn write(self) -> RepoResult<ObjectId> {
        let entries = write_dir(self.database, self.root)?;
        self.database.put_tree(entries)
    }
}

fn expand(database: &Database, oid: &ObjectId) -> RepoResult<BTreeMap<String, Node>> {
    Ok(database
        .load_tree(oid)?
        .into_entries()
        .map(|(name, entry)| (name, Node::Entry(entry)))
        .collect())
}

fn apply_at(
    database: &Database,
    dir: &mut BTreeMap<String, Node>,
    components: &[String],
    entry: Option<DatabaseEntry>,
) -> RepoResult<()> {
    let Some((name, rest)) = components.split_first() else {
        return Ok(());
    };

    if rest.is_empty() {
        match entry {
            Some(entry) => dir.insert(name.clone(), Node::Entry(entry)),
            None => dir.remove(name),
        };
        return Ok(());
    }

    let replacement = match dir.get(name) {
        Some(Node::Dir(_)) => None,
        Some(Node::Entry(subtree)) if subtree.is_tree() => Some(expand(database, &subtree.oid)?),
        Some(Node::Entry(_)) | None if entry.is_none() => return Ok(()),
        Some(Node::Entry(_)) | None => Some(BTreeMap::new()),
    };
    if let Some(children) = replacement {
        dir.insert(name.clone(), Node::Dir(children));
    }

    match dir.get_mut(name) {
        Some(Node::Dir(children)) => apply_at(database, children, rest, entry),
        _ => Ok(()),
    }
}

fn write_dir(
    database: &Database,
    dir: BTreeMap<String, Node>,
) -> RepoResult<Vec<(String, DatabaseEntry)>> {
    let mut entries = Vec::with_capacity(dir.len());

    for (name, node) in dir {
        match node {
            Node::Entry(entry) => entries.push((name, entry)),
            Node::Dir(children) => {
                let children = write_dir(database, children)?;
                // empty directories are not recorded
                if !children.is_empty() {
                    let oid = database.put_tree(children)?;
                    entries.push((name, DatabaseEntry::directory(oid)));
                }
            }
        }
    }

    Ok(entries)
}
