//! Tree object
//!
//! Trees are directory snapshots: a name-ordered list of entries, each pointing
//! at a blob (file) or another tree (subdirectory). Because entries are kept in
//! byte order of their names, two trees with the same recursive content always
//! serialize, and therefore hash, identically.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<octal-mode> <type> <name>\0<32-byte-id>`

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Object, Packable, Unpackable, frame};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{RepoError, RepoResult};
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, DatabaseEntry>,
}

impl Tree {
    /// Build a tree from an explicit entry list
    ///
    /// The list must be sorted by name with no duplicates, and every name must be
    /// a single non-empty path segment. Anything else is a `MalformedTree`.
    pub fn try_from_entries(entries: Vec<(String, DatabaseEntry)>) -> RepoResult<Self> {
        for (name, _) in &entries {
            validate_entry_name(name)?;
        }

        for pair in entries.windows(2) {
            let (previous, next) = (&pair[0].0, &pair[1].0);
            match previous.as_bytes().cmp(next.as_bytes()) {
                std::cmp::Ordering::Less => {}
                std::cmp::Ordering::Equal => {
                    return Err(RepoError::MalformedTree(format!(
                        "duplicate entry name '{previous}'"
                    )));
                }
                std::cmp::Ordering::Greater => {
                    return Err(RepoError::MalformedTree(format!(
                        "entry '{next}' is out of order after '{previous}'"
                    )));
                }
            }
        }

        Ok(Tree {
            entries: entries.into_iter().collect(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_entry_name(name: &str) -> RepoResult<()> {
    if name.is_empty() {
        return Err(RepoError::MalformedTree("empty entry name".to_string()));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(RepoError::MalformedTree(format!(
            "entry name '{}' is not a single path segment",
            name.escape_default()
        )));
    }

    Ok(())
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content = Vec::new();

        for (name, entry) in &self.entries {
            let header = format!(
                "{:o} {} {}",
                entry.mode.as_u32(),
                entry.mode.object_type(),
                name
            );
            content.write_all(header.as_bytes())?;
            content.push(0);
            entry.oid.write_raw_to(&mut content)?;
        }

        frame(self.object_type(), &content)
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = Vec::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut field = Vec::new();

        loop {
            field.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut field)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if field.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }
            let mode = EntryMode::from_octal_str(std::str::from_utf8(&field)?)?;

            field.clear();
            reader.read_until(b' ', &mut field)?;
            if field.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in type"));
            }
            let object_type = ObjectType::try_from(std::str::from_utf8(&field)?)?;
            if object_type != mode.object_type() {
                return Err(anyhow::anyhow!(
                    "entry type {object_type} does not match mode {mode}"
                ));
            }

            field.clear();
            reader.read_until(b'\0', &mut field)?;
            if field.pop() != Some(b'\0') {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            let name = std::str::from_utf8(&field)?.to_owned();

            let oid = ObjectId::read_raw_from(&mut reader).context("unexpected EOF in object id")?;

            entries.push((name, DatabaseEntry::new(oid, mode)));
        }

        Ok(Tree::try_from_entries(entries)?)
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(name, entry)| {
                format!(
                    "{} {} {}\t{}",
                    entry.mode.as_str(),
                    entry.mode.object_type(),
                    entry.oid,
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::FileMode;
    use crate::artifacts::objects::hasher;
    use pretty_assertions::assert_eq;

    fn file(content: &str) -> DatabaseEntry {
        DatabaseEntry::file(hasher::hash(content.as_bytes()), FileMode::Regular)
    }

    #[test]
    fn rejects_unsorted_entries() {
        let result = Tree::try_from_entries(vec![
            ("b.txt".to_string(), file("b")),
            ("a.txt".to_string(), file("a")),
        ]);

        assert!(matches!(result, Err(RepoError::MalformedTree(_))));
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = Tree::try_from_entries(vec![
            ("a.txt".to_string(), file("a")),
            ("a.txt".to_string(), file("b")),
        ]);

        assert!(matches!(result, Err(RepoError::MalformedTree(_))));
    }

    #[test]
    fn rejects_names_with_separators() {
        let result = Tree::try_from_entries(vec![("a/b.txt".to_string(), file("a"))]);

        assert!(matches!(result, Err(RepoError::MalformedTree(_))));
    }

    #[test]
    fn serialization_survives_a_reload() {
        let tree = Tree::try_from_entries(vec![
            ("a.txt".to_string(), file("a")),
            ("dir".to_string(), DatabaseEntry::directory(hasher::hash(b"dir"))),
            (
                "run.sh".to_string(),
                DatabaseEntry::file(hasher::hash(b"#!/bin/sh"), FileMode::Executable),
            ),
        ])
        .unwrap();

        let mut reader = std::io::Cursor::new(tree.serialize().unwrap());
        assert_eq!(
            ObjectType::parse_object_type(&mut reader).unwrap(),
            ObjectType::Tree
        );
        assert_eq!(Tree::deserialize(reader).unwrap(), tree);
    }

    #[test]
    fn identical_content_yields_identical_ids() {
        let first = Tree::try_from_entries(vec![
            ("a.txt".to_string(), file("a")),
            ("b.txt".to_string(), file("b")),
        ])
        .unwrap();
        let second = Tree::try_from_entries(vec![
            ("a.txt".to_string(), file("a")),
            ("b.txt".to_string(), file("b")),
        ])
        .unwrap();

        assert_eq!(first.object_id().unwrap(), second.object_id().unwrap());
    }
}
