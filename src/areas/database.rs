//! Object database
//!
//! Append-only, content-addressed storage for blobs, trees and commits. Every
//! object lives in `objects/<2 hex>/<62 hex>` as the zlib-compressed form of its
//! serialized bytes; the file name is the SHA-256 of those uncompressed bytes.
//!
//! Writes go to a uniquely named temp file in the fan-out directory and are then
//! renamed into place, so concurrent writers of the same content converge on one
//! complete file and readers never observe a partial object.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::database::object_record::ObjectRecord;
use crate::artifacts::diff::tree_diff::{PathChange, TreeDiff};
use crate::artifacts::log::rev_list::AncestorWalk;
use crate::artifacts::merge::bca_finder::BCAFinder;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::{Commit, SlimCommit};
use crate::artifacts::objects::hasher;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::{RepoError, RepoResult};
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::io::{BufRead, Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store file content; storing the same bytes twice returns the same id
    pub fn put_blob(&self, data: impl Into<Bytes>) -> RepoResult<ObjectId> {
        self.store(&Blob::new(data))
    }

    /// Validate and store a tree built from an explicit entry list
    pub fn put_tree(&self, entries: Vec<(String, DatabaseEntry)>) -> RepoResult<ObjectId> {
        let tree = Tree::try_from_entries(entries)?;
        self.store(&tree)
    }

    /// Store a commit once its tree and every parent are known to exist
    pub fn put_commit(&self, commit: &Commit) -> RepoResult<ObjectId> {
        for parent in commit.parents() {
            match self.object_type(parent) {
                Ok(ObjectType::Commit) => {}
                Ok(_) | Err(RepoError::NotFound(_)) => {
                    return Err(RepoError::DanglingParent(parent.clone()));
                }
                Err(error) => return Err(error),
            }
        }

        let tree_type = self.object_type(commit.tree_oid())?;
        if tree_type != ObjectType::Tree {
            return Err(RepoError::WrongObjectType {
                oid: commit.tree_oid().clone(),
                expected: ObjectType::Tree,
                found: tree_type,
            });
        }

        self.store(commit)
    }

    fn store(&self, object: &impl Object) -> RepoResult<ObjectId> {
        let object_content = object.serialize()?;
        let object_id = hasher::hash(&object_content);
        let object_path = self.path.join(object_id.to_path());

        // write the object to disk unless it already exists
        if !object_path.exists() {
            self.write_object(&object_path, object_content)?;
            debug!(oid = %object_id, kind = %object.object_type(), "stored object");
        } else {
            trace!(oid = %object_id, "object already stored");
        }

        Ok(object_id)
    }

    pub fn contains(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    pub fn get(&self, object_id: &ObjectId) -> RepoResult<ObjectBox> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        let object = match object_type {
            ObjectType::Blob => ObjectBox::Blob(Blob::deserialize(object_reader)?),
            ObjectType::Tree => ObjectBox::Tree(Tree::deserialize(object_reader)?),
            ObjectType::Commit => ObjectBox::Commit(Commit::deserialize(object_reader)?),
        };

        Ok(object)
    }

    pub fn object_type(&self, object_id: &ObjectId) -> RepoResult<ObjectType> {
        let (object_type, _) = self.parse_object_as_bytes(object_id)?;
        Ok(object_type)
    }

    pub fn load_blob(&self, object_id: &ObjectId) -> RepoResult<Blob> {
        let object_reader = self.expect_object_type(object_id, ObjectType::Blob)?;
        Ok(Blob::deserialize(object_reader)?)
    }

    pub fn load_tree(&self, object_id: &ObjectId) -> RepoResult<Tree> {
        let object_reader = self.expect_object_type(object_id, ObjectType::Tree)?;
        Ok(Tree::deserialize(object_reader)?)
    }

    pub fn load_commit(&self, object_id: &ObjectId) -> RepoResult<Commit> {
        let object_reader = self.expect_object_type(object_id, ObjectType::Commit)?;
        Ok(Commit::deserialize(object_reader)?)
    }

    pub fn load_slim_commit(&self, object_id: &ObjectId) -> RepoResult<SlimCommit> {
        Ok(self.load_commit(object_id)?.to_slim(object_id.clone()))
    }

    /// Every commit reachable from `commit_id`, descendants before ancestors
    pub fn walk_ancestors(&self, commit_id: &ObjectId) -> RepoResult<AncestorWalk> {
        AncestorWalk::new(commit_id, |oid| self.load_slim_commit(oid))
    }

    pub fn bca_finder(
        &self,
    ) -> BCAFinder<impl Fn(&ObjectId) -> RepoResult<SlimCommit> + '_> {
        BCAFinder::new(|oid| self.load_slim_commit(oid))
    }

    /// File-level changes between two trees; `None` stands for the empty tree
    pub fn tree_diff(
        &self,
        old_oid: Option<&ObjectId>,
        new_oid: Option<&ObjectId>,
    ) -> RepoResult<Vec<PathChange>> {
        let mut tree_diff = TreeDiff::new(self);
        tree_diff.compare_oids(old_oid, new_oid, Path::new(""))?;
        Ok(tree_diff.into_changes())
    }

    /// Every stored object, in id order
    pub fn export_all_objects(&self) -> RepoResult<Vec<ObjectRecord>> {
        let mut object_ids = self.list_object_ids()?;
        object_ids.sort();

        object_ids
            .into_iter()
            .map(|oid| {
                let data = self.load(&oid)?;
                Ok(ObjectRecord::new(oid, data))
            })
            .collect()
    }

    /// Add objects from another store; returns how many were new
    ///
    /// Each record must hash to its id. Records already present are skipped.
    pub fn import_objects(&self, records: Vec<ObjectRecord>) -> RepoResult<usize> {
        if let Some(corrupt) = records.iter().find(|record| !record.is_intact()) {
            return Err(RepoError::CorruptObject(corrupt.oid.clone()));
        }

        let mut imported = 0;
        for record in records {
            let object_path = self.path.join(record.oid.to_path());
            if object_path.exists() {
                continue;
            }

            self.write_object(&object_path, record.data)?;
            imported += 1;
        }

        debug!(imported, "imported objects");
        Ok(imported)
    }

    /// Find all objects whose id starts with the given prefix
    pub fn find_objects_by_prefix(&self, prefix: &str) -> RepoResult<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();

        if prefix.len() >= 2 {
            let (dir_name, file_prefix) = prefix.split_at(2);
            let dir_path = self.path.join(dir_name);
            if !dir_path.is_dir() {
                return Ok(Vec::new());
            }

            let mut matches = Vec::new();
            for entry in std::fs::read_dir(&dir_path)? {
                let file_name = entry?.file_name();
                let file_name = file_name.to_string_lossy();

                if file_name.starts_with(file_prefix)
                    && let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}"))
                {
                    matches.push(oid);
                }
            }

            Ok(matches)
        } else {
            Ok(self
                .list_object_ids()?
                .into_iter()
                .filter(|oid| oid.starts_with(&prefix))
                .collect())
        }
    }

    fn list_object_ids(&self) -> RepoResult<Vec<ObjectId>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        Ok(WalkDir::new(&self.path)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let dir_name = entry.path().parent()?.file_name()?.to_str()?.to_string();
                let file_name = entry.file_name().to_str()?.to_string();
                ObjectId::try_parse(format!("{dir_name}{file_name}")).ok()
            })
            .collect())
    }

    fn expect_object_type(
        &self,
        object_id: &ObjectId,
        expected: ObjectType,
    ) -> RepoResult<impl BufRead> {
        let (found, object_reader) = self.parse_object_as_bytes(object_id)?;

        if found != expected {
            return Err(RepoError::WrongObjectType {
                oid: object_id.clone(),
                expected,
                found,
            });
        }

        Ok(object_reader)
    }

    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> RepoResult<(ObjectType, impl BufRead)> {
        let object_content = self.load(object_id)?;
        let mut object_reader = Cursor::new(object_content);

        let object_type = ObjectType::parse_object_type(&mut object_reader)?;

        Ok((object_type, object_reader))
    }

    /// Raw serialized bytes of a stored object
    fn load(&self, object_id: &ObjectId) -> RepoResult<Bytes> {
        let object_path = self.path.join(object_id.to_path());
        if !object_path.is_file() {
            return Err(RepoError::NotFound(object_id.clone()));
        }

        Ok(self.read_object(&object_path)?)
    }

    fn read_object(&self, object_path: &Path) -> anyhow::Result<Bytes> {
        let object_content = std::fs::read(object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        Self::decompress(object_content.into())
    }

    fn write_object(&self, object_path: &Path, object_content: Bytes) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .context(format!("Invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir).context(format!(
            "Unable to create object directory {}",
            object_dir.display()
        ))?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content = Self::compress(object_content)?;

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        let published = Self::publish(file, &temp_object_path, object_path, &object_content);
        if published.is_err() {
            // the write error is what gets reported
            let _ = std::fs::remove_file(&temp_object_path);
        }

        published
    }

    /// Fill the temp file, flush it to disk and rename it to its final path
    fn publish(
        mut file: std::fs::File,
        temp_object_path: &Path,
        object_path: &Path,
        object_content: &[u8],
    ) -> anyhow::Result<()> {
        file.write_all(object_content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;
        file.sync_all()?;
        drop(file);

        // rename the temp file to the object file to make it atomic
        std::fs::rename(temp_object_path, object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}-{}", std::process::id(), rand::random::<u64>())
    }
}
