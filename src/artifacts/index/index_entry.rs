use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::OBJECT_ID_RAW_LENGTH;
use anyhow::anyhow;
use byteorder::{ByteOrder, NetworkEndian, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

const KIND_DELETE: u8 = 0;
const KIND_UPSERT: u8 = 1;
const MAX_PATH_SIZE: usize = u16::MAX as usize;
/// kind + mode + raw id + path length
pub const RECORD_FIXED_SIZE: usize = 1 + 4 + OBJECT_ID_RAW_LENGTH + 2;

/// A pending change for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedChange {
    /// Write this blob (with its mode) at the path
    Upsert(DatabaseEntry),
    /// Remove the path, and everything under it when it is a directory
    Delete,
}

impl StagedChange {
    pub fn upsert(oid: ObjectId, mode: FileMode) -> Self {
        StagedChange::Upsert(DatabaseEntry::file(oid, mode))
    }

    /// The entry the path ends up with, `None` for deletions
    pub fn entry(&self) -> Option<&DatabaseEntry> {
        match self {
            StagedChange::Upsert(entry) => Some(entry),
            StagedChange::Delete => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    pub path: PathBuf,
    pub change: StagedChange,
}

impl IndexEntry {
    /// Every proper ancestor directory of the path, outermost first
    pub fn parent_dirs(&self) -> Vec<&Path> {
        let mut dirs = self
            .path
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();
        dirs
    }

    /// Staged paths are relative, normalized and valid UTF-8
    pub fn validate_path(path: &Path) -> anyhow::Result<()> {
        if path.as_os_str().is_empty() {
            return Err(anyhow!("cannot stage an empty path"));
        }
        if path.to_str().is_none() {
            return Err(anyhow!("path {} is not valid UTF-8", path.display()));
        }
        if !path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(anyhow!(
                "path {} must be relative to the repository root",
                path.display()
            ));
        }

        Ok(())
    }

    pub fn serialize(&self) -> anyhow::Result<Bytes> {
        let path = self
            .path
            .to_str()
            .ok_or_else(|| anyhow!("path {} is not valid UTF-8", self.path.display()))?;
        if path.len() > MAX_PATH_SIZE {
            return Err(anyhow!("path {path} is too long to stage"));
        }

        let mut bytes = Vec::with_capacity(RECORD_FIXED_SIZE + path.len());
        match &self.change {
            StagedChange::Upsert(entry) => {
                bytes.write_u8(KIND_UPSERT)?;
                bytes.write_u32::<NetworkEndian>(entry.mode.as_u32())?;
                entry.oid.write_raw_to(&mut bytes)?;
            }
            StagedChange::Delete => {
                bytes.write_u8(KIND_DELETE)?;
                bytes.write_u32::<NetworkEndian>(0)?;
                bytes.write_all(&[0u8; OBJECT_ID_RAW_LENGTH])?;
            }
        }
        bytes.write_u16::<NetworkEndian>(path.len() as u16)?;
        bytes.write_all(path.as_bytes())?;

        Ok(Bytes::from(bytes))
    }

    pub fn deserialize_from<R: Read>(reader: &mut Checksum<R>) -> anyhow::Result<Self> {
        let fixed = reader.read(RECORD_FIXED_SIZE)?;
        let kind = fixed[0];
        let mode = NetworkEndian::read_u32(&fixed[1..5]);
        let oid = ObjectId::read_raw_from(&mut &fixed[5..5 + OBJECT_ID_RAW_LENGTH])?;
        let path_len = NetworkEndian::read_u16(&fixed[5 + OBJECT_ID_RAW_LENGTH..]) as usize;

        let path = reader.read(path_len)?;
        let path = PathBuf::from(String::from_utf8(path.to_vec())?);
        Self::validate_path(&path)?;

        let change = match kind {
            KIND_UPSERT => {
                let mode = FileMode::try_from(EntryMode::try_from(mode)?)?;
                StagedChange::upsert(oid, mode)
            }
            KIND_DELETE => StagedChange::Delete,
            _ => return Err(anyhow!("unknown staged record kind {kind}")),
        };

        Ok(IndexEntry::new(path, change))
    }
}
