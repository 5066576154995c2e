use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// A tree entry's target: the object id plus its mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct DatabaseEntry {
    pub oid: ObjectId,
    pub mode: EntryMode,
}

impl DatabaseEntry {
    pub fn file(oid: ObjectId, mode: FileMode) -> Self {
        Self::new(oid, EntryMode::File(mode))
    }

    pub fn directory(oid: ObjectId) -> Self {
        Self::new(oid, EntryMode::Directory)
    }

    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }
}
