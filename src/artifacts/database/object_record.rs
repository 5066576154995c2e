use crate::artifacts::objects::hasher;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use derive_new::new;

/// One stored object in transferable form: its id and its serialized
/// (uncompressed, header included) bytes
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ObjectRecord {
    pub oid: ObjectId,
    pub data: Bytes,
}

impl ObjectRecord {
    /// True when `data` hashes to `oid`
    pub fn is_intact(&self) -> bool {
        hasher::hash(&self.data) == self.oid
    }
}
