use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::hasher;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use std::io::{BufRead, Write};
use std::path::PathBuf;

pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    fn object_id(&self) -> Result<ObjectId> {
        let content = self.serialize()?;
        Ok(hasher::hash(&content))
    }

    fn object_path(&self) -> Result<PathBuf> {
        Ok(self.object_id()?.to_path())
    }
}

/// Prefix `content` with the `<type> <size>\0` header shared by all objects
pub(crate) fn frame(object_type: ObjectType, content: &[u8]) -> Result<Bytes> {
    let mut object_bytes = Vec::with_capacity(content.len() + 16);
    let header = format!("{} {}\0", object_type.as_str(), content.len());
    object_bytes.write_all(header.as_bytes())?;
    object_bytes.write_all(content)?;

    Ok(Bytes::from(object_bytes))
}

/// Any stored object, as returned by `Database::get`
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBox {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
        }
    }
}
