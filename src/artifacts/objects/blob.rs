//! Blob object
//!
//! Blobs store file content only. Names and modes live in the trees that
//! reference them, so two files with identical bytes share one blob.
//!
//! ## Format
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::object::{Object, Packable, Unpackable, frame};
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Bytes,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Blob { data: data.into() }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        frame(self.object_type(), &self.data)
    }
}

impl Unpackable for Blob {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::new(content))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.data).to_string()
    }
}
