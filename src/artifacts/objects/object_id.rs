//! Object identifier (SHA-256 digest)
//!
//! Object IDs are 64-character lowercase hexadecimal strings. They uniquely
//! identify every blob, tree and commit in the store.
//!
//! ## Format
//!
//! - Full: 64 hex characters
//! - Short: first 7 characters
//!
//! ## Storage
//!
//! Objects are stored in `.repo/objects/<first-2-chars>/<remaining-62-chars>`

use crate::artifacts::objects::{OBJECT_ID_LENGTH, OBJECT_ID_RAW_LENGTH};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from its hex form
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        let hex = digest
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();

        Self(hex)
    }

    /// Write the object ID in raw form (32 bytes)
    ///
    /// Used when serializing tree entries and index records.
    pub fn write_raw_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let hex = self.as_ref();

        // Process a byte (two nibbles) at a time
        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an object ID from raw form (32 bytes)
    pub fn read_raw_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut buffer = [0u8; OBJECT_ID_RAW_LENGTH];
        reader.read_exact(&mut buffer)?;

        Ok(Self::from_digest(&buffer))
    }

    /// Convert to the fan-out storage path, `ab/cdef...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the id
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(&prefix.to_ascii_lowercase())
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
