//! Content-addressed object types
//!
//! Every object is stored as `<type> <size>\0<content>` and identified by the
//! SHA-256 digest of that serialization:
//!
//! - **Blob**: file content (raw bytes)
//! - **Tree**: directory listing (mode, type, name and object id per entry)
//! - **Commit**: snapshot with metadata (tree, parent commits, author, message)

pub mod blob;
pub mod commit;
pub mod hasher;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-256 digest in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 64;

/// Length of a SHA-256 digest in raw bytes
pub const OBJECT_ID_RAW_LENGTH: usize = OBJECT_ID_LENGTH / 2;

/// Shortest abbreviation accepted when resolving object ids
pub const MIN_ABBREV_LENGTH: usize = 4;
