//! Staging index file format
//!
//! The staging index records pending changes for the next commit: an upsert
//! (blob id plus file mode) or a deletion marker per path.
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "SVIX" (4 bytes)
//!   - Version: 1 (4 bytes)
//!   - Record count (4 bytes)
//!
//! Records (variable length):
//!   - Kind: 1 = upsert, 0 = delete (1 byte)
//!   - Mode (4 bytes)
//!   - Blob id, raw; zeroed for deletions (32 bytes)
//!   - Path length (2 bytes) followed by the UTF-8 path
//!
//! Checksum (32 bytes):
//!   - SHA-256 of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod tree_builder;

/// Size of the SHA-256 trailer in bytes
pub const CHECKSUM_SIZE: usize = 32;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &[u8; 4] = b"SVIX";

/// Index file format version
pub const VERSION: u32 = 1;
