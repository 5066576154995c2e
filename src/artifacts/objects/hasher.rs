//! Content hashing
//!
//! The universal object identifier is the SHA-256 digest of an object's
//! serialized bytes. Hashing is deterministic and infallible.

use crate::artifacts::objects::object_id::ObjectId;
use sha2::{Digest, Sha256};

/// Hash arbitrary bytes into an object identifier
pub fn hash(data: &[u8]) -> ObjectId {
    let digest = Sha256::digest(data);
    ObjectId::from_digest(digest.as_slice())
}
