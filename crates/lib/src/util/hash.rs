//! Content hashes for synthesized templates.
//!
//! A template's hash is a truncated SHA-256 of its canonical JSON form. Maps
//! in the template model are ordered, so two templates declaring the same
//! resources and outputs always hash the same.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A 20-character lowercase hex prefix of a SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_vec(self)?;
    Ok(hash_bytes(&serialized))
  }
}

/// Hash arbitrary bytes.
pub fn hash_bytes(bytes: &[u8]) -> ObjectHash {
  let digest = Sha256::digest(bytes);
  let full = hex::encode(digest);
  ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string())
}
