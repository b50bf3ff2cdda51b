//! Evidence integrity hashing.
//!
//! The evidence hash is SHA-256 over a framed canonical encoding of the whole
//! snapshot sequence:
//!
//! ```text
//! "casefile-evidence-v1" || u64be(count) || for each snapshot: u64be(len) || json
//! ```
//!
//! `json` is the compact serde_json encoding of [`EvidenceSnapshot`]: fields
//! in declaration order, UTF-8, timestamps in the fixed format of
//! [`crate::timestamp`]. Length framing keeps snapshot boundaries
//! unambiguous, so appending, dropping, or reordering snapshots all change
//! the digest.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{Error, Result, evidence::EvidenceSnapshot};

const DOMAIN_TAG: &[u8] = b"casefile-evidence-v1";

/// Lowercase hex SHA-256 digest of an evidence sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvidenceHash(String);

impl EvidenceHash {
  /// Accept a stored digest; must be 64 hex characters.
  pub fn from_hex(s: &str) -> Result<Self> {
    let lower = s.to_ascii_lowercase();
    if lower.len() == 64 && lower.bytes().all(|b| b.is_ascii_hexdigit()) {
      Ok(Self(lower))
    } else {
      Err(Error::InvalidEvidenceHash(s.to_owned()))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn as_bytes(&self) -> &[u8] { self.0.as_bytes() }
}

impl fmt::Display for EvidenceHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl TryFrom<String> for EvidenceHash {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::from_hex(&s) }
}

impl From<EvidenceHash> for String {
  fn from(h: EvidenceHash) -> Self { h.0 }
}

/// The canonical bytes hashed for a single snapshot.
pub fn canonical_bytes(snapshot: &EvidenceSnapshot) -> Result<Vec<u8>> {
  Ok(serde_json::to_vec(snapshot)?)
}

/// Compute the evidence hash over `snapshots` in the given order.
pub fn evidence_hash<'a, I>(snapshots: I) -> Result<EvidenceHash>
where
  I: IntoIterator<Item = &'a EvidenceSnapshot>,
  I::IntoIter: ExactSizeIterator,
{
  let snapshots = snapshots.into_iter();
  let mut hasher = Sha256::new();
  hasher.update(DOMAIN_TAG);
  hasher.update((snapshots.len() as u64).to_be_bytes());
  for snapshot in snapshots {
    let bytes = canonical_bytes(snapshot)?;
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(&bytes);
  }
  Ok(EvidenceHash(hex::encode(hasher.finalize())))
}

/// A stored evidence hash no longer matches the stored snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
  "evidence hash mismatch: stored {}, recomputed {}",
  show(.stored),
  show(.computed)
)]
pub struct IntegrityMismatch {
  pub stored:   Option<EvidenceHash>,
  pub computed: Option<EvidenceHash>,
}

fn show(hash: &Option<EvidenceHash>) -> &str {
  hash.as_ref().map_or("<none>", EvidenceHash::as_str)
}

/// Outcome of a successful integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
  pub evidence_hash: Option<EvidenceHash>,
  pub snapshots:     usize,
}

/// Recompute the hash of `snapshots` and compare it with `stored`.
///
/// An empty sequence must have no stored hash; a non-empty one must have a
/// matching hash. Any disagreement is returned as
/// [`Error::Integrity`], never repaired.
pub fn verify(
  snapshots: &[EvidenceSnapshot],
  stored: Option<&EvidenceHash>,
) -> Result<IntegrityReport> {
  let computed = if snapshots.is_empty() {
    None
  } else {
    Some(evidence_hash(snapshots)?)
  };

  if computed.as_ref() == stored {
    Ok(IntegrityReport { evidence_hash: computed, snapshots: snapshots.len() })
  } else {
    Err(Error::Integrity(IntegrityMismatch { stored: stored.cloned(), computed }))
  }
}
