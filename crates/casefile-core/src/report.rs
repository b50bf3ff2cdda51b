//! Report artifacts: encrypted, case-bound rendered documents.
//!
//! An artifact is written once and never modified. It stores everything
//! needed to re-derive the key from a password (KDF parameters and salt) and
//! to authenticate the ciphertext, but never the password or any key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{case::Investigator, integrity::EvidenceHash};

/// Argon2id cost parameters recorded alongside each artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
  /// Memory cost in KiB.
  pub memory_kib:  u32,
  pub iterations:  u32,
  pub parallelism: u32,
}

impl Default for KdfParams {
  /// The argon2 crate's recommended defaults (19 MiB, 2 passes, 1 lane).
  fn default() -> Self {
    Self {
      memory_kib:  19 * 1024,
      iterations:  2,
      parallelism: 1,
    }
  }
}

/// The sealed payload of a report plus the public inputs needed to open it.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedEnvelope {
  /// Envelope format version.
  pub version:       u8,
  pub kdf:           KdfParams,
  pub salt:          Vec<u8>,
  pub nonce:         Vec<u8>,
  pub ciphertext:    Vec<u8>,
  /// HMAC-SHA256 over the envelope header, evidence hash, and ciphertext.
  pub integrity_tag: Vec<u8>,
  /// The case's evidence hash at generation time; bound into the tag and
  /// used as AEAD associated data.
  pub evidence_hash: EvidenceHash,
}

impl std::fmt::Debug for SealedEnvelope {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SealedEnvelope")
      .field("version", &self.version)
      .field("kdf", &self.kdf)
      .field("ciphertext_len", &self.ciphertext.len())
      .field("evidence_hash", &self.evidence_hash)
      .finish_non_exhaustive()
  }
}

/// A stored report artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
  pub report_id:  Uuid,
  pub case_id:    Uuid,
  /// Investigator who generated the report; only they may download it.
  pub owner:      Investigator,
  pub created_at: DateTime<Utc>,
  pub envelope:   SealedEnvelope,
}

impl ReportArtifact {
  pub fn summary(&self) -> ReportSummary {
    ReportSummary {
      report_id:       self.report_id,
      case_id:         self.case_id,
      owner:           self.owner.clone(),
      created_at:      self.created_at,
      evidence_hash:   self.envelope.evidence_hash.clone(),
      ciphertext_size: self.envelope.ciphertext.len(),
    }
  }
}

/// Metadata-only view of an artifact for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
  pub report_id:       Uuid,
  pub case_id:         Uuid,
  pub owner:           Investigator,
  #[serde(with = "crate::timestamp")]
  pub created_at:      DateTime<Utc>,
  pub evidence_hash:   EvidenceHash,
  pub ciphertext_size: usize,
}
