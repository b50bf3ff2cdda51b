//! Error type for `casefile-report`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("report password must not be empty")]
  EmptyPassword,

  #[error("case has no analysis to report")]
  MissingAnalysis,

  #[error("case has no collected evidence")]
  MissingEvidence,

  #[error("key derivation failed: {0}")]
  Kdf(String),

  #[error("encryption failed")]
  Cipher,

  /// Wrong password, corrupted artifact, or an envelope this build cannot
  /// read. Deliberately carries no detail.
  #[error("report could not be decrypted")]
  Decryption,

  #[error("render error: {0}")]
  Render(#[from] std::fmt::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
