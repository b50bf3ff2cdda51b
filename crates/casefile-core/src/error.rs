//! Error types for `casefile-core`.

use thiserror::Error;

use crate::{analysis::DetectorKind, integrity::IntegrityMismatch};

#[derive(Debug, Error)]
pub enum Error {
  #[error("target username must not be empty")]
  EmptyUsername,

  #[error("target username must not contain whitespace: {0:?}")]
  InvalidUsername(String),

  #[error("unrecognised platform: {0:?}")]
  UnknownPlatform(String),

  #[error("invalid evidence hash: {0:?}")]
  InvalidEvidenceHash(String),

  #[error("detector output reported more than once: {0}")]
  DuplicateDetector(DetectorKind),

  #[error("{detector} {field} out of range: {value}")]
  OutOfRange {
    detector: DetectorKind,
    field:    &'static str,
    value:    f64,
  },

  #[error("risk weight {field} must be finite and non-negative, got {value}")]
  InvalidWeight { field: &'static str, value: f64 },

  #[error("risk thresholds must satisfy medium <= high <= critical")]
  ThresholdOrder,

  #[error("sentiment percentages sum to {0}, expected 100")]
  SentimentSum(f64),

  #[error("unknown {what} discriminant: {value:?}")]
  UnknownDiscriminant { what: &'static str, value: String },

  #[error(transparent)]
  Integrity(#[from] IntegrityMismatch),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
