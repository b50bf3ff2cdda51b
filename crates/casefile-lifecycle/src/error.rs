//! Error type for `casefile-lifecycle`.

use std::time::Duration;

use casefile_core::integrity::IntegrityMismatch;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Caller-facing category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  NotFound,
  Precondition,
  Collection,
  Analysis,
  Decryption,
  AccessDenied,
  Integrity,
  Store,
  Internal,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Validation => "validation",
      Self::NotFound => "not_found",
      Self::Precondition => "precondition",
      Self::Collection => "collection",
      Self::Analysis => "analysis",
      Self::Decryption => "decryption",
      Self::AccessDenied => "access_denied",
      Self::Integrity => "integrity",
      Self::Store => "store",
      Self::Internal => "internal",
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("case not found: {0}")]
  CaseNotFound(Uuid),

  #[error("report not found: {0}")]
  ReportNotFound(Uuid),

  #[error("{0}")]
  Precondition(&'static str),

  /// The collector's own error, unchanged.
  #[error("evidence collection failed: {0}")]
  Collection(#[source] BoxError),

  #[error("evidence collection timed out after {0:?}")]
  CollectionTimeout(Duration),

  /// The analysis service's own error, unchanged.
  #[error("analysis failed: {0}")]
  Analysis(#[source] BoxError),

  #[error("analysis timed out after {0:?}")]
  AnalysisTimeout(Duration),

  /// The analysis service answered, but with output we refuse to commit.
  #[error("analysis service returned malformed output: {0}")]
  MalformedAnalysis(#[source] casefile_core::Error),

  #[error("report could not be decrypted")]
  Decryption,

  #[error("access denied")]
  AccessDenied,

  #[error(transparent)]
  Integrity(#[from] IntegrityMismatch),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("report error: {0}")]
  Report(#[source] casefile_report::Error),

  #[error("core error: {0}")]
  Core(#[from] casefile_core::Error),

  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::CaseNotFound(_) | Self::ReportNotFound(_) => ErrorKind::NotFound,
      Self::Precondition(_) => ErrorKind::Precondition,
      Self::Collection(_) | Self::CollectionTimeout(_) => ErrorKind::Collection,
      Self::Analysis(_) | Self::AnalysisTimeout(_) | Self::MalformedAnalysis(_) => {
        ErrorKind::Analysis
      }
      Self::Decryption => ErrorKind::Decryption,
      Self::AccessDenied => ErrorKind::AccessDenied,
      Self::Integrity(_) => ErrorKind::Integrity,
      Self::Store(_) => ErrorKind::Store,
      Self::Report(_) | Self::Core(_) | Self::Join(_) => ErrorKind::Internal,
    }
  }

  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<casefile_report::Error> for Error {
  fn from(e: casefile_report::Error) -> Self {
    use casefile_report::Error as R;
    match e {
      R::EmptyPassword => Self::Validation("report password must not be empty".into()),
      R::MissingAnalysis => Self::Precondition("no analysis to report"),
      R::MissingEvidence => Self::Precondition("no data to report"),
      R::Decryption => Self::Decryption,
      other => Self::Report(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
