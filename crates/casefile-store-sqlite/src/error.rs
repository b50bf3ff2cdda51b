//! Error type for `casefile-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] casefile_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("case not found: {0}")]
  CaseNotFound(uuid::Uuid),

  /// The evidence log already moved on; the append was not written.
  #[error("case {case_id}: snapshot {attempted} is not the next slot ({next})")]
  SequenceConflict {
    case_id:   uuid::Uuid,
    attempted: u32,
    next:      u32,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
