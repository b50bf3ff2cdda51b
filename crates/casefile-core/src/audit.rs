//! Append-only audit trail of case activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, case::Investigator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
  CreateCase,
  CollectEvidence,
  Analyze,
  CompleteCase,
  GenerateReport,
  DownloadReport,
  DownloadDenied,
  IntegrityFailure,
}

impl AuditAction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::CreateCase => "create_case",
      Self::CollectEvidence => "collect_evidence",
      Self::Analyze => "analyze",
      Self::CompleteCase => "complete_case",
      Self::GenerateReport => "generate_report",
      Self::DownloadReport => "download_report",
      Self::DownloadDenied => "download_denied",
      Self::IntegrityFailure => "integrity_failure",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    Ok(match s {
      "create_case" => Self::CreateCase,
      "collect_evidence" => Self::CollectEvidence,
      "analyze" => Self::Analyze,
      "complete_case" => Self::CompleteCase,
      "generate_report" => Self::GenerateReport,
      "download_report" => Self::DownloadReport,
      "download_denied" => Self::DownloadDenied,
      "integrity_failure" => Self::IntegrityFailure,
      other => {
        return Err(Error::UnknownDiscriminant {
          what:  "audit action",
          value: other.to_owned(),
        });
      }
    })
  }
}

/// A recorded audit event. `recorded_at` and `event_id` are store-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
  pub event_id:    Uuid,
  pub actor:       Investigator,
  pub action:      AuditAction,
  pub case_id:     Option<Uuid>,
  pub report_id:   Option<Uuid>,
  pub details:     serde_json::Value,
  #[serde(with = "crate::timestamp")]
  pub recorded_at: DateTime<Utc>,
}

/// Input to [`crate::store::CaseStore::record_audit`].
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
  pub actor:     Investigator,
  pub action:    AuditAction,
  pub case_id:   Option<Uuid>,
  pub report_id: Option<Uuid>,
  pub details:   serde_json::Value,
}

impl NewAuditEvent {
  /// An event not yet bound to a case. Stores that create the case in the
  /// same write fill in `case_id`.
  pub fn new(actor: &Investigator, action: AuditAction) -> Self {
    Self {
      actor: actor.clone(),
      action,
      case_id: None,
      report_id: None,
      details: serde_json::Value::Null,
    }
  }

  pub fn for_case(actor: &Investigator, action: AuditAction, case_id: Uuid) -> Self {
    Self { case_id: Some(case_id), ..Self::new(actor, action) }
  }

  pub fn with_report(mut self, report_id: Uuid) -> Self {
    self.report_id = Some(report_id);
    self
  }

  pub fn with_details(mut self, details: serde_json::Value) -> Self {
    self.details = details;
    self
  }
}
