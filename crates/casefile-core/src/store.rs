//! The `CaseStore` trait.
//!
//! Implemented by storage backends (e.g. `casefile-store-sqlite`). The
//! lifecycle controller depends on this abstraction, not on a concrete
//! backend.
//!
//! Evidence, analysis runs, report artifacts, and audit events are all
//! append-only: the trait exposes no way to update or delete them. The only
//! mutable parts of a case are its status and the derived fields (evidence
//! hash, current risk score) that are rewritten in the same transaction as
//! the append that changes them.
//!
//! Every state-changing write takes the [`NewAuditEvent`] describing it and
//! commits both together: a change is never durable without its audit
//! record, and an audit record never describes a change that did not land.

use std::future::Future;

use uuid::Uuid;

use crate::{
  aggregate::Aggregate,
  analysis::AnalysisRecord,
  audit::{AuditEvent, NewAuditEvent},
  case::{Case, CaseStatus, CaseSummary, Investigator, TargetIdentity},
  evidence::{EvidenceSnapshot, StoredSnapshot},
  integrity::EvidenceHash,
  report::{ReportArtifact, ReportSummary},
};

/// Abstraction over a casefile store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CaseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Cases ─────────────────────────────────────────────────────────────

  /// Create and persist a new `Active` case with no evidence. `audit` is
  /// bound to the new case id.
  fn create_case(
    &self,
    owner: Investigator,
    target: TargetIdentity,
    description: Option<String>,
    audit: NewAuditEvent,
  ) -> impl Future<Output = Result<Case, Self::Error>> + Send + '_;

  /// Materialise a case with its evidence log and current analysis.
  /// Returns `None` if the case does not exist.
  fn get_case(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Option<Case>, Self::Error>> + Send + '_;

  /// All cases owned by `owner`, oldest first.
  fn list_cases<'a>(
    &'a self,
    owner: &'a Investigator,
  ) -> impl Future<Output = Result<Vec<CaseSummary>, Self::Error>> + Send + 'a;

  /// Set the case status. `completed_at` is set when moving to `Completed`.
  fn set_status(
    &self,
    case_id: Uuid,
    status: CaseStatus,
    audit: NewAuditEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Evidence (append-only) ────────────────────────────────────────────

  /// Append `snapshot` at position `sequence` and set the case's evidence
  /// hash to `evidence_hash`, atomically.
  ///
  /// Returns an error, and writes nothing, if `sequence` is not the next
  /// free position in the case's log.
  fn append_snapshot(
    &self,
    case_id: Uuid,
    sequence: u32,
    snapshot: EvidenceSnapshot,
    evidence_hash: EvidenceHash,
    audit: NewAuditEvent,
  ) -> impl Future<Output = Result<StoredSnapshot, Self::Error>> + Send + '_;

  /// All snapshots for a case in collection order.
  fn list_snapshots(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StoredSnapshot>, Self::Error>> + Send + '_;

  // ── Analysis (versioned) ──────────────────────────────────────────────

  /// Record a new analysis run and make it the case's current analysis,
  /// atomically. The store assigns the next version number.
  fn record_analysis(
    &self,
    case_id: Uuid,
    aggregate: Aggregate,
    snapshots: u32,
    audit: NewAuditEvent,
  ) -> impl Future<Output = Result<AnalysisRecord, Self::Error>> + Send + '_;

  /// Every analysis run for a case, oldest first.
  fn analysis_history(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AnalysisRecord>, Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Store a sealed report. The artifact is immutable once written.
  fn insert_report<'a>(
    &'a self,
    artifact: &'a ReportArtifact,
    audit: NewAuditEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_report(
    &self,
    report_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReportArtifact>, Self::Error>> + Send + '_;

  /// Reports generated for a case, oldest first.
  fn list_reports(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ReportSummary>, Self::Error>> + Send + '_;

  // ── Audit ─────────────────────────────────────────────────────────────

  /// Record an event that accompanies no state change (downloads, denials,
  /// integrity failures).
  fn record_audit(
    &self,
    event: NewAuditEvent,
  ) -> impl Future<Output = Result<AuditEvent, Self::Error>> + Send + '_;

  /// Audit events touching a case, oldest first. Includes report events.
  fn audit_trail(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AuditEvent>, Self::Error>> + Send + '_;
}
