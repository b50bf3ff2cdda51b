//! [`CaseController`]: the case state machine.

use std::future::Future;
use std::time::Duration;

use casefile_core::{
  aggregate::aggregate,
  analysis::AnalysisRecord,
  audit::{AuditAction, AuditEvent, NewAuditEvent},
  case::{Case, CaseStatus, CaseSummary, Investigator, NewCase, TargetIdentity},
  collaborator::{AnalysisService, EvidenceCollector},
  evidence::EvidenceSnapshot,
  integrity::{self, IntegrityReport, evidence_hash},
  report::{ReportArtifact, ReportSummary},
  store::CaseStore,
  timestamp,
};
use casefile_report::{ReportInput, open, render, seal};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{ControllerConfig, Error, Result, locks::CaseLocks};

/// Run a collaborator call under a deadline. A timed-out call is dropped
/// before anything is written.
async fn bounded<T, E, F>(
  limit: Duration,
  call: F,
  failed: impl FnOnce(E) -> Error,
  timed_out: impl FnOnce(Duration) -> Error,
) -> Result<T>
where
  F: Future<Output = Result<T, E>>,
{
  match tokio::time::timeout(limit, call).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(e)) => Err(failed(e)),
    Err(_) => Err(timed_out(limit)),
  }
}

/// Owns case state and sequences collect → analyze → report.
///
/// Every operation takes the calling [`Investigator`] explicitly; cases and
/// reports are visible only to the investigator who created them.
pub struct CaseController<S, C, A> {
  store:     S,
  collector: C,
  analyzer:  A,
  config:    ControllerConfig,
  locks:     CaseLocks,
}

impl<S, C, A> CaseController<S, C, A>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  pub fn new(store: S, collector: C, analyzer: A, config: ControllerConfig) -> Self {
    Self { store, collector, analyzer, config, locks: CaseLocks::new() }
  }

  pub fn config(&self) -> &ControllerConfig { &self.config }

  // ─── Helpers ───────────────────────────────────────────────────────────────

  async fn load(&self, case_id: Uuid) -> Result<Case> {
    self
      .store
      .get_case(case_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::CaseNotFound(case_id))
  }

  /// Load a case and check that `actor` owns it.
  async fn owned(&self, actor: &Investigator, case_id: Uuid) -> Result<Case> {
    let case = self.load(case_id).await?;
    if !case.is_owned_by(actor) {
      warn!(%case_id, actor = %actor, "case access denied");
      return Err(Error::AccessDenied);
    }
    Ok(case)
  }

  /// Record an event that changes no state.
  async fn audit(&self, event: NewAuditEvent) -> Result<()> {
    self.store.record_audit(event).await.map_err(Error::store)?;
    Ok(())
  }

  /// Recompute the evidence hash and compare it with the stored one. A
  /// mismatch is audited and returned, never repaired.
  async fn check_integrity(
    &self,
    actor: &Investigator,
    case: &Case,
  ) -> Result<IntegrityReport> {
    match integrity::verify(&case.data_collected, case.evidence_hash.as_ref()) {
      Ok(report) => Ok(report),
      Err(casefile_core::Error::Integrity(mismatch)) => {
        error!(case_id = %case.case_id, %mismatch, "evidence integrity check failed");
        self
          .audit(
            NewAuditEvent::for_case(actor, AuditAction::IntegrityFailure, case.case_id)
              .with_details(json!({
                "stored":   &mismatch.stored,
                "computed": &mismatch.computed,
              })),
          )
          .await?;
        Err(mismatch.into())
      }
      Err(other) => Err(other.into()),
    }
  }

  fn ensure_active(case: &Case) -> Result<()> {
    match case.status {
      CaseStatus::Active => Ok(()),
      CaseStatus::Completed => Err(Error::Precondition("case is completed")),
    }
  }

  // ─── Cases ─────────────────────────────────────────────────────────────────

  /// Open a new case against a validated target.
  pub async fn create(&self, actor: &Investigator, input: NewCase) -> Result<Case> {
    let target = TargetIdentity::parse(&input.platform, &input.target_username)
      .map_err(|e| Error::Validation(e.to_string()))?;
    let description = input
      .description
      .map(|d| d.trim().to_owned())
      .filter(|d| !d.is_empty());

    let audit = NewAuditEvent::new(actor, AuditAction::CreateCase)
      .with_details(json!({ "platform": target.platform, "username": target.username }));

    let case = self
      .store
      .create_case(actor.clone(), target, description, audit)
      .await
      .map_err(Error::store)?;

    info!(case_id = %case.case_id, platform = %case.target.platform, "case created");
    Ok(case)
  }

  /// The actor's cases, oldest first.
  pub async fn list(&self, actor: &Investigator) -> Result<Vec<CaseSummary>> {
    self.store.list_cases(actor).await.map_err(Error::store)
  }

  pub async fn get(&self, actor: &Investigator, case_id: Uuid) -> Result<Case> {
    self.owned(actor, case_id).await
  }

  /// Move an active case to `Completed`. A completed case accepts no more
  /// evidence or analysis, but reports can still be generated from it.
  pub async fn complete(&self, actor: &Investigator, case_id: Uuid) -> Result<Case> {
    let _guard = self.locks.lock(case_id).await;
    let case = self.owned(actor, case_id).await?;
    if case.status == CaseStatus::Completed {
      return Err(Error::Precondition("case is already completed"));
    }

    self
      .store
      .set_status(
        case_id,
        CaseStatus::Completed,
        NewAuditEvent::for_case(actor, AuditAction::CompleteCase, case_id),
      )
      .await
      .map_err(Error::store)?;

    info!(%case_id, "case completed");
    self.load(case_id).await
  }

  // ─── Evidence ──────────────────────────────────────────────────────────────

  /// Capture one more snapshot of the case's target and append it.
  ///
  /// The existing log must still match its hash; tampered evidence is never
  /// folded into a fresh one. Nothing is written unless the collector
  /// succeeds within the configured timeout. The append, the new evidence
  /// hash, and the audit record commit together.
  pub async fn collect_evidence(&self, actor: &Investigator, case_id: Uuid) -> Result<Case> {
    let _guard = self.locks.lock(case_id).await;
    let case = self.owned(actor, case_id).await?;
    Self::ensure_active(&case)?;
    self.check_integrity(actor, &case).await?;

    let snapshot = bounded(
      self.config.collect_timeout,
      self.collector.collect(&case.target),
      |e| Error::Collection(Box::new(e)),
      Error::CollectionTimeout,
    )
    .await
    .inspect_err(|e| warn!(%case_id, error = %e, "evidence collection failed"))?
    .normalized();

    let sequence = u32::try_from(case.data_collected.len())
      .map_err(|_| Error::Precondition("evidence log is full"))?;
    let log: Vec<&EvidenceSnapshot> =
      case.data_collected.iter().chain([&snapshot]).collect();
    let hash = evidence_hash(log.iter().copied())?;

    let audit = NewAuditEvent::for_case(actor, AuditAction::CollectEvidence, case_id)
      .with_details(json!({ "sequence": sequence, "evidence_hash": &hash }));
    self
      .store
      .append_snapshot(case_id, sequence, snapshot, hash.clone(), audit)
      .await
      .map_err(Error::store)?;

    info!(%case_id, snapshots = sequence + 1, evidence_hash = %hash, "evidence collected");
    self.load(case_id).await
  }

  /// Check the stored evidence hash against the stored snapshots.
  pub async fn verify_integrity(
    &self,
    actor: &Investigator,
    case_id: Uuid,
  ) -> Result<IntegrityReport> {
    let case = self.owned(actor, case_id).await?;
    self.check_integrity(actor, &case).await
  }

  // ─── Analysis ──────────────────────────────────────────────────────────────

  /// Run the detector suite over all evidence and replace the case's
  /// current analysis with the result.
  ///
  /// Evidence that no longer matches its hash is not analysed. A failed,
  /// timed-out, or malformed run leaves the previous analysis untouched.
  pub async fn analyze(&self, actor: &Investigator, case_id: Uuid) -> Result<Case> {
    let _guard = self.locks.lock(case_id).await;
    let case = self.owned(actor, case_id).await?;
    Self::ensure_active(&case)?;
    if case.data_collected.is_empty() {
      return Err(Error::Precondition("no data to analyze"));
    }
    self.check_integrity(actor, &case).await?;

    let results = bounded(
      self.config.analyze_timeout,
      self.analyzer.analyze(&case.data_collected),
      |e| Error::Analysis(Box::new(e)),
      Error::AnalysisTimeout,
    )
    .await
    .inspect_err(|e| warn!(%case_id, error = %e, "analysis failed"))?;

    let aggregate = aggregate(results, &self.config.risk_weights)
      .map_err(Error::MalformedAnalysis)
      .inspect_err(|e| warn!(%case_id, error = %e, "analysis rejected"))?;

    let snapshots = u32::try_from(case.data_collected.len())
      .map_err(|_| Error::Precondition("evidence log is full"))?;
    let audit = NewAuditEvent::for_case(actor, AuditAction::Analyze, case_id).with_details(json!({
      "snapshots":  snapshots,
      "risk_score": aggregate.risk_score,
      "risk_level": aggregate.risk_level,
      "detectors":  aggregate.result.detectors(),
    }));
    let record = self
      .store
      .record_analysis(case_id, aggregate, snapshots, audit)
      .await
      .map_err(Error::store)?;

    info!(
      %case_id,
      version = record.version,
      risk_score = record.risk_score,
      risk_level = record.risk_level.as_str(),
      "analysis recorded"
    );
    self.load(case_id).await
  }

  /// Every analysis run for the case, oldest first.
  pub async fn analysis_history(
    &self,
    actor: &Investigator,
    case_id: Uuid,
  ) -> Result<Vec<AnalysisRecord>> {
    self.owned(actor, case_id).await?;
    self.store.analysis_history(case_id).await.map_err(Error::store)
  }

  // ─── Reports ───────────────────────────────────────────────────────────────

  /// Render the case's report and store it sealed under `password`.
  ///
  /// The evidence is re-verified first; a case whose evidence no longer
  /// matches its hash cannot be reported on.
  pub async fn generate_report(
    &self,
    actor: &Investigator,
    case_id: Uuid,
    password: &str,
  ) -> Result<ReportSummary> {
    if password.is_empty() {
      return Err(Error::Validation("report password must not be empty".into()));
    }

    let _guard = self.locks.lock(case_id).await;
    let case = self.owned(actor, case_id).await?;
    if case.analysis_results.is_none() {
      return Err(Error::Precondition("no analysis to report"));
    }
    self.check_integrity(actor, &case).await?;
    let evidence_hash = case
      .evidence_hash
      .clone()
      .ok_or(Error::Precondition("no data to report"))?;

    let analysed_snapshots = self
      .store
      .analysis_history(case_id)
      .await
      .map_err(Error::store)?
      .last()
      .map_or(0, |record| record.snapshots as usize);

    let report_id = Uuid::new_v4();
    let created_at = timestamp::now();
    let kdf = self.config.kdf;
    let password = password.to_owned();

    let envelope = tokio::task::spawn_blocking(move || {
      let document = render(&ReportInput {
        report_id,
        case: &case,
        analysed_snapshots,
        generated_at: created_at,
      })?;
      seal(&document, &password, &evidence_hash, kdf)
    })
    .await??;

    let artifact = ReportArtifact {
      report_id,
      case_id,
      owner: actor.clone(),
      created_at,
      envelope,
    };
    let audit = NewAuditEvent::for_case(actor, AuditAction::GenerateReport, case_id)
      .with_report(report_id)
      .with_details(json!({ "evidence_hash": &artifact.envelope.evidence_hash }));
    self
      .store
      .insert_report(&artifact, audit)
      .await
      .map_err(Error::store)?;

    info!(%case_id, %report_id, "report generated");
    Ok(artifact.summary())
  }

  /// Authenticate and decrypt a stored report.
  ///
  /// Only the investigator who generated the report may download it. The
  /// artifact is never modified; each attempt is audited.
  pub async fn download_report(
    &self,
    actor: &Investigator,
    report_id: Uuid,
    password: &str,
  ) -> Result<Vec<u8>> {
    let artifact = self
      .store
      .get_report(report_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ReportNotFound(report_id))?;
    let case_id = artifact.case_id;

    let denied = |reason: &str| {
      NewAuditEvent::for_case(actor, AuditAction::DownloadDenied, case_id)
        .with_report(report_id)
        .with_details(json!({ "reason": reason }))
    };

    if artifact.owner != *actor {
      warn!(%report_id, actor = %actor, "report access denied");
      self.audit(denied("not the report owner")).await?;
      return Err(Error::AccessDenied);
    }

    let password = password.to_owned();
    let envelope = artifact.envelope;
    match tokio::task::spawn_blocking(move || open(&envelope, &password)).await? {
      Ok(document) => {
        self
          .audit(
            NewAuditEvent::for_case(actor, AuditAction::DownloadReport, case_id)
              .with_report(report_id)
              .with_details(json!({ "bytes": document.len() })),
          )
          .await?;
        info!(%report_id, "report downloaded");
        Ok(document)
      }
      Err(e) => {
        warn!(%report_id, "report decryption failed");
        self.audit(denied("decryption failed")).await?;
        Err(e.into())
      }
    }
  }

  /// Metadata for every report generated from the case.
  pub async fn list_reports(
    &self,
    actor: &Investigator,
    case_id: Uuid,
  ) -> Result<Vec<ReportSummary>> {
    self.owned(actor, case_id).await?;
    self.store.list_reports(case_id).await.map_err(Error::store)
  }

  // ─── Audit ─────────────────────────────────────────────────────────────────

  pub async fn audit_trail(&self, actor: &Investigator, case_id: Uuid) -> Result<Vec<AuditEvent>> {
    self.owned(actor, case_id).await?;
    self.store.audit_trail(case_id).await.map_err(Error::store)
  }
}
