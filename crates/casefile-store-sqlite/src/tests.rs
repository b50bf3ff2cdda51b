//! Integration tests for `SqliteStore` against an in-memory database.

use casefile_core::{
  aggregate::{RiskWeights, aggregate},
  analysis::{DetectorResult, FraudResult},
  audit::{AuditAction, AuditEvent, NewAuditEvent},
  case::{Case, CaseStatus, Investigator, Platform, RiskLevel, TargetIdentity},
  evidence::{AccountMetadata, EvidenceSnapshot, Post, Profile},
  integrity::evidence_hash,
  report::{KdfParams, ReportArtifact, SealedEnvelope},
  store::CaseStore,
  timestamp,
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn alice() -> Investigator { Investigator::new("alice") }

fn target() -> TargetIdentity {
  TargetIdentity { platform: Platform::Twitter, username: "suspect".into() }
}

fn snapshot(followers: u64) -> EvidenceSnapshot {
  EvidenceSnapshot {
    // Sub-microsecond precision is dropped on the way in.
    scraped_at: Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap(),
    profile:    Profile {
      display_name:      "Suspect".into(),
      bio:               "nothing to see".into(),
      location:          Some("Nowhere".into()),
      verified:          false,
      profile_image_url: None,
    },
    metadata:   AccountMetadata {
      total_posts:      1,
      followers,
      following:        10,
      account_age_days: 30,
    },
    posts:      vec![Post {
      post_id:   Some("p1".into()),
      content:   "hello".into(),
      likes:     1,
      comments:  0,
      shares:    0,
      timestamp: Utc.timestamp_opt(1_699_999_000, 0).unwrap(),
      hashtags:  vec!["intro".into()],
    }],
  }
}

async fn new_case(s: &SqliteStore, owner: Investigator) -> Case {
  let audit = NewAuditEvent::new(&owner, AuditAction::CreateCase);
  s.create_case(owner, target(), None, audit).await.unwrap()
}

fn collected(case_id: Uuid) -> NewAuditEvent {
  NewAuditEvent::for_case(&alice(), AuditAction::CollectEvidence, case_id)
}

async fn append(s: &SqliteStore, case_id: Uuid, log: &mut Vec<EvidenceSnapshot>) {
  let next = snapshot(100 + log.len() as u64).normalized();
  log.push(next.clone());
  let hash = evidence_hash(log.iter()).unwrap();
  s.append_snapshot(case_id, (log.len() - 1) as u32, next, hash, collected(case_id))
    .await
    .unwrap();
}

fn actions(trail: &[AuditEvent]) -> Vec<AuditAction> { trail.iter().map(|e| e.action).collect() }

// ─── Cases ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_case() {
  let s = store().await;
  let case = s
    .create_case(
      alice(),
      target(),
      Some("threats".into()),
      NewAuditEvent::new(&alice(), AuditAction::CreateCase),
    )
    .await
    .unwrap();
  assert_eq!(case.status, CaseStatus::Active);
  assert_eq!(case.risk_level, RiskLevel::Low);

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.case_id, case.case_id);
  assert_eq!(fetched.owner, alice());
  assert_eq!(fetched.target, target());
  assert_eq!(fetched.description.as_deref(), Some("threats"));
  assert_eq!(fetched.created_at, case.created_at);
  assert!(fetched.evidence_hash.is_none());
  assert!(fetched.data_collected.is_empty());
  assert!(fetched.analysis_results.is_none());
}

#[tokio::test]
async fn get_case_missing_returns_none() {
  let s = store().await;
  assert!(s.get_case(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_cases_scoped_to_owner() {
  let s = store().await;
  let first = new_case(&s, alice()).await;
  new_case(&s, Investigator::new("bob")).await;
  let second = new_case(&s, alice()).await;

  let mut log = Vec::new();
  append(&s, second.case_id, &mut log).await;

  let listed = s.list_cases(&alice()).await.unwrap();
  let ids: Vec<_> = listed.iter().map(|c| c.case_id).collect();
  assert_eq!(ids, vec![first.case_id, second.case_id]);
  assert_eq!(listed[0].snapshot_count, 0);
  assert_eq!(listed[1].snapshot_count, 1);
  assert!(!listed[1].analyzed);
}

#[tokio::test]
async fn completing_sets_completed_at() {
  let s = store().await;
  let case = new_case(&s, alice()).await;

  s.set_status(
    case.case_id,
    CaseStatus::Completed,
    NewAuditEvent::for_case(&alice(), AuditAction::CompleteCase, case.case_id),
  )
  .await
  .unwrap();
  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, CaseStatus::Completed);
  assert!(fetched.completed_at.is_some());
}

#[tokio::test]
async fn set_status_unknown_case_errors() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s
    .set_status(
      id,
      CaseStatus::Completed,
      NewAuditEvent::for_case(&alice(), AuditAction::CompleteCase, id),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CaseNotFound(got) if got == id));
  assert!(s.audit_trail(id).await.unwrap().is_empty());
}

// ─── Evidence ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn snapshots_keep_collection_order_and_hash() {
  let s = store().await;
  let case = new_case(&s, alice()).await;

  let mut log = Vec::new();
  for _ in 0..3 {
    append(&s, case.case_id, &mut log).await;
  }

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.data_collected, log);
  assert_eq!(fetched.evidence_hash, Some(evidence_hash(log.iter()).unwrap()));

  let stored = s.list_snapshots(case.case_id).await.unwrap();
  let sequences: Vec<u32> = stored.iter().map(|s| s.sequence).collect();
  assert_eq!(sequences, vec![0, 1, 2]);
}

#[tokio::test]
async fn stored_timestamps_are_normalised() {
  let s = store().await;
  let case = new_case(&s, alice()).await;
  let raw = snapshot(1);
  let hash = evidence_hash([&raw.clone().normalized()]).unwrap();

  let stored = s
    .append_snapshot(case.case_id, 0, raw, hash, collected(case.case_id))
    .await
    .unwrap();
  assert_eq!(stored.snapshot.scraped_at.timestamp_subsec_nanos(), 123_456_000);

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.data_collected[0], stored.snapshot);
}

#[tokio::test]
async fn append_out_of_sequence_writes_nothing() {
  let s = store().await;
  let case = new_case(&s, alice()).await;
  let mut log = Vec::new();
  append(&s, case.case_id, &mut log).await;

  let bogus = evidence_hash([&snapshot(9)]).unwrap();
  let err = s
    .append_snapshot(case.case_id, 0, snapshot(9), bogus, collected(case.case_id))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::SequenceConflict { attempted: 0, next: 1, .. }
  ));

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.data_collected.len(), 1);
  assert_eq!(fetched.evidence_hash, Some(evidence_hash(log.iter()).unwrap()));

  let trail = s.audit_trail(case.case_id).await.unwrap();
  assert_eq!(actions(&trail), vec![AuditAction::CreateCase, AuditAction::CollectEvidence]);
}

#[tokio::test]
async fn append_to_missing_case_errors() {
  let s = store().await;
  let hash = evidence_hash([&snapshot(1)]).unwrap();
  let id = Uuid::new_v4();
  let err = s
    .append_snapshot(id, 0, snapshot(1), hash, collected(id))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CaseNotFound(_)));
}

// ─── Analysis ────────────────────────────────────────────────────────────────

fn fraud(confidence: f64) -> DetectorResult {
  DetectorResult::Fraud(FraudResult {
    detected: true,
    confidence,
    suspicious_count: 1,
    total_flags: 2,
  })
}

#[tokio::test]
async fn analysis_runs_are_versioned() {
  let s = store().await;
  let case = new_case(&s, alice()).await;
  let weights = RiskWeights::default();
  let analysed = || NewAuditEvent::for_case(&alice(), AuditAction::Analyze, case.case_id);

  let first = s
    .record_analysis(
      case.case_id,
      aggregate(vec![fraud(20.0)], &weights).unwrap(),
      1,
      analysed(),
    )
    .await
    .unwrap();
  let second = s
    .record_analysis(
      case.case_id,
      aggregate(vec![fraud(100.0)], &weights).unwrap(),
      2,
      analysed(),
    )
    .await
    .unwrap();
  assert_eq!(first.version, 1);
  assert_eq!(second.version, 2);

  let history = s.analysis_history(case.case_id).await.unwrap();
  assert_eq!(history, vec![first, second.clone()]);

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.analysis_results, Some(second.result));
  assert_eq!(fetched.risk_score, second.risk_score);
  assert_eq!(fetched.risk_level, second.risk_level);

  let trail = s.audit_trail(case.case_id).await.unwrap();
  assert_eq!(actions(&trail), vec![
    AuditAction::CreateCase,
    AuditAction::Analyze,
    AuditAction::Analyze,
  ]);
}

// ─── Reports ─────────────────────────────────────────────────────────────────

fn generated(art: &ReportArtifact) -> NewAuditEvent {
  NewAuditEvent::for_case(&alice(), AuditAction::GenerateReport, art.case_id)
    .with_report(art.report_id)
}

fn artifact(case_id: Uuid) -> ReportArtifact {
  ReportArtifact {
    report_id:  Uuid::new_v4(),
    case_id,
    owner:      alice(),
    created_at: timestamp::now(),
    envelope:   SealedEnvelope {
      version:       1,
      kdf:           KdfParams::default(),
      salt:          vec![1; 16],
      nonce:         vec![2; 12],
      ciphertext:    vec![3, 4, 5, 6],
      integrity_tag: vec![7; 32],
      evidence_hash: evidence_hash([&snapshot(1)]).unwrap(),
    },
  }
}

#[tokio::test]
async fn report_artifact_roundtrip() {
  let s = store().await;
  let case = new_case(&s, alice()).await;
  let art = artifact(case.case_id);

  s.insert_report(&art, generated(&art)).await.unwrap();
  let fetched = s.get_report(art.report_id).await.unwrap().unwrap();
  assert_eq!(fetched, art);

  let listed = s.list_reports(case.case_id).await.unwrap();
  assert_eq!(listed, vec![art.summary()]);
  assert_eq!(listed[0].ciphertext_size, 4);
}

#[tokio::test]
async fn duplicate_report_id_rejected() {
  let s = store().await;
  let case = new_case(&s, alice()).await;
  let art = artifact(case.case_id);
  s.insert_report(&art, generated(&art)).await.unwrap();
  assert!(matches!(
    s.insert_report(&art, generated(&art)).await,
    Err(Error::Database(_))
  ));

  // The rejected insert left no audit record behind.
  let trail = s.audit_trail(case.case_id).await.unwrap();
  assert_eq!(actions(&trail), vec![AuditAction::CreateCase, AuditAction::GenerateReport]);
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_trail_in_recording_order() {
  let s = store().await;
  let case = new_case(&s, alice()).await;
  let report_id = Uuid::new_v4();

  s.record_audit(
    NewAuditEvent::for_case(&alice(), AuditAction::DownloadReport, case.case_id)
      .with_report(report_id)
      .with_details(serde_json::json!({ "bytes": 42 })),
  )
  .await
  .unwrap();
  s.record_audit(NewAuditEvent::for_case(
    &alice(),
    AuditAction::CreateCase,
    Uuid::new_v4(),
  ))
  .await
  .unwrap();

  let trail = s.audit_trail(case.case_id).await.unwrap();
  assert_eq!(actions(&trail), vec![AuditAction::CreateCase, AuditAction::DownloadReport]);
  assert_eq!(trail[0].case_id, Some(case.case_id));
  assert_eq!(trail[1].report_id, Some(report_id));
  assert_eq!(trail[1].details["bytes"], 42);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn evidence_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("cases.db");

  let (case_id, log) = {
    let s = SqliteStore::open(&path).await.unwrap();
    let case = new_case(&s, alice()).await;
    let mut log = Vec::new();
    append(&s, case.case_id, &mut log).await;
    append(&s, case.case_id, &mut log).await;
    (case.case_id, log)
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let fetched = s.get_case(case_id).await.unwrap().unwrap();
  assert_eq!(fetched.data_collected, log);
  assert_eq!(fetched.evidence_hash, Some(evidence_hash(log.iter()).unwrap()));
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

/// Make every audit insert on the database at `path` fail.
fn reject_audit_inserts(path: &std::path::Path) {
  let raw = rusqlite::Connection::open(path).unwrap();
  raw
    .execute_batch(
      "CREATE TRIGGER audit_offline BEFORE INSERT ON audit_events
       BEGIN SELECT RAISE(ABORT, 'audit offline'); END;",
    )
    .unwrap();
}

#[tokio::test]
async fn writes_roll_back_when_their_audit_fails() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("cases.db");
  let s = SqliteStore::open(&path).await.unwrap();
  let case = new_case(&s, alice()).await;
  let mut log = Vec::new();
  append(&s, case.case_id, &mut log).await;

  reject_audit_inserts(&path);

  let next = snapshot(7).normalized();
  let hash = evidence_hash(log.iter().chain([&next]).collect::<Vec<_>>()).unwrap();
  let err = s
    .append_snapshot(case.case_id, 1, next, hash, collected(case.case_id))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));

  let weights = RiskWeights::default();
  assert!(
    s.record_analysis(
      case.case_id,
      aggregate(vec![fraud(50.0)], &weights).unwrap(),
      1,
      NewAuditEvent::for_case(&alice(), AuditAction::Analyze, case.case_id),
    )
    .await
    .is_err()
  );

  let art = artifact(case.case_id);
  assert!(s.insert_report(&art, generated(&art)).await.is_err());

  assert!(
    s.set_status(
      case.case_id,
      CaseStatus::Completed,
      NewAuditEvent::for_case(&alice(), AuditAction::CompleteCase, case.case_id),
    )
    .await
    .is_err()
  );

  let audit = NewAuditEvent::new(&alice(), AuditAction::CreateCase);
  assert!(s.create_case(alice(), target(), None, audit).await.is_err());

  let fetched = s.get_case(case.case_id).await.unwrap().unwrap();
  assert_eq!(fetched.data_collected, log);
  assert_eq!(fetched.evidence_hash, Some(evidence_hash(log.iter()).unwrap()));
  assert_eq!(fetched.status, CaseStatus::Active);
  assert!(fetched.analysis_results.is_none());
  assert!(s.analysis_history(case.case_id).await.unwrap().is_empty());
  assert!(s.get_report(art.report_id).await.unwrap().is_none());
  assert_eq!(s.list_cases(&alice()).await.unwrap().len(), 1);

  let trail = s.audit_trail(case.case_id).await.unwrap();
  assert_eq!(actions(&trail), vec![AuditAction::CreateCase, AuditAction::CollectEvidence]);
}
