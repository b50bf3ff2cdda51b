//! [`SqliteStore`]: the SQLite implementation of [`CaseStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use casefile_core::{
  aggregate::Aggregate,
  analysis::AnalysisRecord,
  audit::{AuditEvent, NewAuditEvent},
  case::{Case, CaseStatus, CaseSummary, Investigator, RiskLevel, TargetIdentity},
  evidence::{EvidenceSnapshot, StoredSnapshot},
  integrity::EvidenceHash,
  report::{ReportArtifact, ReportSummary},
  store::CaseStore,
  timestamp,
};

use crate::{
  Error, Result,
  encode::{
    CASE_COLUMNS, REPORT_COLUMNS, RawAnalysis, RawAuditEvent, RawCase, RawReport,
    RawSnapshot, encode_analysis, encode_dt, encode_snapshot, encode_uuid,
  },
  schema::SCHEMA,
};

/// Outcome of a guarded write that may find the case gone or the log moved.
enum Guarded<T> {
  Written(T),
  MissingCase,
  Conflict { next: u32 },
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A case store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn case_exists(conn: &rusqlite::Connection, case_id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM cases WHERE case_id = ?1",
        rusqlite::params![case_id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = Error;

  // ── Cases ─────────────────────────────────────────────────────────────────

  async fn create_case(
    &self,
    owner: Investigator,
    target: TargetIdentity,
    description: Option<String>,
    audit: NewAuditEvent,
  ) -> Result<Case> {
    let now = timestamp::now();
    let case = Case {
      case_id: Uuid::new_v4(),
      owner,
      target,
      description,
      status: CaseStatus::Active,
      risk_score: 0.0,
      risk_level: RiskLevel::Low,
      evidence_hash: None,
      analysis_results: None,
      data_collected: Vec::new(),
      created_at: now,
      updated_at: now,
      completed_at: None,
    };

    let id_str      = encode_uuid(case.case_id);
    let owner_str   = case.owner.as_str().to_owned();
    let platform    = case.target.platform.as_str();
    let username    = case.target.username.clone();
    let description = case.description.clone();
    let status      = case.status.as_str();
    let level       = case.risk_level.as_str();
    let at_str      = encode_dt(now);
    let (_, audit)  = RawAuditEvent::encode(NewAuditEvent {
      case_id: Some(case.case_id),
      ..audit
    })?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO cases (
             case_id, owner, platform, username, description, status,
             risk_score, risk_level, evidence_hash, created_at, updated_at,
             completed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, NULL, ?8, ?8, NULL)",
          rusqlite::params![
            id_str,
            owner_str,
            platform,
            username,
            description,
            status,
            level,
            at_str,
          ],
        )?;
        audit.insert(&tx)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(case)
  }

  async fn get_case(&self, case_id: Uuid) -> Result<Option<Case>> {
    let id_str = encode_uuid(case_id);

    let raw = self
      .conn
      .call(move |conn| {
        // One read transaction so the row, log, and analysis agree.
        let tx = conn.transaction()?;
        let Some(case) = tx
          .query_row(
            &format!("SELECT {CASE_COLUMNS} FROM cases WHERE case_id = ?1"),
            rusqlite::params![id_str],
            RawCase::from_row,
          )
          .optional()?
        else {
          return Ok(None);
        };

        let snapshots = tx
          .prepare(
            "SELECT snapshot_json FROM snapshots WHERE case_id = ?1 ORDER BY sequence",
          )?
          .query_map(rusqlite::params![id_str], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let analysis: Option<String> = tx
          .query_row(
            "SELECT result_json FROM analyses WHERE case_id = ?1
             ORDER BY version DESC LIMIT 1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;

        Ok(Some((case, snapshots, analysis)))
      })
      .await?;

    raw
      .map(|(case, snapshots, analysis)| case.into_case(snapshots, analysis))
      .transpose()
  }

  async fn list_cases(&self, owner: &Investigator) -> Result<Vec<CaseSummary>> {
    let owner_str = owner.as_str().to_owned();

    let raws: Vec<(RawCase, u32, bool)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CASE_COLUMNS},
             (SELECT COUNT(*) FROM snapshots s WHERE s.case_id = cases.case_id),
             EXISTS (SELECT 1 FROM analyses a WHERE a.case_id = cases.case_id)
           FROM cases
           WHERE owner = ?1
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], |row| {
            Ok((RawCase::from_row(row)?, row.get(12)?, row.get(13)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, count, analyzed)| raw.into_summary(count as usize, analyzed))
      .collect()
  }

  async fn set_status(
    &self,
    case_id: Uuid,
    status: CaseStatus,
    audit: NewAuditEvent,
  ) -> Result<()> {
    let id_str     = encode_uuid(case_id);
    let status_str = status.as_str();
    let now        = encode_dt(timestamp::now());
    let completed  = (status == CaseStatus::Completed).then(|| now.clone());
    let (_, audit) = RawAuditEvent::encode(audit)?;

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE cases
             SET status = ?2, updated_at = ?3,
                 completed_at = COALESCE(completed_at, ?4)
           WHERE case_id = ?1",
          rusqlite::params![id_str, status_str, now, completed],
        )?;
        if changed > 0 {
          audit.insert(&tx)?;
          tx.commit()?;
        }
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(Error::CaseNotFound(case_id));
    }
    Ok(())
  }

  // ── Evidence (append-only) ────────────────────────────────────────────────

  async fn append_snapshot(
    &self,
    case_id: Uuid,
    sequence: u32,
    snapshot: EvidenceSnapshot,
    evidence_hash: EvidenceHash,
    audit: NewAuditEvent,
  ) -> Result<StoredSnapshot> {
    let snapshot      = snapshot.normalized();
    let id_str        = encode_uuid(case_id);
    let snapshot_json = encode_snapshot(&snapshot)?;
    let hash_str      = evidence_hash.as_str().to_owned();
    let now           = encode_dt(timestamp::now());
    let (_, audit)    = RawAuditEvent::encode(audit)?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !case_exists(&tx, &id_str)? {
          return Ok(Guarded::MissingCase);
        }

        let next: u32 = tx.query_row(
          "SELECT COUNT(*) FROM snapshots WHERE case_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        if next != sequence {
          return Ok(Guarded::Conflict { next });
        }

        tx.execute(
          "INSERT INTO snapshots (case_id, sequence, snapshot_json, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, sequence, snapshot_json, now],
        )?;
        tx.execute(
          "UPDATE cases SET evidence_hash = ?2, updated_at = ?3 WHERE case_id = ?1",
          rusqlite::params![id_str, hash_str, now],
        )?;
        audit.insert(&tx)?;
        tx.commit()?;
        Ok(Guarded::Written(()))
      })
      .await?;

    match outcome {
      Guarded::Written(()) => Ok(StoredSnapshot { sequence, snapshot }),
      Guarded::MissingCase => Err(Error::CaseNotFound(case_id)),
      Guarded::Conflict { next } => Err(Error::SequenceConflict {
        case_id,
        attempted: sequence,
        next,
      }),
    }
  }

  async fn list_snapshots(&self, case_id: Uuid) -> Result<Vec<StoredSnapshot>> {
    let id_str = encode_uuid(case_id);

    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT sequence, snapshot_json FROM snapshots
           WHERE case_id = ?1 ORDER BY sequence",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawSnapshot {
              sequence:      row.get(0)?,
              snapshot_json: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSnapshot::into_stored).collect()
  }

  // ── Analysis (versioned) ──────────────────────────────────────────────────

  async fn record_analysis(
    &self,
    case_id: Uuid,
    aggregate: Aggregate,
    snapshots: u32,
    audit: NewAuditEvent,
  ) -> Result<AnalysisRecord> {
    let analyzed_at = timestamp::now();
    let id_str      = encode_uuid(case_id);
    let result_json = encode_analysis(&aggregate.result)?;
    let score       = aggregate.risk_score;
    let level       = aggregate.risk_level.as_str();
    let at_str      = encode_dt(analyzed_at);
    let (_, audit)  = RawAuditEvent::encode(audit)?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !case_exists(&tx, &id_str)? {
          return Ok(Guarded::MissingCase);
        }

        let version: u32 = tx.query_row(
          "SELECT COALESCE(MAX(version), 0) + 1 FROM analyses WHERE case_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;

        tx.execute(
          "INSERT INTO analyses (
             case_id, version, result_json, risk_score, risk_level, snapshots,
             analyzed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, version, result_json, score, level, snapshots, at_str],
        )?;
        tx.execute(
          "UPDATE cases SET risk_score = ?2, risk_level = ?3, updated_at = ?4
           WHERE case_id = ?1",
          rusqlite::params![id_str, score, level, at_str],
        )?;
        audit.insert(&tx)?;
        tx.commit()?;
        Ok(Guarded::Written(version))
      })
      .await?;

    match outcome {
      Guarded::Written(version) => Ok(AnalysisRecord {
        version,
        result: aggregate.result,
        risk_score: aggregate.risk_score,
        risk_level: aggregate.risk_level,
        snapshots,
        analyzed_at,
      }),
      Guarded::MissingCase | Guarded::Conflict { .. } => Err(Error::CaseNotFound(case_id)),
    }
  }

  async fn analysis_history(&self, case_id: Uuid) -> Result<Vec<AnalysisRecord>> {
    let id_str = encode_uuid(case_id);

    let raws: Vec<RawAnalysis> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT version, result_json, risk_score, risk_level, snapshots, analyzed_at
           FROM analyses WHERE case_id = ?1 ORDER BY version",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawAnalysis {
              version:     row.get(0)?,
              result_json: row.get(1)?,
              risk_score:  row.get(2)?,
              risk_level:  row.get(3)?,
              snapshots:   row.get(4)?,
              analyzed_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnalysis::into_record).collect()
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn insert_report(&self, artifact: &ReportArtifact, audit: NewAuditEvent) -> Result<()> {
    let env             = &artifact.envelope;
    let report_id_str   = encode_uuid(artifact.report_id);
    let case_id_str     = encode_uuid(artifact.case_id);
    let owner_str       = artifact.owner.as_str().to_owned();
    let created_at_str  = encode_dt(artifact.created_at);
    let version         = env.version;
    let kdf             = env.kdf;
    let salt            = env.salt.clone();
    let nonce           = env.nonce.clone();
    let ciphertext      = env.ciphertext.clone();
    let integrity_tag   = env.integrity_tag.clone();
    let hash_str        = env.evidence_hash.as_str().to_owned();
    let (_, audit)      = RawAuditEvent::encode(audit)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO reports ({REPORT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
          ),
          rusqlite::params![
            report_id_str,
            case_id_str,
            owner_str,
            created_at_str,
            version,
            kdf.memory_kib,
            kdf.iterations,
            kdf.parallelism,
            salt,
            nonce,
            ciphertext,
            integrity_tag,
            hash_str,
          ],
        )?;
        audit.insert(&tx)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_report(&self, report_id: Uuid) -> Result<Option<ReportArtifact>> {
    let id_str = encode_uuid(report_id);

    let raw: Option<RawReport> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?1"),
              rusqlite::params![id_str],
              RawReport::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReport::into_artifact).transpose()
  }

  async fn list_reports(&self, case_id: Uuid) -> Result<Vec<ReportSummary>> {
    let id_str = encode_uuid(case_id);

    let raws: Vec<RawReport> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REPORT_COLUMNS} FROM reports
           WHERE case_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawReport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| raw.into_artifact().map(|a| a.summary()))
      .collect()
  }

  // ── Audit ─────────────────────────────────────────────────────────────────

  async fn record_audit(&self, event: NewAuditEvent) -> Result<AuditEvent> {
    let (recorded, raw) = RawAuditEvent::encode(event)?;

    self
      .conn
      .call(move |conn| {
        raw.insert(conn)?;
        Ok(())
      })
      .await?;

    Ok(recorded)
  }

  async fn audit_trail(&self, case_id: Uuid) -> Result<Vec<AuditEvent>> {
    let id_str = encode_uuid(case_id);

    let raws: Vec<RawAuditEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, actor, action, case_id, report_id, details_json, recorded_at
           FROM audit_events WHERE case_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawAuditEvent {
              event_id:     row.get(0)?,
              actor:        row.get(1)?,
              action:       row.get(2)?,
              case_id:      row.get(3)?,
              report_id:    row.get(4)?,
              details_json: row.get(5)?,
              recorded_at:  row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEvent::into_event).collect()
  }
}
