//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored in the fixed microsecond RFC 3339 form from
//! [`casefile_core::timestamp`], so text ordering matches time ordering.
//! Snapshots and analysis results are stored as compact JSON. UUIDs are
//! stored as hyphenated lowercase strings.

use casefile_core::{
  analysis::{AnalysisRecord, AnalysisResult},
  audit::{AuditAction, AuditEvent, NewAuditEvent},
  case::{Case, CaseStatus, CaseSummary, Investigator, Platform, RiskLevel, TargetIdentity},
  evidence::{EvidenceSnapshot, StoredSnapshot},
  integrity::EvidenceHash,
  report::{KdfParams, ReportArtifact, SealedEnvelope},
  timestamp,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { timestamp::format(dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  timestamp::parse(s).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

fn unknown(what: &'static str, value: &str) -> Error {
  Error::Core(casefile_core::Error::UnknownDiscriminant {
    what,
    value: value.to_owned(),
  })
}

pub fn decode_status(s: &str) -> Result<CaseStatus> {
  match s {
    "active" => Ok(CaseStatus::Active),
    "completed" => Ok(CaseStatus::Completed),
    other => Err(unknown("case status", other)),
  }
}

pub fn decode_risk_level(s: &str) -> Result<RiskLevel> {
  match s {
    "low" => Ok(RiskLevel::Low),
    "medium" => Ok(RiskLevel::Medium),
    "high" => Ok(RiskLevel::High),
    "critical" => Ok(RiskLevel::Critical),
    other => Err(unknown("risk level", other)),
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

pub fn encode_snapshot(snapshot: &EvidenceSnapshot) -> Result<String> {
  Ok(serde_json::to_string(snapshot)?)
}

pub fn decode_snapshot(s: &str) -> Result<EvidenceSnapshot> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_analysis(result: &AnalysisResult) -> Result<String> {
  Ok(serde_json::to_string(result)?)
}

pub fn decode_analysis(s: &str) -> Result<AnalysisResult> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawCase::from_row`].
pub const CASE_COLUMNS: &str = "case_id, owner, platform, username, description, status,
   risk_score, risk_level, evidence_hash, created_at, updated_at, completed_at";

/// Raw values read directly from a `cases` row.
pub struct RawCase {
  pub case_id:       String,
  pub owner:         String,
  pub platform:      String,
  pub username:      String,
  pub description:   Option<String>,
  pub status:        String,
  pub risk_score:    f64,
  pub risk_level:    String,
  pub evidence_hash: Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
  pub completed_at:  Option<String>,
}

/// Decoded `cases` columns shared by [`Case`] and [`CaseSummary`].
struct CaseHeader {
  case_id:       Uuid,
  owner:         Investigator,
  target:        TargetIdentity,
  description:   Option<String>,
  status:        CaseStatus,
  risk_score:    f64,
  risk_level:    RiskLevel,
  evidence_hash: Option<EvidenceHash>,
  created_at:    DateTime<Utc>,
  updated_at:    DateTime<Utc>,
  completed_at:  Option<DateTime<Utc>>,
}

impl RawCase {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      case_id:       row.get(0)?,
      owner:         row.get(1)?,
      platform:      row.get(2)?,
      username:      row.get(3)?,
      description:   row.get(4)?,
      status:        row.get(5)?,
      risk_score:    row.get(6)?,
      risk_level:    row.get(7)?,
      evidence_hash: row.get(8)?,
      created_at:    row.get(9)?,
      updated_at:    row.get(10)?,
      completed_at:  row.get(11)?,
    })
  }

  fn decode(self) -> Result<CaseHeader> {
    let platform: Platform = self.platform.parse()?;
    Ok(CaseHeader {
      case_id:       decode_uuid(&self.case_id)?,
      owner:         Investigator::new(self.owner),
      target:        TargetIdentity { platform, username: self.username },
      description:   self.description,
      status:        decode_status(&self.status)?,
      risk_score:    self.risk_score,
      risk_level:    decode_risk_level(&self.risk_level)?,
      evidence_hash: self
        .evidence_hash
        .as_deref()
        .map(EvidenceHash::from_hex)
        .transpose()?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      completed_at:  self.completed_at.as_deref().map(decode_dt).transpose()?,
    })
  }

  /// Assemble a full case from its row, its snapshot log (in sequence
  /// order), and the JSON of its current analysis.
  pub fn into_case(
    self,
    snapshots: Vec<String>,
    analysis: Option<String>,
  ) -> Result<Case> {
    let h = self.decode()?;
    let data_collected = snapshots
      .iter()
      .map(|s| decode_snapshot(s))
      .collect::<Result<Vec<_>>>()?;
    let analysis_results = analysis.as_deref().map(decode_analysis).transpose()?;

    Ok(Case {
      case_id: h.case_id,
      owner: h.owner,
      target: h.target,
      description: h.description,
      status: h.status,
      risk_score: h.risk_score,
      risk_level: h.risk_level,
      evidence_hash: h.evidence_hash,
      analysis_results,
      data_collected,
      created_at: h.created_at,
      updated_at: h.updated_at,
      completed_at: h.completed_at,
    })
  }

  pub fn into_summary(self, snapshot_count: usize, analyzed: bool) -> Result<CaseSummary> {
    let h = self.decode()?;
    Ok(CaseSummary {
      case_id: h.case_id,
      owner: h.owner,
      target: h.target,
      description: h.description,
      status: h.status,
      risk_score: h.risk_score,
      risk_level: h.risk_level,
      evidence_hash: h.evidence_hash,
      snapshot_count,
      analyzed,
      created_at: h.created_at,
      updated_at: h.updated_at,
    })
  }
}

/// Raw values read from a `snapshots` row.
pub struct RawSnapshot {
  pub sequence:      u32,
  pub snapshot_json: String,
}

impl RawSnapshot {
  pub fn into_stored(self) -> Result<StoredSnapshot> {
    Ok(StoredSnapshot {
      sequence: self.sequence,
      snapshot: decode_snapshot(&self.snapshot_json)?,
    })
  }
}

/// Raw values read from an `analyses` row.
pub struct RawAnalysis {
  pub version:     u32,
  pub result_json: String,
  pub risk_score:  f64,
  pub risk_level:  String,
  pub snapshots:   u32,
  pub analyzed_at: String,
}

impl RawAnalysis {
  pub fn into_record(self) -> Result<AnalysisRecord> {
    Ok(AnalysisRecord {
      version:     self.version,
      result:      decode_analysis(&self.result_json)?,
      risk_score:  self.risk_score,
      risk_level:  decode_risk_level(&self.risk_level)?,
      snapshots:   self.snapshots,
      analyzed_at: decode_dt(&self.analyzed_at)?,
    })
  }
}

/// Column list matching [`RawReport::from_row`].
pub const REPORT_COLUMNS: &str = "report_id, case_id, owner, created_at, envelope_version,
   kdf_memory_kib, kdf_iterations, kdf_parallelism, salt, nonce, ciphertext,
   integrity_tag, evidence_hash";

/// Raw values read from a `reports` row.
pub struct RawReport {
  pub report_id:        String,
  pub case_id:          String,
  pub owner:            String,
  pub created_at:       String,
  pub envelope_version: u8,
  pub kdf_memory_kib:   u32,
  pub kdf_iterations:   u32,
  pub kdf_parallelism:  u32,
  pub salt:             Vec<u8>,
  pub nonce:            Vec<u8>,
  pub ciphertext:       Vec<u8>,
  pub integrity_tag:    Vec<u8>,
  pub evidence_hash:    String,
}

impl RawReport {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report_id:        row.get(0)?,
      case_id:          row.get(1)?,
      owner:            row.get(2)?,
      created_at:       row.get(3)?,
      envelope_version: row.get(4)?,
      kdf_memory_kib:   row.get(5)?,
      kdf_iterations:   row.get(6)?,
      kdf_parallelism:  row.get(7)?,
      salt:             row.get(8)?,
      nonce:            row.get(9)?,
      ciphertext:       row.get(10)?,
      integrity_tag:    row.get(11)?,
      evidence_hash:    row.get(12)?,
    })
  }

  pub fn into_artifact(self) -> Result<ReportArtifact> {
    Ok(ReportArtifact {
      report_id:  decode_uuid(&self.report_id)?,
      case_id:    decode_uuid(&self.case_id)?,
      owner:      Investigator::new(self.owner),
      created_at: decode_dt(&self.created_at)?,
      envelope:   SealedEnvelope {
        version:       self.envelope_version,
        kdf:           KdfParams {
          memory_kib:  self.kdf_memory_kib,
          iterations:  self.kdf_iterations,
          parallelism: self.kdf_parallelism,
        },
        salt:          self.salt,
        nonce:         self.nonce,
        ciphertext:    self.ciphertext,
        integrity_tag: self.integrity_tag,
        evidence_hash: EvidenceHash::from_hex(&self.evidence_hash)?,
      },
    })
  }
}

/// Raw values read from an `audit_events` row.
pub struct RawAuditEvent {
  pub event_id:     String,
  pub actor:        String,
  pub action:       String,
  pub case_id:      Option<String>,
  pub report_id:    Option<String>,
  pub details_json: String,
  pub recorded_at:  String,
}

impl RawAuditEvent {
  /// Stamp `event` with an id and time, returning the recorded event and the
  /// row to insert for it.
  pub fn encode(event: NewAuditEvent) -> Result<(AuditEvent, Self)> {
    let recorded = AuditEvent {
      event_id:    Uuid::new_v4(),
      actor:       event.actor,
      action:      event.action,
      case_id:     event.case_id,
      report_id:   event.report_id,
      details:     event.details,
      recorded_at: timestamp::now(),
    };
    let raw = Self {
      event_id:     encode_uuid(recorded.event_id),
      actor:        recorded.actor.as_str().to_owned(),
      action:       recorded.action.as_str().to_owned(),
      case_id:      recorded.case_id.map(encode_uuid),
      report_id:    recorded.report_id.map(encode_uuid),
      details_json: serde_json::to_string(&recorded.details)?,
      recorded_at:  encode_dt(recorded.recorded_at),
    };
    Ok((recorded, raw))
  }

  /// Insert on `conn`, which is usually the transaction of the write the
  /// event describes.
  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO audit_events (
         event_id, actor, action, case_id, report_id, details_json, recorded_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      rusqlite::params![
        self.event_id,
        self.actor,
        self.action,
        self.case_id,
        self.report_id,
        self.details_json,
        self.recorded_at,
      ],
    )?;
    Ok(())
  }

  pub fn into_event(self) -> Result<AuditEvent> {
    Ok(AuditEvent {
      event_id:    decode_uuid(&self.event_id)?,
      actor:       Investigator::new(self.actor),
      action:      AuditAction::parse(&self.action)?,
      case_id:     self.case_id.as_deref().map(decode_uuid).transpose()?,
      report_id:   self.report_id.as_deref().map(decode_uuid).transpose()?,
      details:     serde_json::from_str(&self.details_json)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
