//! Case: a single investigation against one target identity.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  analysis::AnalysisResult,
  evidence::EvidenceSnapshot,
  integrity::EvidenceHash,
};

// ─── Identity ────────────────────────────────────────────────────────────────

/// The authenticated caller of a case operation.
///
/// Passed explicitly into every controller call; there is no ambient
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Investigator(String);

impl Investigator {
  pub fn new(username: impl Into<String>) -> Self { Self(username.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Investigator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Social-media platforms the evidence collector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Twitter,
  Instagram,
  Facebook,
  Linkedin,
}

impl Platform {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Twitter => "twitter",
      Self::Instagram => "instagram",
      Self::Facebook => "facebook",
      Self::Linkedin => "linkedin",
    }
  }
}

impl FromStr for Platform {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "twitter" => Ok(Self::Twitter),
      "instagram" => Ok(Self::Instagram),
      "facebook" => Ok(Self::Facebook),
      "linkedin" => Ok(Self::Linkedin),
      _ => Err(Error::UnknownPlatform(s.to_owned())),
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The account under investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetIdentity {
  pub platform: Platform,
  pub username: String,
}

impl TargetIdentity {
  /// Validate raw caller input.
  pub fn parse(platform: &str, username: &str) -> Result<Self> {
    let username = username.trim();
    if username.is_empty() {
      return Err(Error::EmptyUsername);
    }
    if username.chars().any(char::is_whitespace) {
      return Err(Error::InvalidUsername(username.to_owned()));
    }
    Ok(Self {
      platform: platform.parse()?,
      username: username.to_owned(),
    })
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
  #[default]
  Active,
  Completed,
}

impl CaseStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Completed => "completed",
    }
  }
}

/// Coarse banding of the 0–100 risk score.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
  #[default]
  Low,
  Medium,
  High,
  Critical,
}

impl RiskLevel {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
      Self::Critical => "critical",
    }
  }
}

// ─── Case ────────────────────────────────────────────────────────────────────

/// Full case record, including the evidence log and current analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
  pub case_id:          Uuid,
  pub owner:            Investigator,
  pub target:           TargetIdentity,
  pub description:      Option<String>,
  pub status:           CaseStatus,
  /// 0–100; meaningful only once `analysis_results` is present.
  pub risk_score:       f64,
  pub risk_level:       RiskLevel,
  /// Present once at least one snapshot has been collected.
  pub evidence_hash:    Option<EvidenceHash>,
  pub analysis_results: Option<AnalysisResult>,
  /// Collection order.
  pub data_collected:   Vec<EvidenceSnapshot>,
  #[serde(with = "crate::timestamp")]
  pub created_at:       DateTime<Utc>,
  #[serde(with = "crate::timestamp")]
  pub updated_at:       DateTime<Utc>,
  #[serde(with = "crate::timestamp::option")]
  pub completed_at:     Option<DateTime<Utc>>,
}

impl Case {
  pub fn is_owned_by(&self, who: &Investigator) -> bool { &self.owner == who }

  pub fn summary(&self) -> CaseSummary {
    CaseSummary {
      case_id:        self.case_id,
      owner:          self.owner.clone(),
      target:         self.target.clone(),
      description:    self.description.clone(),
      status:         self.status,
      risk_score:     self.risk_score,
      risk_level:     self.risk_level,
      evidence_hash:  self.evidence_hash.clone(),
      snapshot_count: self.data_collected.len(),
      analyzed:       self.analysis_results.is_some(),
      created_at:     self.created_at,
      updated_at:     self.updated_at,
    }
  }
}

/// Listing view of a case, without evidence or analysis payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSummary {
  pub case_id:        Uuid,
  pub owner:          Investigator,
  pub target:         TargetIdentity,
  pub description:    Option<String>,
  pub status:         CaseStatus,
  pub risk_score:     f64,
  pub risk_level:     RiskLevel,
  pub evidence_hash:  Option<EvidenceHash>,
  pub snapshot_count: usize,
  pub analyzed:       bool,
  #[serde(with = "crate::timestamp")]
  pub created_at:     DateTime<Utc>,
  #[serde(with = "crate::timestamp")]
  pub updated_at:     DateTime<Utc>,
}

/// Caller input for case creation, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCase {
  pub target_username: String,
  pub platform:        String,
  #[serde(default)]
  pub description:     Option<String>,
}
