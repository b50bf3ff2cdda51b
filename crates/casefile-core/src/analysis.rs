//! Detector outputs and the composite analysis record.
//!
//! The analysis service returns zero or more [`DetectorResult`]s; the
//! aggregator in [`crate::aggregate`] folds them into an [`AnalysisResult`].
//! Detectors that did not run are simply absent from the composite.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::RiskLevel;

// ─── Detector payloads ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
  Positive,
  Negative,
  Neutral,
}

impl SentimentLabel {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Positive => "positive",
      Self::Negative => "negative",
      Self::Neutral => "neutral",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
  pub overall:             SentimentLabel,
  pub positive_percentage: f64,
  pub negative_percentage: f64,
  pub neutral_percentage:  f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CyberbullyingResult {
  pub detected:        bool,
  /// 0–100.
  pub confidence:      f64,
  pub incidents_count: u32,
  /// Individual keyword or model hits across all incidents.
  #[serde(default)]
  pub total_flags:     u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudResult {
  pub detected:         bool,
  /// 0–100.
  pub confidence:       f64,
  pub suspicious_count: u32,
  #[serde(default)]
  pub total_flags:      u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeProfileResult {
  pub is_potentially_fake: bool,
  /// 0–100.
  pub fake_score:          f64,
  pub account_age_days:    u64,
  pub risk_factors:        Vec<String>,
  /// followers / following, 0 when the account follows nobody.
  #[serde(default)]
  pub follower_ratio:      f64,
}

// ─── Tagged detector output ──────────────────────────────────────────────────

/// Which detector produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
  Sentiment,
  Cyberbullying,
  Fraud,
  FakeProfile,
}

impl DetectorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Sentiment => "sentiment",
      Self::Cyberbullying => "cyberbullying",
      Self::Fraud => "fraud",
      Self::FakeProfile => "fake_profile",
    }
  }
}

impl fmt::Display for DetectorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One detector's output as returned by the analysis service.
///
/// Wire form: `{"detector": "fraud", "detected": true, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "detector", rename_all = "snake_case")]
pub enum DetectorResult {
  Sentiment(SentimentResult),
  Cyberbullying(CyberbullyingResult),
  Fraud(FraudResult),
  FakeProfile(FakeProfileResult),
}

impl DetectorResult {
  pub fn kind(&self) -> DetectorKind {
    match self {
      Self::Sentiment(_) => DetectorKind::Sentiment,
      Self::Cyberbullying(_) => DetectorKind::Cyberbullying,
      Self::Fraud(_) => DetectorKind::Fraud,
      Self::FakeProfile(_) => DetectorKind::FakeProfile,
    }
  }
}

// ─── Composite ───────────────────────────────────────────────────────────────

/// The merged output of one analysis run. Replaced wholesale on re-analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sentiment:       Option<SentimentResult>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cyberbullying:   Option<CyberbullyingResult>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fraud_detection: Option<FraudResult>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fake_profile:    Option<FakeProfileResult>,
}

impl AnalysisResult {
  /// Detectors present in this record, in report order.
  pub fn detectors(&self) -> Vec<DetectorKind> {
    let mut kinds = Vec::with_capacity(4);
    if self.sentiment.is_some() {
      kinds.push(DetectorKind::Sentiment);
    }
    if self.cyberbullying.is_some() {
      kinds.push(DetectorKind::Cyberbullying);
    }
    if self.fraud_detection.is_some() {
      kinds.push(DetectorKind::Fraud);
    }
    if self.fake_profile.is_some() {
      kinds.push(DetectorKind::FakeProfile);
    }
    kinds
  }
}

/// One committed analysis run. Earlier versions stay queryable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
  /// 1-based, increasing per case.
  pub version:     u32,
  pub result:      AnalysisResult,
  pub risk_score:  f64,
  pub risk_level:  RiskLevel,
  /// Number of snapshots the run was computed over.
  pub snapshots:   u32,
  #[serde(with = "crate::timestamp")]
  pub analyzed_at: DateTime<Utc>,
}
