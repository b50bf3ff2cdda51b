//! Risk aggregation. Folds detector outputs into one composite record and a
//! scalar 0–100 risk score.
//!
//! Each present detector contributes `min(signal * weight, cap)`:
//!
//! | Detector      | Signal                | Counted when          | Default weight / cap |
//! |---------------|-----------------------|-----------------------|----------------------|
//! | cyberbullying | `confidence`          | `detected`            | 0.4 / 40 |
//! | fraud         | `confidence`          | `detected`            | 0.3 / 30 |
//! | fake profile  | `fake_score`          | always                | 0.2 / 20 |
//! | sentiment     | `negative_percentage` | overall is `negative` | 0.1 / 10 |
//!
//! The sum is clamped to `[0, 100]` and rounded to two decimals. Absent
//! detectors contribute nothing and are left out of the composite.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  analysis::{
    AnalysisResult, CyberbullyingResult, DetectorKind, DetectorResult,
    FakeProfileResult, FraudResult, SentimentLabel, SentimentResult,
  },
  case::RiskLevel,
};

/// Sentiment percentages may drift from 100 by this much due to rounding.
const SENTIMENT_SUM_TOLERANCE: f64 = 1.0;

// ─── Weights ─────────────────────────────────────────────────────────────────

/// Adjustable combination policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
  pub cyberbullying_weight:      f64,
  pub cyberbullying_cap:         f64,
  pub fraud_weight:              f64,
  pub fraud_cap:                 f64,
  pub fake_profile_weight:       f64,
  pub fake_profile_cap:          f64,
  pub negative_sentiment_weight: f64,
  pub negative_sentiment_cap:    f64,
  /// Lower bound (inclusive) of [`RiskLevel::Medium`].
  pub medium_threshold:          f64,
  pub high_threshold:            f64,
  pub critical_threshold:        f64,
}

impl Default for RiskWeights {
  fn default() -> Self {
    Self {
      cyberbullying_weight:      0.4,
      cyberbullying_cap:         40.0,
      fraud_weight:              0.3,
      fraud_cap:                 30.0,
      fake_profile_weight:       0.2,
      fake_profile_cap:          20.0,
      negative_sentiment_weight: 0.1,
      negative_sentiment_cap:    10.0,
      medium_threshold:          25.0,
      high_threshold:            50.0,
      critical_threshold:        75.0,
    }
  }
}

impl RiskWeights {
  /// Reject configurations that could yield a NaN or negative score, or
  /// overlapping risk levels.
  pub fn validate(&self) -> Result<()> {
    let fields = [
      ("cyberbullying_weight", self.cyberbullying_weight),
      ("cyberbullying_cap", self.cyberbullying_cap),
      ("fraud_weight", self.fraud_weight),
      ("fraud_cap", self.fraud_cap),
      ("fake_profile_weight", self.fake_profile_weight),
      ("fake_profile_cap", self.fake_profile_cap),
      ("negative_sentiment_weight", self.negative_sentiment_weight),
      ("negative_sentiment_cap", self.negative_sentiment_cap),
      ("medium_threshold", self.medium_threshold),
      ("high_threshold", self.high_threshold),
      ("critical_threshold", self.critical_threshold),
    ];
    for (field, value) in fields {
      if !value.is_finite() || value < 0.0 {
        return Err(Error::InvalidWeight { field, value });
      }
    }
    if self.medium_threshold > self.high_threshold
      || self.high_threshold > self.critical_threshold
    {
      return Err(Error::ThresholdOrder);
    }
    Ok(())
  }

  pub fn level_for(&self, score: f64) -> RiskLevel {
    if score >= self.critical_threshold {
      RiskLevel::Critical
    } else if score >= self.high_threshold {
      RiskLevel::High
    } else if score >= self.medium_threshold {
      RiskLevel::Medium
    } else {
      RiskLevel::Low
    }
  }
}

// ─── Per-detector behaviour ──────────────────────────────────────────────────

fn check_percent(kind: DetectorKind, field: &'static str, value: f64) -> Result<()> {
  if value.is_finite() && (0.0..=100.0).contains(&value) {
    Ok(())
  } else {
    Err(Error::OutOfRange { detector: kind, field, value })
  }
}

fn capped(signal: f64, weight: f64, cap: f64) -> f64 { (signal * weight).min(cap) }

impl DetectorResult {
  /// Reject outputs that fall outside the documented ranges.
  pub fn validate(&self) -> Result<()> {
    let kind = self.kind();
    match self {
      Self::Sentiment(s) => {
        check_percent(kind, "positive_percentage", s.positive_percentage)?;
        check_percent(kind, "negative_percentage", s.negative_percentage)?;
        check_percent(kind, "neutral_percentage", s.neutral_percentage)?;
        let sum = s.positive_percentage + s.negative_percentage + s.neutral_percentage;
        // All-zero is what a detector reports for an account with no posts.
        if sum != 0.0 && (sum - 100.0).abs() > SENTIMENT_SUM_TOLERANCE {
          return Err(Error::SentimentSum(sum));
        }
        Ok(())
      }
      Self::Cyberbullying(c) => check_percent(kind, "confidence", c.confidence),
      Self::Fraud(f) => check_percent(kind, "confidence", f.confidence),
      Self::FakeProfile(p) => {
        check_percent(kind, "fake_score", p.fake_score)?;
        if !p.follower_ratio.is_finite() || p.follower_ratio < 0.0 {
          return Err(Error::OutOfRange {
            detector: kind,
            field:    "follower_ratio",
            value:    p.follower_ratio,
          });
        }
        Ok(())
      }
    }
  }

  /// Points this result adds to the composite score under `weights`.
  pub fn risk_contribution(&self, weights: &RiskWeights) -> f64 {
    match self {
      Self::Sentiment(SentimentResult { overall, negative_percentage, .. }) => {
        if *overall == SentimentLabel::Negative {
          capped(
            *negative_percentage,
            weights.negative_sentiment_weight,
            weights.negative_sentiment_cap,
          )
        } else {
          0.0
        }
      }
      Self::Cyberbullying(CyberbullyingResult { detected, confidence, .. }) => {
        if *detected {
          capped(*confidence, weights.cyberbullying_weight, weights.cyberbullying_cap)
        } else {
          0.0
        }
      }
      Self::Fraud(FraudResult { detected, confidence, .. }) => {
        if *detected {
          capped(*confidence, weights.fraud_weight, weights.fraud_cap)
        } else {
          0.0
        }
      }
      Self::FakeProfile(FakeProfileResult { fake_score, .. }) => {
        capped(*fake_score, weights.fake_profile_weight, weights.fake_profile_cap)
      }
    }
  }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Output of [`aggregate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
  pub result:     AnalysisResult,
  pub risk_score: f64,
  pub risk_level: RiskLevel,
}

fn place<T>(slot: &mut Option<T>, value: T, kind: DetectorKind) -> Result<()> {
  if slot.is_some() {
    return Err(Error::DuplicateDetector(kind));
  }
  *slot = Some(value);
  Ok(())
}

/// Merge detector outputs into a composite record and score.
///
/// Fails on malformed output (out-of-range values, a detector reported
/// twice); nothing is partially merged in that case.
pub fn aggregate(
  results: Vec<DetectorResult>,
  weights: &RiskWeights,
) -> Result<Aggregate> {
  let mut composite = AnalysisResult::default();
  let mut score = 0.0;

  for detector in results {
    detector.validate()?;
    score += detector.risk_contribution(weights);
    let kind = detector.kind();
    match detector {
      DetectorResult::Sentiment(s) => place(&mut composite.sentiment, s, kind)?,
      DetectorResult::Cyberbullying(c) => {
        place(&mut composite.cyberbullying, c, kind)?
      }
      DetectorResult::Fraud(f) => place(&mut composite.fraud_detection, f, kind)?,
      DetectorResult::FakeProfile(p) => place(&mut composite.fake_profile, p, kind)?,
    }
  }

  let risk_score = (score.clamp(0.0, 100.0) * 100.0).round() / 100.0;
  Ok(Aggregate {
    result: composite,
    risk_score,
    risk_level: weights.level_for(risk_score),
  })
}
