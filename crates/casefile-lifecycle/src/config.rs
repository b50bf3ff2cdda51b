//! Controller settings.

use std::time::Duration;

use casefile_core::{aggregate::RiskWeights, report::KdfParams};
use serde::{Deserialize, Serialize};

/// Tunables for a [`crate::CaseController`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
  /// Upper bound on a single evidence-collector call.
  pub collect_timeout: Duration,
  /// Upper bound on a single analysis-service call.
  pub analyze_timeout: Duration,
  pub risk_weights:    RiskWeights,
  /// Argon2id cost for newly sealed reports. Existing reports keep the
  /// parameters they were sealed with.
  pub kdf:             KdfParams,
}

impl ControllerConfig {
  /// Check the tunables that come from user configuration.
  pub fn validate(&self) -> casefile_core::Result<()> { self.risk_weights.validate() }
}

impl Default for ControllerConfig {
  fn default() -> Self {
    Self {
      collect_timeout: Duration::from_secs(60),
      analyze_timeout: Duration::from_secs(120),
      risk_weights:    RiskWeights::default(),
      kdf:             KdfParams::default(),
    }
  }
}
