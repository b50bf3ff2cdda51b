//! HTTP server wiring for casefile.
//!
//! Glues the JSON API to a SQLite store, HTTP clients for the external
//! collector and analysis services, and Basic authentication against the
//! investigator accounts in the configuration.

pub mod auth;
pub mod remote;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware};
use casefile_core::{
  aggregate::RiskWeights,
  collaborator::{AnalysisService, EvidenceCollector},
  report::KdfParams,
  store::CaseStore,
};
use casefile_lifecycle::{CaseController, ControllerConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{Account, require_investigator};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_collect_timeout() -> u64 { 60 }

fn default_analyze_timeout() -> u64 { 120 }

/// Runtime server configuration, deserialised from `casefile.toml` and
/// `CASEFILE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  pub store_path:           PathBuf,
  /// Accounts allowed to use the API.
  #[serde(default)]
  pub investigators:        Vec<Account>,
  /// Endpoint of the evidence collector service.
  pub collector_url:        String,
  /// Endpoint of the detector suite.
  pub analysis_url:         String,
  #[serde(default = "default_collect_timeout")]
  pub collect_timeout_secs: u64,
  #[serde(default = "default_analyze_timeout")]
  pub analyze_timeout_secs: u64,
  #[serde(default)]
  pub risk_weights:         RiskWeights,
  #[serde(default)]
  pub kdf:                  KdfParams,
}

impl ServerConfig {
  /// Controller settings, rejecting invalid risk weights.
  pub fn controller_config(&self) -> casefile_core::Result<ControllerConfig> {
    let config = ControllerConfig {
      collect_timeout: Duration::from_secs(self.collect_timeout_secs),
      analyze_timeout: Duration::from_secs(self.analyze_timeout_secs),
      risk_weights:    self.risk_weights.clone(),
      kdf:             self.kdf,
    };
    config.validate()?;
    Ok(config)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API behind Basic authentication, with request tracing.
pub fn router<S, C, A>(
  controller: Arc<CaseController<S, C, A>>,
  accounts: Arc<Vec<Account>>,
) -> Router
where
  S: CaseStore + 'static,
  C: EvidenceCollector + 'static,
  A: AnalysisService + 'static,
{
  casefile_api::api_router(controller)
    .layer(middleware::from_fn_with_state(accounts, require_investigator))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
