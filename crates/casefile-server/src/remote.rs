//! HTTP clients for the external evidence collector and analysis service.
//!
//! Both services speak JSON over POST. The collector takes a
//! [`TargetIdentity`] and answers with one [`EvidenceSnapshot`]; the analysis
//! service takes `{"evidence": [...]}` and answers with
//! `{"results": [...]}`, one tagged [`DetectorResult`] per detector that ran.

use casefile_core::{
  analysis::DetectorResult,
  case::TargetIdentity,
  collaborator::{AnalysisService, EvidenceCollector},
  evidence::EvidenceSnapshot,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("service returned {status}: {body}")]
  Status { status: StatusCode, body: String },
}

async fn post_json<Req, Res>(client: &Client, url: &str, request: &Req) -> Result<Res, RemoteError>
where
  Req: Serialize + ?Sized,
  Res: for<'de> Deserialize<'de>,
{
  let response = client.post(url).json(request).send().await?;

  if !response.status().is_success() {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    return Err(RemoteError::Status { status, body });
  }

  Ok(response.json().await?)
}

// ─── Collector ────────────────────────────────────────────────────────────────

pub struct HttpCollector {
  client: Client,
  url:    String,
}

impl HttpCollector {
  pub fn new(client: Client, url: impl Into<String>) -> Self {
    Self { client, url: url.into() }
  }
}

impl EvidenceCollector for HttpCollector {
  type Error = RemoteError;

  async fn collect(&self, target: &TargetIdentity) -> Result<EvidenceSnapshot, RemoteError> {
    let snapshot: EvidenceSnapshot = post_json(&self.client, &self.url, target).await?;
    debug!(
      platform = %target.platform,
      username = %target.username,
      posts = snapshot.posts.len(),
      "collected snapshot"
    );
    Ok(snapshot)
  }
}

// ─── Analysis ─────────────────────────────────────────────────────────────────

pub struct HttpAnalysisService {
  client: Client,
  url:    String,
}

impl HttpAnalysisService {
  pub fn new(client: Client, url: impl Into<String>) -> Self {
    Self { client, url: url.into() }
  }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
  evidence: &'a [EvidenceSnapshot],
}

#[derive(Deserialize)]
struct AnalyzeResponse {
  #[serde(default)]
  results: Vec<DetectorResult>,
}

impl AnalysisService for HttpAnalysisService {
  type Error = RemoteError;

  async fn analyze(&self, evidence: &[EvidenceSnapshot]) -> Result<Vec<DetectorResult>, RemoteError> {
    let response: AnalyzeResponse =
      post_json(&self.client, &self.url, &AnalyzeRequest { evidence }).await?;
    debug!(
      snapshots = evidence.len(),
      detectors = response.results.len(),
      "analysis returned"
    );
    Ok(response.results)
  }
}
