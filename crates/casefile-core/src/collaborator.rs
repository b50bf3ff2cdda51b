//! External collaborators consumed by the case lifecycle.
//!
//! Both are opaque services: how content is fetched and how detectors score
//! it is their business. Their errors are surfaced to the caller unchanged;
//! any retry policy belongs inside the implementation.

use std::future::Future;

use crate::{analysis::DetectorResult, case::TargetIdentity, evidence::EvidenceSnapshot};

/// Captures one evidence snapshot of a target account.
pub trait EvidenceCollector: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn collect<'a>(
    &'a self,
    target: &'a TargetIdentity,
  ) -> impl Future<Output = Result<EvidenceSnapshot, Self::Error>> + Send + 'a;
}

/// Runs the detector suite over a case's full evidence sequence.
///
/// May return any subset of detectors, including none.
pub trait AnalysisService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn analyze<'a>(
    &'a self,
    evidence: &'a [EvidenceSnapshot],
  ) -> impl Future<Output = Result<Vec<DetectorResult>, Self::Error>> + Send + 'a;
}
