//! Handlers for report endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/cases/:id/reports` | Metadata only |
//! | `POST` | `/cases/:id/reports` | Body: `{"password":".."}`; returns 201 + summary |
//! | `POST` | `/reports/:id/download` | Body: `{"password":".."}`; returns `text/plain` |
//!
//! Passwords travel in the request body so they never end up in access logs.

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use casefile_core::{
  case::Investigator,
  collaborator::{AnalysisService, EvidenceCollector},
  report::ReportSummary,
  store::CaseStore,
};
use casefile_lifecycle::CaseController;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

type Ctl<S, C, A> = State<Arc<CaseController<S, C, A>>>;

#[derive(Deserialize)]
pub struct PasswordBody {
  pub password: String,
}

impl std::fmt::Debug for PasswordBody {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PasswordBody").finish_non_exhaustive()
  }
}

/// `GET /cases/:id/reports`
pub async fn list<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(case_id): Path<Uuid>,
) -> Result<Json<Vec<ReportSummary>>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.list_reports(&actor, case_id).await?))
}

/// `POST /cases/:id/reports`
pub async fn generate<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(case_id): Path<Uuid>,
  Json(body): Json<PasswordBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  let summary = ctl.generate_report(&actor, case_id, &body.password).await?;
  Ok((StatusCode::CREATED, Json(summary)))
}

/// `POST /reports/:id/download`
pub async fn download<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(report_id): Path<Uuid>,
  Json(body): Json<PasswordBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  let document = ctl.download_report(&actor, report_id, &body.password).await?;
  let disposition = format!("attachment; filename=\"report-{report_id}.txt\"");
  Ok((
    [
      (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    document,
  ))
}
