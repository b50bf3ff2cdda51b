//! Handlers for `/cases` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/cases` | The caller's cases, oldest first |
//! | `POST` | `/cases` | Body: [`NewCase`]; returns 201 + case |
//! | `GET`  | `/cases/:id` | Full case incl. evidence and current analysis |
//! | `POST` | `/cases/:id/collect` | Capture one more snapshot |
//! | `POST` | `/cases/:id/analyze` | Re-run the detector suite |
//! | `POST` | `/cases/:id/complete` | Close the case |
//! | `GET`  | `/cases/:id/integrity` | 409 if the evidence hash no longer matches |
//! | `GET`  | `/cases/:id/analyses` | Analysis history |
//! | `GET`  | `/cases/:id/audit` | Audit trail |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use casefile_core::{
  analysis::AnalysisRecord,
  audit::AuditEvent,
  case::{Case, CaseSummary, Investigator, NewCase},
  collaborator::{AnalysisService, EvidenceCollector},
  integrity::IntegrityReport,
  store::CaseStore,
};
use casefile_lifecycle::CaseController;
use uuid::Uuid;

use crate::error::ApiError;

type Ctl<S, C, A> = State<Arc<CaseController<S, C, A>>>;

// ─── List / create ───────────────────────────────────────────────────────────

/// `GET /cases`
pub async fn list<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
) -> Result<Json<Vec<CaseSummary>>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.list(&actor).await?))
}

/// `POST /cases`, body: `{"target_username":"..","platform":"twitter"}`
pub async fn create<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Json(body): Json<NewCase>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  let case = ctl.create(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(case)))
}

// ─── Single case ─────────────────────────────────────────────────────────────

/// `GET /cases/:id`
pub async fn get_one<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(id): Path<Uuid>,
) -> Result<Json<Case>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.get(&actor, id).await?))
}

/// `POST /cases/:id/collect`
pub async fn collect<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(id): Path<Uuid>,
) -> Result<Json<Case>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.collect_evidence(&actor, id).await?))
}

/// `POST /cases/:id/analyze`
pub async fn analyze<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(id): Path<Uuid>,
) -> Result<Json<Case>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.analyze(&actor, id).await?))
}

/// `POST /cases/:id/complete`
pub async fn complete<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(id): Path<Uuid>,
) -> Result<Json<Case>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.complete(&actor, id).await?))
}

/// `GET /cases/:id/integrity`
pub async fn integrity<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(id): Path<Uuid>,
) -> Result<Json<IntegrityReport>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.verify_integrity(&actor, id).await?))
}

/// `GET /cases/:id/analyses`
pub async fn analyses<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AnalysisRecord>>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.analysis_history(&actor, id).await?))
}

/// `GET /cases/:id/audit`
pub async fn audit<S, C, A>(
  State(ctl): Ctl<S, C, A>,
  Extension(actor): Extension<Investigator>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditEvent>>, ApiError>
where
  S: CaseStore,
  C: EvidenceCollector,
  A: AnalysisService,
{
  Ok(Json(ctl.audit_trail(&actor, id).await?))
}
