//! JSON REST API for casefile.
//!
//! Exposes an axum [`Router`] over a shared [`CaseController`]. Every
//! handler expects an authenticated [`Investigator`] in the request
//! extensions; authentication itself, TLS, and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", casefile_api::api_router(controller.clone()))
//! ```
//!
//! [`Investigator`]: casefile_core::case::Investigator

pub mod cases;
pub mod error;
pub mod reports;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use casefile_core::{
  collaborator::{AnalysisService, EvidenceCollector},
  store::CaseStore,
};
use casefile_lifecycle::CaseController;

pub use error::ApiError;

/// Build a fully-materialised API router for `controller`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C, A>(controller: Arc<CaseController<S, C, A>>) -> Router<()>
where
  S: CaseStore + 'static,
  C: EvidenceCollector + 'static,
  A: AnalysisService + 'static,
{
  Router::new()
    // Cases
    .route("/cases", get(cases::list::<S, C, A>).post(cases::create::<S, C, A>))
    .route("/cases/{id}", get(cases::get_one::<S, C, A>))
    .route("/cases/{id}/collect", post(cases::collect::<S, C, A>))
    .route("/cases/{id}/analyze", post(cases::analyze::<S, C, A>))
    .route("/cases/{id}/complete", post(cases::complete::<S, C, A>))
    .route("/cases/{id}/integrity", get(cases::integrity::<S, C, A>))
    .route("/cases/{id}/analyses", get(cases::analyses::<S, C, A>))
    .route("/cases/{id}/audit", get(cases::audit::<S, C, A>))
    // Reports
    .route(
      "/cases/{id}/reports",
      get(reports::list::<S, C, A>).post(reports::generate::<S, C, A>),
    )
    .route("/reports/{id}/download", post(reports::download::<S, C, A>))
    .with_state(controller)
}

#[cfg(test)]
mod tests;
