//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use casefile_core::{
  analysis::{DetectorResult, FraudResult},
  case::{Investigator, TargetIdentity},
  collaborator::{AnalysisService, EvidenceCollector},
  evidence::{AccountMetadata, EvidenceSnapshot, Profile},
  report::KdfParams,
};
use casefile_lifecycle::{CaseController, ControllerConfig};
use casefile_store_sqlite::SqliteStore;
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

#[derive(Debug, thiserror::Error)]
#[error("collector offline")]
struct Offline;

struct StaticCollector;

impl EvidenceCollector for StaticCollector {
  type Error = Offline;

  async fn collect(&self, target: &TargetIdentity) -> Result<EvidenceSnapshot, Offline> {
    if target.username == "unreachable" {
      return Err(Offline);
    }
    Ok(EvidenceSnapshot {
      scraped_at: Utc::now(),
      profile:    Profile {
        display_name:      target.username.clone(),
        bio:               String::new(),
        location:          None,
        verified:          false,
        profile_image_url: None,
      },
      metadata:   AccountMetadata::default(),
      posts:      vec![],
    })
  }
}

struct FraudOnly;

impl AnalysisService for FraudOnly {
  type Error = Offline;

  async fn analyze(&self, _: &[EvidenceSnapshot]) -> Result<Vec<DetectorResult>, Offline> {
    Ok(vec![DetectorResult::Fraud(FraudResult {
      detected:         true,
      confidence:       90.0,
      suspicious_count: 3,
      total_flags:      4,
    })])
  }
}

async fn make_router() -> Router {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let config = ControllerConfig {
    kdf: KdfParams { memory_kib: 256, iterations: 1, parallelism: 1 },
    ..Default::default()
  };
  api_router(Arc::new(CaseController::new(store, StaticCollector, FraudOnly, config)))
}

async fn send(
  router: &Router,
  actor: &str,
  method: Method,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Vec<u8>, Option<String>) {
  let mut builder = Request::builder().method(method).uri(uri);
  if body.is_some() {
    builder = builder.header(header::CONTENT_TYPE, "application/json");
  }
  let mut req = builder
    .body(body.map_or_else(Body::empty, |v| Body::from(v.to_string())))
    .unwrap();
  req.extensions_mut().insert(Investigator::new(actor));

  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let content_type = resp
    .headers()
    .get(header::CONTENT_TYPE)
    .map(|v| v.to_str().unwrap().to_owned());
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, bytes.to_vec(), content_type)
}

async fn send_json(
  router: &Router,
  actor: &str,
  method: Method,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let (status, bytes, _) = send(router, actor, method, uri, body).await;
  (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create_case(router: &Router, username: &str) -> String {
  let (status, case) = send_json(
    router,
    "alice",
    Method::POST,
    "/cases",
    Some(json!({ "target_username": username, "platform": "twitter" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  case["case_id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn full_flow_over_http() {
  let router = make_router().await;
  let id = create_case(&router, "target").await;

  let (status, case) =
    send_json(&router, "alice", Method::POST, &format!("/cases/{id}/collect"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(case["data_collected"].as_array().unwrap().len(), 1);
  assert!(case["evidence_hash"].is_string());

  let (status, case) =
    send_json(&router, "alice", Method::POST, &format!("/cases/{id}/analyze"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(case["risk_score"], 27.0);
  assert_eq!(case["risk_level"], "medium");

  let (status, report) = send_json(
    &router,
    "alice",
    Method::POST,
    &format!("/cases/{id}/reports"),
    Some(json!({ "password": "Secret123!" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let report_id = report["report_id"].as_str().unwrap().to_owned();

  let (status, body, content_type) = send(
    &router,
    "alice",
    Method::POST,
    &format!("/reports/{report_id}/download"),
    Some(json!({ "password": "Secret123!" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(content_type.as_deref(), Some("text/plain; charset=utf-8"));
  assert!(String::from_utf8(body).unwrap().contains("FRAUD/SCAM DETECTION"));

  let (status, err) = send_json(
    &router,
    "alice",
    Method::POST,
    &format!("/reports/{report_id}/download"),
    Some(json!({ "password": "wrong" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(err["kind"], "decryption");

  let (status, trail) =
    send_json(&router, "alice", Method::GET, &format!("/cases/{id}/audit"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(trail.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn invalid_platform_is_bad_request() {
  let router = make_router().await;
  let (status, err) = send_json(
    &router,
    "alice",
    Method::POST,
    "/cases",
    Some(json!({ "target_username": "x", "platform": "myspace" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["kind"], "validation");
}

#[tokio::test]
async fn preconditions_are_conflicts() {
  let router = make_router().await;
  let id = create_case(&router, "target").await;

  let (status, err) =
    send_json(&router, "alice", Method::POST, &format!("/cases/{id}/analyze"), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(err["error"], "no data to analyze");

  let (status, err) = send_json(
    &router,
    "alice",
    Method::POST,
    &format!("/cases/{id}/reports"),
    Some(json!({ "password": "pw" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(err["kind"], "precondition");
}

#[tokio::test]
async fn collector_failure_is_bad_gateway() {
  let router = make_router().await;
  let id = create_case(&router, "unreachable").await;

  let (status, err) =
    send_json(&router, "alice", Method::POST, &format!("/cases/{id}/collect"), None).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(err["kind"], "collection");
  assert!(err["error"].as_str().unwrap().contains("collector offline"));
}

#[tokio::test]
async fn cases_are_private_to_their_owner() {
  let router = make_router().await;
  let id = create_case(&router, "target").await;

  let (status, _) = send_json(&router, "bob", Method::GET, &format!("/cases/{id}"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, list) = send_json(&router, "bob", Method::GET, "/cases", None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(list.as_array().unwrap().is_empty());

  let (status, list) = send_json(&router, "alice", Method::GET, "/cases", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_case_is_not_found() {
  let router = make_router().await;
  let (status, err) = send_json(
    &router,
    "alice",
    Method::GET,
    &format!("/cases/{}", uuid::Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err["kind"], "not_found");
}
