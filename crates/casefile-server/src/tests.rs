//! End-to-end tests for the authenticated router.

use std::{sync::Arc, time::Duration};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use casefile_core::report::KdfParams;
use casefile_lifecycle::{CaseController, ControllerConfig};
use casefile_store_sqlite::SqliteStore;
use rand_core::OsRng;
use reqwest::Client;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{
  ServerConfig,
  auth::Account,
  remote::{HttpAnalysisService, HttpCollector},
  router,
};

fn account(username: &str, password: &str) -> Account {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .unwrap()
    .to_string();
  Account { username: username.to_owned(), password_hash: hash }
}

fn basic(user: &str, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn make_router() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let client = Client::new();
  let config = ControllerConfig {
    collect_timeout: Duration::from_secs(5),
    kdf: KdfParams { memory_kib: 256, iterations: 1, parallelism: 1 },
    ..Default::default()
  };
  // Collaborators point at a closed port; these tests never reach them.
  let controller = CaseController::new(
    store,
    HttpCollector::new(client.clone(), "http://127.0.0.1:9/collect"),
    HttpAnalysisService::new(client, "http://127.0.0.1:9/analyze"),
    config,
  );
  router(
    Arc::new(controller),
    Arc::new(vec![account("alice", "secret"), account("bob", "hunter2")]),
  )
}

async fn send(
  router: &Router,
  auth: Option<String>,
  method: Method,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(auth) = auth {
    builder = builder.header(header::AUTHORIZATION, auth);
  }
  if body.is_some() {
    builder = builder.header(header::CONTENT_TYPE, "application/json");
  }
  let req = builder
    .body(body.map_or_else(Body::empty, |v| Body::from(v.to_string())))
    .unwrap();

  let resp = router.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let challenge = resp
    .headers()
    .get(header::WWW_AUTHENTICATE)
    .map(|v| v.to_str().unwrap().to_owned());
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, challenge, json)
}

#[tokio::test]
async fn missing_credentials_are_challenged() {
  let router = make_router().await;
  let (status, challenge, body) = send(&router, None, Method::GET, "/cases", None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(challenge.as_deref(), Some("Basic realm=\"casefile\""));
  assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
  let router = make_router().await;
  let (status, _, _) =
    send(&router, Some(basic("alice", "nope")), Method::GET, "/cases", None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticated_user_owns_created_case() {
  let router = make_router().await;
  let (status, _, case) = send(
    &router,
    Some(basic("alice", "secret")),
    Method::POST,
    "/cases",
    Some(json!({ "target_username": "suspect", "platform": "instagram" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(case["owner"], "alice");
  let id = case["case_id"].as_str().unwrap().to_owned();

  let (status, _, _) =
    send(&router, Some(basic("bob", "hunter2")), Method::GET, &format!("/cases/{id}"), None)
      .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unreachable_collector_is_bad_gateway() {
  let router = make_router().await;
  let (_, _, case) = send(
    &router,
    Some(basic("alice", "secret")),
    Method::POST,
    "/cases",
    Some(json!({ "target_username": "suspect", "platform": "twitter" })),
  )
  .await;
  let id = case["case_id"].as_str().unwrap().to_owned();

  let (status, _, err) = send(
    &router,
    Some(basic("alice", "secret")),
    Method::POST,
    &format!("/cases/{id}/collect"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(err["kind"], "collection");
}

const MINIMAL_CONFIG: &str = r#"
  store_path    = "~/casefile.db"
  collector_url = "http://collector/collect"
  analysis_url  = "http://analysis/analyze"

  [[investigators]]
  username      = "alice"
  password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
"#;

fn parse_config(extra: &str) -> ServerConfig {
  config::Config::builder()
    .add_source(config::File::from_str(
      &format!("{MINIMAL_CONFIG}\n{extra}"),
      config::FileFormat::Toml,
    ))
    .build()
    .unwrap()
    .try_deserialize()
    .unwrap()
}

#[test]
fn config_defaults_fill_optional_fields() {
  let cfg = parse_config("");

  assert_eq!(cfg.host, "127.0.0.1");
  assert_eq!(cfg.port, 8080);
  assert_eq!(cfg.investigators.len(), 1);

  let controller = cfg.controller_config().unwrap();
  assert_eq!(controller.collect_timeout, Duration::from_secs(60));
  assert_eq!(controller.analyze_timeout, Duration::from_secs(120));
  assert_eq!(controller.kdf, KdfParams::default());
}

#[test]
fn invalid_risk_weights_are_rejected() {
  let cfg = parse_config("");
  let mut bad = cfg.clone();
  bad.risk_weights.fraud_weight = -0.3;
  assert!(matches!(
    bad.controller_config(),
    Err(casefile_core::Error::InvalidWeight { field: "fraud_weight", .. })
  ));

  let mut nan = cfg;
  nan.risk_weights.cyberbullying_cap = f64::NAN;
  assert!(nan.controller_config().is_err());
}

#[test]
fn inverted_thresholds_from_file_are_rejected() {
  let cfg = parse_config("[risk_weights]\nmedium_threshold = 60.0");
  assert!(matches!(cfg.controller_config(), Err(casefile_core::Error::ThresholdOrder)));
}
