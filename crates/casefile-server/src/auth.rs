//! HTTP Basic authentication against configured investigator accounts.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use casefile_api::ApiError;
use casefile_core::case::Investigator;
use serde::Deserialize;

/// One investigator login.
#[derive(Clone, Deserialize)]
pub struct Account {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl std::fmt::Debug for Account {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Account")
      .field("username", &self.username)
      .finish_non_exhaustive()
  }
}

/// Verify Basic credentials from `headers` against `accounts`.
pub fn verify_auth(headers: &HeaderMap, accounts: &[Account]) -> Result<Investigator, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let account = accounts
    .iter()
    .find(|a| a.username == username)
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(Investigator::new(username))
}

/// Middleware: authenticate the request and attach the [`Investigator`]
/// for the API handlers.
pub async fn require_investigator(
  State(accounts): State<Arc<Vec<Account>>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let investigator = verify_auth(req.headers(), &accounts).inspect_err(|_| {
    tracing::debug!(uri = %req.uri(), "authentication failed");
  })?;
  req.extensions_mut().insert(investigator);
  Ok(next.run(req).await)
}
