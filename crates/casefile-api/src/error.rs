//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use casefile_lifecycle::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing or rejected credentials.
  #[error("unauthorized")]
  Unauthorized,

  #[error(transparent)]
  Lifecycle(#[from] casefile_lifecycle::Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Lifecycle(e) => match e.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Precondition | ErrorKind::Integrity => StatusCode::CONFLICT,
        ErrorKind::Collection | ErrorKind::Analysis => StatusCode::BAD_GATEWAY,
        ErrorKind::Decryption | ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
        ErrorKind::Store | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      ApiError::Unauthorized => "unauthorized",
      ApiError::Lifecycle(e) => e.kind().as_str(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res =
      (status, Json(json!({ "error": self.to_string(), "kind": self.kind() }))).into_response();
    if let ApiError::Unauthorized = self {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"casefile\""),
      );
    }
    res
  }
}
