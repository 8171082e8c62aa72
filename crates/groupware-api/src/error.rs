//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": message, "code": code}`. Domain errors also
//! carry a `detail` object, so a client can rebuild the exact
//! [`groupware_core::Error`].

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use groupware_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Domain(groupware_core::Error),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.domain() {
      Some(domain) => Self::Domain(domain.clone()),
      None => Self::Store(Box::new(err)),
    }
  }

  pub fn status(&self) -> StatusCode {
    use groupware_core::Error as E;
    match self {
      Self::Domain(e) => match e {
        E::NotClockedIn { .. } | E::AlreadyClockedOut { .. } | E::AlreadyClockedIn { .. } => {
          StatusCode::CONFLICT
        }
        E::InvalidTimeRange | E::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        E::Forbidden { .. } => StatusCode::FORBIDDEN,
        E::MessageNotFound(_) | E::LabelNotFound(_) | E::EventNotFound(_) => StatusCode::NOT_FOUND,
        E::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      },
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::Domain(e) => e.code(),
      Self::NotFound(_) => "not_found",
      Self::BadRequest(_) => "bad_request",
      Self::Unauthorized(_) => "unauthorized",
      Self::Store(_) => "internal",
    }
  }
}

impl From<groupware_core::Error> for ApiError {
  fn from(err: groupware_core::Error) -> Self { Self::Domain(err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::warn!(%status, error = %self, "request failed");
    }
    let mut body = match &self {
      ApiError::Domain(e) => serde_json::to_value(e).unwrap_or_else(|_| json!({})),
      _ => json!({ "code": self.code() }),
    };
    body["error"] = json!(self.to_string());
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn domain_errors_map_to_statuses() {
    let cases = [
      (groupware_core::Error::InvalidTimeRange, StatusCode::UNPROCESSABLE_ENTITY),
      (groupware_core::Error::EventNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (groupware_core::Error::Unavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
      (
        groupware_core::Error::Forbidden { role: "member".into(), action: "x".into() },
        StatusCode::FORBIDDEN,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }
}
