//! Error type for `groupware-client`.

use groupware_core::store::StoreError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A rule violation reported by the server, or detected before sending.
  #[error(transparent)]
  Domain(#[from] groupware_core::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// A non-success response whose body is not a domain error.
  #[error("{status}: {message}")]
  Api { status: StatusCode, message: String },
}

impl Error {
  /// Rebuild an error from a failed response body.
  pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
    if let Ok(domain) = serde_json::from_str::<groupware_core::Error>(body) {
      return Self::Domain(domain);
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
      .ok()
      .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
      .unwrap_or_else(|| body.to_owned());
    Self::Api { status, message }
  }

  pub fn status(&self) -> Option<StatusCode> {
    match self {
      Self::Api { status, .. } => Some(*status),
      Self::Http(e) => e.status(),
      Self::Domain(_) => None,
    }
  }
}

impl StoreError for Error {
  fn domain(&self) -> Option<&groupware_core::Error> {
    match self {
      Self::Domain(e) => Some(e),
      Self::Http(_) | Self::Api { .. } => None,
    }
  }

  fn is_transient(&self) -> bool {
    match self {
      Self::Domain(e) => e.is_transient(),
      Self::Http(e) => !(e.is_decode() || e.is_builder()),
      Self::Api { status, .. } => status.is_server_error(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_bodies_decode_to_domain_errors() {
    let body = r#"{"code":"not_clocked_in","detail":{"user_id":"00000000-0000-4000-8000-000000000001","date":"2025-01-10"},"error":"not clocked in"}"#;
    let err = Error::from_response(StatusCode::CONFLICT, body);
    assert_eq!(err.domain().map(groupware_core::Error::code), Some("not_clocked_in"));
    assert!(!err.is_transient());

    let err = Error::from_response(StatusCode::SERVICE_UNAVAILABLE, r#"{"code":"unavailable","detail":"down"}"#);
    assert!(err.is_transient());
  }

  #[test]
  fn other_bodies_keep_status_and_message() {
    let err = Error::from_response(StatusCode::NOT_FOUND, r#"{"code":"not_found","error":"gone"}"#);
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.to_string(), "404 Not Found: gone");
    assert!(!err.is_transient());

    let err = Error::from_response(StatusCode::BAD_GATEWAY, "upstream");
    assert!(err.is_transient());
    assert!(err.domain().is_none());
  }
}
