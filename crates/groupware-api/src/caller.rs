//! The authenticated caller, as asserted by the upstream identity proxy.
//!
//! The proxy sets `x-user-id` (required) and `x-user-role` (optional,
//! defaults to `member`). This service trusts both headers.

use std::str::FromStr as _;

use axum::{extract::FromRequestParts, http::request::Parts};
use groupware_core::profile::{Principal, Role};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Extracts the [`Principal`] a request runs as.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let user_id = header(parts, USER_ID_HEADER)?
      .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER}")))?;
    let user_id = Uuid::parse_str(user_id)
      .map_err(|_| ApiError::Unauthorized(format!("malformed {USER_ID_HEADER}")))?;
    let role = match header(parts, USER_ROLE_HEADER)? {
      Some(role) => Role::from_str(role)
        .map_err(|_| ApiError::BadRequest(format!("unknown role {role:?}")))?,
      None => Role::default(),
    };

    Ok(Self(Principal::new(user_id, role)))
  }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
  parts
    .headers
    .get(name)
    .map(|v| v.to_str().map_err(|_| ApiError::BadRequest(format!("{name} is not ASCII"))))
    .transpose()
}
