//! Profiles and the authenticated principal.
//!
//! Identity itself is owned by an external provider. This crate only sees the
//! resolved user id and role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Access level of a user within the team.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  Member,
  Manager,
  Admin,
}

impl Role {
  /// Managers and admins may read team-wide views.
  pub fn can_view_team(self) -> bool { matches!(self, Self::Manager | Self::Admin) }
}

/// A user's display identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:         Uuid,
  pub user_id:    Uuid,
  pub name:       String,
  pub avatar_url: Option<String>,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The caller on whose behalf a query or mutation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Principal {
  pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

  /// Fail with [`Error::Forbidden`] unless the principal may read team views.
  pub fn require_team_access(&self, action: &str) -> Result<()> {
    if self.role.can_view_team() { Ok(()) } else { Err(self.forbidden(action)) }
  }

  /// Fail with [`Error::Forbidden`] unless `user_id` is the principal itself.
  /// Roles do not widen this.
  pub fn require_self(&self, user_id: Uuid, action: &str) -> Result<()> {
    if user_id == self.user_id { Ok(()) } else { Err(self.forbidden(action)) }
  }

  pub fn forbidden(&self, action: &str) -> Error {
    Error::Forbidden { role: self.role.to_string(), action: action.to_owned() }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn role_string_forms() {
    assert_eq!(Role::Manager.to_string(), "manager");
    assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
    assert!(Role::from_str("owner").is_err());
  }

  #[test]
  fn members_cannot_view_team() {
    let member = Principal::new(Uuid::new_v4(), Role::Member);
    let err = member.require_team_access("read team attendance").unwrap_err();
    assert_eq!(err.code(), "forbidden");

    let manager = Principal::new(Uuid::new_v4(), Role::Manager);
    assert!(manager.require_team_access("read team attendance").is_ok());
  }

  #[test]
  fn acting_for_others_is_forbidden_even_for_admins() {
    let admin = Principal::new(Uuid::new_v4(), Role::Admin);
    assert!(admin.require_self(admin.user_id, "respond").is_ok());
    let err = admin.require_self(Uuid::new_v4(), "respond").unwrap_err();
    assert_eq!(err, Error::Forbidden { role: "admin".into(), action: "respond".into() });
  }
}
