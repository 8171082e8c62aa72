//! Error types for `groupware-core`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Serialised as `{"code": ..., "detail": ...}`, with `code` equal to
/// [`Error::code`], so the REST API can carry domain errors across the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum Error {
  // ── Domain-rule violations ──────────────────────────────────────────────
  #[error("no attendance record for {user_id} on {date}")]
  NotClockedIn { user_id: Uuid, date: NaiveDate },

  #[error("{user_id} already clocked out on {date}")]
  AlreadyClockedOut { user_id: Uuid, date: NaiveDate },

  #[error("{user_id} already clocked in on {date}")]
  AlreadyClockedIn { user_id: Uuid, date: NaiveDate },

  #[error("event ends before it starts")]
  InvalidTimeRange,

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("role {role} may not {action}")]
  Forbidden { role: String, action: String },

  // ── Not found on write paths ────────────────────────────────────────────
  #[error("message not found: {0}")]
  MessageNotFound(Uuid),

  #[error("label not found: {0}")]
  LabelNotFound(Uuid),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  // ── Transient ───────────────────────────────────────────────────────────
  #[error("backend unavailable: {0}")]
  Unavailable(String),
}

impl Error {
  /// Stable machine-readable code, used on the wire by the REST API.
  pub fn code(&self) -> &'static str {
    match self {
      Self::NotClockedIn { .. } => "not_clocked_in",
      Self::AlreadyClockedOut { .. } => "already_clocked_out",
      Self::AlreadyClockedIn { .. } => "already_clocked_in",
      Self::InvalidTimeRange => "invalid_time_range",
      Self::Validation(_) => "validation",
      Self::Forbidden { .. } => "forbidden",
      Self::MessageNotFound(_) => "message_not_found",
      Self::LabelNotFound(_) => "label_not_found",
      Self::EventNotFound(_) => "event_not_found",
      Self::Unavailable(_) => "unavailable",
    }
  }

  /// Whether a retry could plausibly succeed.
  pub fn is_transient(&self) -> bool { matches!(self, Self::Unavailable(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
