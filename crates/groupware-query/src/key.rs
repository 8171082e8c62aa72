//! Hierarchical cache keys.
//!
//! A key is a path of string segments. The first segment names the query
//! family (`messages`, `attendance`, ...); later segments narrow it down.
//! Structured parameters are embedded as canonical JSON, so two equal filters
//! always produce the same key.

use std::fmt;

use serde::Serialize;

/// Query family names, shared by the readers that build keys and the
/// mutations that invalidate them.
pub mod family {
  pub const MESSAGES: &str = "messages";
  pub const MESSAGE: &str = "message";
  pub const MESSAGE_LABELS: &str = "messageLabels";
  pub const LABELS: &str = "labels";
  pub const UNREAD_COUNT: &str = "unreadCount";
  pub const ATTENDANCE: &str = "attendance";
  pub const EVENTS: &str = "events";
  pub const EVENT: &str = "event";
  pub const PARTICIPANTS: &str = "eventParticipants";
  pub const PROFILES: &str = "profiles";
  pub const PROFILE: &str = "profile";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
  pub fn new(family: &str) -> Self { Self(vec![family.to_owned()]) }

  /// Append a segment.
  pub fn with(mut self, segment: impl ToString) -> Self {
    self.0.push(segment.to_string());
    self
  }

  /// Append `value` as a compact JSON segment.
  pub fn with_json<T: Serialize>(self, value: &T) -> Self {
    // Plain data structs always serialise.
    let json = serde_json::to_string(value).unwrap_or_default();
    self.with(json)
  }

  pub fn segments(&self) -> &[String] { &self.0 }

  pub fn family(&self) -> &str { self.0.first().map_or("", String::as_str) }

  /// Whether `prefix` names this key or one of its ancestors.
  pub fn starts_with(&self, prefix: &QueryKey) -> bool { self.0.starts_with(&prefix.0) }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}]", self.0.join(", "))
  }
}
