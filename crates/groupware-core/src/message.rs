//! Messages, labels and their join records.
//!
//! A message arrives from one of two external services. Its classification
//! (received, sent, draft) is exclusive; the `is_trash` and `is_spam` flags
//! are independent overlays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Enums ───────────────────────────────────────────────────────────────────

/// The external system a message originated from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Service {
  Gmail,
  Slack,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageType {
  Received,
  Sent,
  Draft,
}

/// How the owner was addressed on a received message.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecipientType {
  To,
  Cc,
  Bcc,
  Mention,
}

// ─── Message ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub id:   Uuid,
  pub name: String,
  /// Size in bytes.
  pub size: u64,
  /// MIME type.
  #[serde(rename = "type")]
  pub kind: String,
  pub url:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub id:             Uuid,
  pub user_id:        Uuid,
  pub service:        Service,
  pub message_type:   MessageType,
  pub recipient_type: Option<RecipientType>,
  pub external_id:    Option<String>,
  pub thread_id:      Option<String>,
  pub subject:        Option<String>,
  pub body:           Option<String>,
  pub from_address:   Option<String>,
  #[serde(default)]
  pub to_addresses:   Vec<String>,
  #[serde(default)]
  pub cc_addresses:   Vec<String>,
  #[serde(default)]
  pub bcc_addresses:  Vec<String>,
  pub is_read:        bool,
  pub is_starred:     bool,
  pub is_spam:        bool,
  pub is_trash:       bool,
  #[serde(default)]
  pub attachments:    Vec<Attachment>,
  pub received_at:    Option<DateTime<Utc>>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
  pub deleted_at:     Option<DateTime<Utc>>,
}

impl Message {
  /// The timestamp lists are ordered by: `received_at`, else `created_at`.
  pub fn effective_at(&self) -> DateTime<Utc> {
    self.received_at.unwrap_or(self.created_at)
  }

  /// Counted by [`UnreadCount`]: received, unread, and in neither trash nor
  /// spam.
  pub fn is_unread_inbox(&self) -> bool {
    self.message_type == MessageType::Received
      && !self.is_read
      && !self.is_trash
      && !self.is_spam
  }

  /// Apply a flag patch in place. Returns `true` if any flag changed.
  pub fn apply_flags(&mut self, patch: &FlagPatch) -> bool {
    let before = (self.is_read, self.is_starred, self.is_spam, self.is_trash);
    if let Some(v) = patch.is_read {
      self.is_read = v;
    }
    if let Some(v) = patch.is_starred {
      self.is_starred = v;
    }
    if let Some(v) = patch.is_spam {
      self.is_spam = v;
    }
    if let Some(v) = patch.is_trash {
      self.is_trash = v;
    }
    before != (self.is_read, self.is_starred, self.is_spam, self.is_trash)
  }
}

/// A partial update of a message's boolean flags. `None` leaves a flag alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagPatch {
  pub is_read:    Option<bool>,
  pub is_starred: Option<bool>,
  pub is_spam:    Option<bool>,
  pub is_trash:   Option<bool>,
}

impl FlagPatch {
  pub fn read(value: bool) -> Self { Self { is_read: Some(value), ..Self::default() } }

  pub fn starred(value: bool) -> Self { Self { is_starred: Some(value), ..Self::default() } }

  pub fn trash(value: bool) -> Self { Self { is_trash: Some(value), ..Self::default() } }

  pub fn spam(value: bool) -> Self { Self { is_spam: Some(value), ..Self::default() } }
}

/// Input to [`crate::store::GroupwareStore::create_message`]. Composing a
/// message produces either a sent message or a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
  pub service:       Service,
  pub draft:         bool,
  pub subject:       Option<String>,
  pub body:          Option<String>,
  pub from_address:  Option<String>,
  #[serde(default)]
  pub to_addresses:  Vec<String>,
  #[serde(default)]
  pub cc_addresses:  Vec<String>,
  #[serde(default)]
  pub bcc_addresses: Vec<String>,
  pub thread_id:     Option<String>,
}

impl NewMessage {
  /// A sent message must have at least one recipient; drafts need nothing.
  pub fn validate(&self) -> Result<()> {
    if !self.draft
      && self.to_addresses.is_empty()
      && self.cc_addresses.is_empty()
      && self.bcc_addresses.is_empty()
    {
      return Err(Error::Validation("a sent message needs a recipient".into()));
    }
    Ok(())
  }
}

/// Unread received messages, by service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
  pub total: usize,
  pub gmail: usize,
  pub slack: usize,
}

impl UnreadCount {
  pub fn tally<'a>(messages: impl IntoIterator<Item = &'a Message>) -> Self {
    messages
      .into_iter()
      .filter(|m| m.is_unread_inbox())
      .fold(Self::default(), |mut acc, m| {
        acc.total += 1;
        match m.service {
          Service::Gmail => acc.gmail += 1,
          Service::Slack => acc.slack += 1,
        }
        acc
      })
  }
}

// ─── Labels ──────────────────────────────────────────────────────────────────

/// A user-scoped tag attached to messages through [`MessageLabel`] links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
  pub id:         Uuid,
  pub user_id:    Uuid,
  pub name:       String,
  /// `#RRGGBB`.
  pub color:      String,
  pub sort_order: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Join record between a message and a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLabel {
  pub id:         Uuid,
  pub message_id: Uuid,
  pub label_id:   Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabel {
  pub name:  String,
  pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelPatch {
  pub name:       Option<String>,
  pub color:      Option<String>,
  pub sort_order: Option<i32>,
}

const LABEL_NAME_MAX: usize = 50;

/// Label names are 1 to 50 characters.
pub fn validate_label_name(name: &str) -> Result<()> {
  let len = name.trim().chars().count();
  if len == 0 {
    return Err(Error::Validation("label name is empty".into()));
  }
  if len > LABEL_NAME_MAX {
    return Err(Error::Validation(format!(
      "label name exceeds {LABEL_NAME_MAX} characters"
    )));
  }
  Ok(())
}

/// Colors are `#` followed by six hex digits.
pub fn validate_color(color: &str) -> Result<()> {
  let ok = color.len() == 7
    && color.starts_with('#')
    && color[1..].chars().all(|c| c.is_ascii_hexdigit());
  if ok {
    Ok(())
  } else {
    Err(Error::Validation(format!("invalid color {color:?}")))
  }
}

impl NewLabel {
  pub fn validate(&self) -> Result<()> {
    validate_label_name(&self.name)?;
    validate_color(&self.color)
  }
}

impl LabelPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      validate_label_name(name)?;
    }
    if let Some(color) = &self.color {
      validate_color(color)?;
    }
    Ok(())
  }
}
