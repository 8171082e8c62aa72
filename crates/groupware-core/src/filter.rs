//! Message filtering and ordering.
//!
//! Every [`crate::store::GroupwareStore`] backend must reproduce these
//! semantics exactly; the in-memory store calls them directly.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::message::{Message, MessageLabel, MessageType, RecipientType, Service};

/// Search strings shorter than this (in characters) do not filter.
pub const MIN_SEARCH_LEN: usize = 2;

// ─── Filter enums ────────────────────────────────────────────────────────────

/// A named message bucket. Each view has its own visibility rule.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum View {
  #[default]
  Inbox,
  Sent,
  Draft,
  Starred,
  Spam,
  Trash,
}

impl View {
  pub fn admits(self, m: &Message) -> bool {
    match self {
      Self::Inbox => m.message_type == MessageType::Received && !m.is_trash && !m.is_spam,
      Self::Sent => m.message_type == MessageType::Sent && !m.is_trash,
      Self::Draft => m.message_type == MessageType::Draft,
      Self::Starred => m.is_starred && !m.is_trash,
      Self::Spam => m.is_spam,
      Self::Trash => m.is_trash,
    }
  }
}

/// Which service's messages to show; `All` disables the filter.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceFilter {
  #[default]
  All,
  Gmail,
  Slack,
}

impl ServiceFilter {
  pub fn admits(self, service: Service) -> bool {
    match self {
      Self::All => true,
      Self::Gmail => service == Service::Gmail,
      Self::Slack => service == Service::Slack,
    }
  }
}

/// How the owner was addressed; `All` disables the filter.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecipientFilter {
  #[default]
  All,
  To,
  Cc,
  Bcc,
  Mention,
}

impl RecipientFilter {
  pub fn admits(self, recipient: Option<RecipientType>) -> bool {
    let wanted = match self {
      Self::All => return true,
      Self::To => RecipientType::To,
      Self::Cc => RecipientType::Cc,
      Self::Bcc => RecipientType::Bcc,
      Self::Mention => RecipientType::Mention,
    };
    recipient == Some(wanted)
  }
}

// ─── MessageFilter ───────────────────────────────────────────────────────────

/// Parameters for [`crate::store::GroupwareStore::list_messages`]. Every set
/// field is a predicate; a message must satisfy all of them.
///
/// Kept flat so it round-trips through a URL query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageFilter {
  pub service:   Option<ServiceFilter>,
  pub view:      Option<View>,
  pub recipient: Option<RecipientFilter>,
  /// Case-insensitive substring over subject, body and sender. Ignored when
  /// shorter than [`MIN_SEARCH_LEN`].
  pub search:    Option<String>,
  /// Only messages linked to this label.
  pub label_id:  Option<Uuid>,
}

impl MessageFilter {
  pub fn view(view: View) -> Self { Self { view: Some(view), ..Self::default() } }

  /// The search needle, lowercased, if it is long enough to apply.
  fn needle(&self) -> Option<String> {
    self
      .search
      .as_deref()
      .filter(|s| s.chars().count() >= MIN_SEARCH_LEN)
      .map(str::to_lowercase)
  }

  /// `links` are the message/label join records visible to the caller; they
  /// are consulted only when `label_id` is set.
  pub fn matches(&self, message: &Message, links: &[MessageLabel]) -> bool {
    if self.service.is_some_and(|s| !s.admits(message.service)) {
      return false;
    }
    if self.view.is_some_and(|v| !v.admits(message)) {
      return false;
    }
    if self.recipient.is_some_and(|r| !r.admits(message.recipient_type)) {
      return false;
    }
    if let Some(needle) = self.needle() {
      let hit = |field: &Option<String>| {
        field
          .as_deref()
          .is_some_and(|text| text.to_lowercase().contains(&needle))
      };
      if !hit(&message.subject) && !hit(&message.body) && !hit(&message.from_address) {
        return false;
      }
    }
    if let Some(label_id) = self.label_id
      && !links
        .iter()
        .any(|l| l.label_id == label_id && l.message_id == message.id)
    {
      return false;
    }
    true
  }
}

/// Newest first by [`Message::effective_at`].
pub fn sort_messages(messages: &mut [Message]) {
  messages.sort_by(|a, b| b.effective_at().cmp(&a.effective_at()));
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone as _, Utc};

  use super::*;
  use crate::testing::message;

  fn inbox_message() -> Message { message(Service::Gmail, MessageType::Received) }

  #[test]
  fn inbox_excludes_trash_and_spam() {
    let inbox = MessageFilter::view(View::Inbox);
    let mut m = inbox_message();
    assert!(inbox.matches(&m, &[]));
    m.is_spam = true;
    assert!(!inbox.matches(&m, &[]));
    m.is_spam = false;
    m.is_trash = true;
    assert!(!inbox.matches(&m, &[]));
  }

  #[test]
  fn starred_excludes_trash_but_not_spam() {
    let starred = MessageFilter::view(View::Starred);
    let mut m = inbox_message();
    m.is_starred = true;
    m.is_spam = true;
    assert!(starred.matches(&m, &[]));
    m.is_trash = true;
    assert!(!starred.matches(&m, &[]));
  }

  #[test]
  fn sent_and_draft_views_classify_by_type() {
    let sent = message(Service::Slack, MessageType::Sent);
    let draft = message(Service::Slack, MessageType::Draft);
    assert!(MessageFilter::view(View::Sent).matches(&sent, &[]));
    assert!(!MessageFilter::view(View::Sent).matches(&draft, &[]));
    assert!(MessageFilter::view(View::Draft).matches(&draft, &[]));
    assert!(!MessageFilter::view(View::Inbox).matches(&sent, &[]));
  }

  #[test]
  fn spam_and_trash_views_require_their_flag() {
    let mut m = inbox_message();
    assert!(!MessageFilter::view(View::Spam).matches(&m, &[]));
    assert!(!MessageFilter::view(View::Trash).matches(&m, &[]));
    m.is_spam = true;
    m.is_trash = true;
    assert!(MessageFilter::view(View::Spam).matches(&m, &[]));
    assert!(MessageFilter::view(View::Trash).matches(&m, &[]));
  }

  #[test]
  fn service_all_is_no_filter() {
    let slack = message(Service::Slack, MessageType::Received);
    let all = MessageFilter { service: Some(ServiceFilter::All), ..MessageFilter::default() };
    let gmail = MessageFilter { service: Some(ServiceFilter::Gmail), ..MessageFilter::default() };
    assert!(all.matches(&slack, &[]));
    assert!(!gmail.matches(&slack, &[]));
  }

  #[test]
  fn search_is_case_insensitive_or_over_three_fields() {
    let mut m = inbox_message();
    m.subject = Some("Quarterly Report".into());
    m.body = Some("see attached".into());
    m.from_address = Some("boss@corp.example".into());

    let search = |s: &str| MessageFilter { search: Some(s.into()), ..MessageFilter::default() };
    assert!(search("quarterly").matches(&m, &[]));
    assert!(search("ATTACHED").matches(&m, &[]));
    assert!(search("corp.example").matches(&m, &[]));
    assert!(!search("invoice").matches(&m, &[]));
  }

  #[test]
  fn short_search_is_a_no_op() {
    let mut m = inbox_message();
    m.subject = Some("hello".into());
    for s in ["", "z", "한"] {
      let f = MessageFilter { search: Some(s.into()), ..MessageFilter::default() };
      assert!(f.matches(&m, &[]), "search {s:?} should not filter");
    }
  }

  #[test]
  fn search_skips_missing_fields() {
    let m = inbox_message();
    let f = MessageFilter { search: Some("anything".into()), ..MessageFilter::default() };
    assert!(!f.matches(&m, &[]));
  }

  #[test]
  fn label_filter_uses_links() {
    let m = inbox_message();
    let label_id = Uuid::new_v4();
    let link = MessageLabel {
      id:         Uuid::new_v4(),
      message_id: m.id,
      label_id,
      created_at: m.created_at,
    };
    let f = MessageFilter { label_id: Some(label_id), ..MessageFilter::default() };
    assert!(f.matches(&m, std::slice::from_ref(&link)));
    assert!(!f.matches(&m, &[]));
  }

  #[test]
  fn recipient_filter() {
    let mut m = inbox_message();
    m.recipient_type = Some(RecipientType::Cc);
    let cc = MessageFilter { recipient: Some(RecipientFilter::Cc), ..MessageFilter::default() };
    let to = MessageFilter { recipient: Some(RecipientFilter::To), ..MessageFilter::default() };
    assert!(cc.matches(&m, &[]));
    assert!(!to.matches(&m, &[]));
  }

  #[test]
  fn sort_prefers_received_at_and_falls_back_to_created_at() {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let mut old_received = inbox_message();
    old_received.created_at = base + Duration::days(10);
    old_received.received_at = Some(base);
    let mut draft = message(Service::Gmail, MessageType::Draft);
    draft.created_at = base + Duration::days(5);
    let mut newest = inbox_message();
    newest.received_at = Some(base + Duration::days(7));

    let mut list = vec![old_received.clone(), draft.clone(), newest.clone()];
    sort_messages(&mut list);
    let ids: Vec<_> = list.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![newest.id, draft.id, old_received.id]);
    assert!(list.windows(2).all(|w| w[0].effective_at() >= w[1].effective_at()));
  }
}
