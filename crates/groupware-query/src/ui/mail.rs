//! The mail screen: filters, selection, the visible list and panel flags.

use std::sync::Arc;

use groupware_core::{
  filter::{MessageFilter, RecipientFilter, ServiceFilter, View},
  message::{FlagPatch, Label, Message},
};
use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailState {
  pub service_filter:    ServiceFilter,
  pub active_view:       View,
  pub recipient_filter:  RecipientFilter,
  pub search_query:      String,
  pub selected_label_id: Option<Uuid>,
  /// Multi-select, in the order ids were selected.
  pub selected_ids:      Vec<Uuid>,
  pub active_message_id: Option<Uuid>,
  pub messages:          Vec<Message>,
  pub labels:            Vec<Label>,
  pub is_compose_open:   bool,
  pub is_detail_open:    bool,
}

impl MailState {
  /// The list query for the current filters. Filters left at "all" or empty
  /// are omitted so equivalent states share a cache entry.
  pub fn filter(&self) -> MessageFilter {
    MessageFilter {
      service:   (self.service_filter != ServiceFilter::All).then_some(self.service_filter),
      view:      Some(self.active_view),
      recipient: (self.recipient_filter != RecipientFilter::All).then_some(self.recipient_filter),
      search:    (!self.search_query.is_empty()).then(|| self.search_query.clone()),
      label_id:  self.selected_label_id,
    }
  }

  pub fn is_selected(&self, id: Uuid) -> bool { self.selected_ids.contains(&id) }
}

/// Observable [`MailState`]. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MailStore {
  state: Arc<watch::Sender<MailState>>,
}

impl Default for MailStore {
  fn default() -> Self { Self::new() }
}

impl MailStore {
  pub fn new() -> Self {
    let (state, _) = watch::channel(MailState::default());
    Self { state: Arc::new(state) }
  }

  pub fn snapshot(&self) -> MailState { self.state.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<MailState> { self.state.subscribe() }

  pub fn filter(&self) -> MessageFilter { self.state.borrow().filter() }

  fn update(&self, f: impl FnOnce(&mut MailState)) { self.state.send_modify(f); }

  // ── Filters ──────────────────────────────────────────────────────────────

  pub fn set_service_filter(&self, filter: ServiceFilter) {
    self.update(|s| s.service_filter = filter);
  }

  /// Switching views drops the selection and closes the active message.
  pub fn set_active_view(&self, view: View) {
    self.update(|s| {
      s.active_view = view;
      s.selected_ids.clear();
      s.active_message_id = None;
    });
  }

  pub fn set_recipient_filter(&self, filter: RecipientFilter) {
    self.update(|s| s.recipient_filter = filter);
  }

  pub fn set_search_query(&self, query: impl Into<String>) {
    let query = query.into();
    self.update(|s| s.search_query = query);
  }

  pub fn set_selected_label(&self, label_id: Option<Uuid>) {
    self.update(|s| s.selected_label_id = label_id);
  }

  // ── Selection ────────────────────────────────────────────────────────────

  pub fn set_selected_ids(&self, ids: Vec<Uuid>) { self.update(|s| s.selected_ids = ids); }

  pub fn toggle_selection(&self, id: Uuid) {
    self.update(|s| match s.selected_ids.iter().position(|&selected| selected == id) {
      Some(at) => {
        s.selected_ids.remove(at);
      }
      None => s.selected_ids.push(id),
    });
  }

  /// Select every message currently in the visible list.
  pub fn select_all(&self) {
    self.update(|s| s.selected_ids = s.messages.iter().map(|m| m.id).collect());
  }

  pub fn clear_selection(&self) { self.update(|s| s.selected_ids.clear()); }

  /// The detail pane is open exactly when a message is active.
  pub fn set_active_message(&self, id: Option<Uuid>) {
    self.update(|s| {
      s.active_message_id = id;
      s.is_detail_open = id.is_some();
    });
  }

  // ── Data ─────────────────────────────────────────────────────────────────

  pub fn set_messages(&self, messages: Vec<Message>) { self.update(|s| s.messages = messages); }

  pub fn set_labels(&self, labels: Vec<Label>) { self.update(|s| s.labels = labels); }

  pub fn update_message(&self, id: Uuid, patch: FlagPatch) { self.update_messages(&[id], patch); }

  /// Patch the locally held copies; the backend is not touched.
  pub fn update_messages(&self, ids: &[Uuid], patch: FlagPatch) {
    self.update(|s| {
      for message in s.messages.iter_mut().filter(|m| ids.contains(&m.id)) {
        message.apply_flags(&patch);
      }
    });
  }

  // ── Panels ───────────────────────────────────────────────────────────────

  pub fn set_compose_open(&self, open: bool) { self.update(|s| s.is_compose_open = open); }

  pub fn set_detail_open(&self, open: bool) { self.update(|s| s.is_detail_open = open); }

  pub fn reset(&self) { self.state.send_replace(MailState::default()); }
}
