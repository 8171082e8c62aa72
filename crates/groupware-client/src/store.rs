//! The REST-backed store.

use std::time::Duration;

use chrono::NaiveDate;
use groupware_api::{
  USER_ID_HEADER, USER_ROLE_HEADER,
  wire::{FlagUpdate, ParticipantIds, Removed, StatusUpdate},
};
use groupware_core::{
  attendance::{Attendance, AttendanceQuery},
  event::{
    Event, EventFilter, EventParticipant, EventPatch, NewEvent, ParticipantStatus,
    ParticipantWithProfile,
  },
  filter::MessageFilter,
  message::{FlagPatch, Label, LabelPatch, Message, MessageLabel, NewLabel, NewMessage, UnreadCount},
  profile::{Principal, Profile},
  store::GroupwareStore,
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{Error, Result};

/// A [`GroupwareStore`] that forwards every call to the REST API.
///
/// The store acts as one [`Principal`]: its identity headers go on every
/// request, and calls on behalf of another user fail with
/// [`groupware_core::Error::Forbidden`] before anything is sent. Cheap to
/// clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpStore {
  http:      Client,
  base_url:  String,
  principal: Principal,
}

impl HttpStore {
  /// `base_url` is the server root; requests go to `{base_url}/api/...`.
  pub fn new(base_url: impl Into<String>, principal: Principal) -> Result<Self> {
    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self::with_client(http, base_url, principal))
  }

  pub fn with_client(http: Client, base_url: impl Into<String>, principal: Principal) -> Self {
    Self { http, base_url: base_url.into(), principal }
  }

  pub fn principal(&self) -> Principal { self.principal }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .http
      .request(method, self.url(path))
      .header(USER_ID_HEADER, self.principal.user_id.to_string())
      .header(USER_ROLE_HEADER, self.principal.role.as_ref())
  }

  fn require_self(&self, user_id: Uuid, action: &str) -> Result<()> {
    Ok(self.principal.require_self(user_id, action)?)
  }
}

// ─── Response handling ───────────────────────────────────────────────────────

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
  let resp = req.send().await?;
  let status = resp.status();
  if status.is_success() {
    return Ok(resp.json().await?);
  }
  let body = resp.text().await.unwrap_or_default();
  tracing::debug!(%status, body, "request failed");
  Err(Error::from_response(status, &body))
}

/// Like [`send`], with the API's plain 404 resolved to `None`.
async fn send_optional<T: DeserializeOwned>(req: RequestBuilder) -> Result<Option<T>> {
  match send(req).await {
    Ok(value) => Ok(Some(value)),
    Err(Error::Api { status: StatusCode::NOT_FOUND, .. }) => Ok(None),
    Err(err) => Err(err),
  }
}

async fn send_removed(req: RequestBuilder) -> Result<bool> {
  let Removed { removed } = send(req).await?;
  Ok(removed)
}

// ─── GroupwareStore impl ─────────────────────────────────────────────────────

impl GroupwareStore for HttpStore {
  type Error = Error;

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn list_messages<'a>(
    &'a self,
    owner: Uuid,
    filter: &'a MessageFilter,
  ) -> Result<Vec<Message>> {
    self.require_self(owner, "list another user's messages")?;
    send(self.request(Method::GET, "/messages").query(filter)).await
  }

  async fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
    send_optional(self.request(Method::GET, &format!("/messages/{id}"))).await
  }

  async fn create_message(&self, owner: Uuid, input: NewMessage) -> Result<Message> {
    self.require_self(owner, "send as another user")?;
    send(self.request(Method::POST, "/messages").json(&input)).await
  }

  async fn update_flags<'a>(&'a self, ids: &'a [Uuid], patch: FlagPatch) -> Result<Vec<Message>> {
    let body = FlagUpdate { ids: ids.to_vec(), patch };
    send(self.request(Method::PATCH, "/messages/flags").json(&body)).await
  }

  async fn delete_message(&self, id: Uuid) -> Result<bool> {
    send_removed(self.request(Method::DELETE, &format!("/messages/{id}/permanent"))).await
  }

  async fn unread_count(&self, owner: Uuid) -> Result<UnreadCount> {
    self.require_self(owner, "count another user's mail")?;
    send(self.request(Method::GET, "/messages/unread-count")).await
  }

  // ── Labels ────────────────────────────────────────────────────────────────

  async fn list_labels(&self, owner: Uuid) -> Result<Vec<Label>> {
    self.require_self(owner, "list another user's labels")?;
    send(self.request(Method::GET, "/labels")).await
  }

  async fn create_label(&self, owner: Uuid, input: NewLabel) -> Result<Label> {
    self.require_self(owner, "create a label for another user")?;
    send(self.request(Method::POST, "/labels").json(&input)).await
  }

  async fn update_label(&self, id: Uuid, patch: LabelPatch) -> Result<Label> {
    send(self.request(Method::PATCH, &format!("/labels/{id}")).json(&patch)).await
  }

  async fn delete_label(&self, id: Uuid) -> Result<bool> {
    send_removed(self.request(Method::DELETE, &format!("/labels/{id}"))).await
  }

  async fn assign_label(&self, message_id: Uuid, label_id: Uuid) -> Result<MessageLabel> {
    let path = format!("/messages/{message_id}/labels/{label_id}");
    send(self.request(Method::PUT, &path)).await
  }

  async fn unassign_label(&self, message_id: Uuid, label_id: Uuid) -> Result<bool> {
    let path = format!("/messages/{message_id}/labels/{label_id}");
    send_removed(self.request(Method::DELETE, &path)).await
  }

  async fn message_labels(&self, message_id: Uuid) -> Result<Vec<Label>> {
    send(self.request(Method::GET, &format!("/messages/{message_id}/labels"))).await
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn get_attendance(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<Attendance>> {
    send_optional(self.request(Method::GET, &format!("/attendance/{user_id}/{date}"))).await
  }

  async fn list_attendance<'a>(&'a self, query: &'a AttendanceQuery) -> Result<Vec<Attendance>> {
    send(self.request(Method::GET, "/attendance").query(query)).await
  }

  async fn clock_in(&self, user_id: Uuid) -> Result<Attendance> {
    self.require_self(user_id, "clock in another user")?;
    send(self.request(Method::POST, "/attendance/clock-in")).await
  }

  async fn clock_out(&self, user_id: Uuid) -> Result<Attendance> {
    self.require_self(user_id, "clock out another user")?;
    send(self.request(Method::POST, "/attendance/clock-out")).await
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn list_events<'a>(&'a self, filter: &'a EventFilter) -> Result<Vec<Event>> {
    send(self.request(Method::GET, "/events").query(filter)).await
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    send_optional(self.request(Method::GET, &format!("/events/{id}"))).await
  }

  async fn create_event(&self, owner: Uuid, input: NewEvent) -> Result<Event> {
    self.require_self(owner, "create an event for another user")?;
    send(self.request(Method::POST, "/events").json(&input)).await
  }

  async fn update_event(&self, id: Uuid, patch: EventPatch) -> Result<Event> {
    send(self.request(Method::PATCH, &format!("/events/{id}")).json(&patch)).await
  }

  async fn delete_event(&self, id: Uuid) -> Result<bool> {
    send_removed(self.request(Method::DELETE, &format!("/events/{id}"))).await
  }

  // ── Participants ──────────────────────────────────────────────────────────

  async fn list_participants(&self, event_id: Uuid) -> Result<Vec<ParticipantWithProfile>> {
    send(self.request(Method::GET, &format!("/events/{event_id}/participants"))).await
  }

  async fn add_participants<'a>(
    &'a self,
    event_id: Uuid,
    user_ids: &'a [Uuid],
  ) -> Result<Vec<EventParticipant>> {
    let body = ParticipantIds { user_ids: user_ids.to_vec() };
    let path = format!("/events/{event_id}/participants");
    send(self.request(Method::POST, &path).json(&body)).await
  }

  async fn remove_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
    let path = format!("/events/{event_id}/participants/{user_id}");
    send_removed(self.request(Method::DELETE, &path)).await
  }

  async fn set_participant_status(
    &self,
    event_id: Uuid,
    user_id: Uuid,
    status: ParticipantStatus,
  ) -> Result<Option<EventParticipant>> {
    self.require_self(user_id, "respond for another user")?;
    let path = format!("/events/{event_id}/participants/{user_id}");
    send_optional(self.request(Method::PATCH, &path).json(&StatusUpdate { status })).await
  }

  async fn get_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<EventParticipant>> {
    let path = format!("/events/{event_id}/participants/{user_id}");
    send_optional(self.request(Method::GET, &path)).await
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    send(self.request(Method::GET, "/profiles")).await
  }

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    send_optional(self.request(Method::GET, &format!("/profiles/{user_id}"))).await
  }
}
