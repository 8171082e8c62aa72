//! The `GroupwareStore` trait.
//!
//! The trait is implemented by record-store backends (`groupware-store-memory`,
//! `groupware-client`). The query layer and the REST API depend on this
//! abstraction, not on any concrete backend.
//!
//! # Write semantics
//!
//! Each call is atomic with respect to other calls on the same store, but
//! there are no multi-call transactions. Two writes to the same record race
//! and the last one to complete wins; callers that need stronger guarantees
//! must serialise their own writes.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  Error,
  attendance::{Attendance, AttendanceQuery},
  event::{
    Event, EventFilter, EventParticipant, EventPatch, NewEvent, ParticipantStatus,
    ParticipantWithProfile,
  },
  filter::MessageFilter,
  message::{FlagPatch, Label, LabelPatch, Message, MessageLabel, NewLabel, NewMessage, UnreadCount},
  profile::Profile,
};

// ─── Error classification ────────────────────────────────────────────────────

/// Backend errors expose the domain error they carry, if any, so that callers
/// can tell rule violations from transport failures.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&Error>;

  /// Transport-level failures are transient; so is [`Error::Unavailable`].
  fn is_transient(&self) -> bool { self.domain().is_none_or(Error::is_transient) }
}

impl StoreError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a groupware record store.
///
/// Read paths resolve unknown ids to `None`. Write paths that need an existing
/// record fail with the matching not-found error.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers and spawned tasks.
pub trait GroupwareStore: Send + Sync {
  type Error: StoreError;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Messages owned by `owner` that satisfy `filter`, newest first.
  fn list_messages<'a>(
    &'a self,
    owner: Uuid,
    filter: &'a MessageFilter,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'a;

  fn get_message(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Message>, Self::Error>> + Send + '_;

  /// Compose a message: a draft, or a sent message with at least one
  /// recipient.
  fn create_message(
    &self,
    owner: Uuid,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Apply `patch` to every message in `ids`. Unknown ids are skipped; the
  /// updated messages are returned.
  fn update_flags<'a>(
    &'a self,
    ids: &'a [Uuid],
    patch: FlagPatch,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'a;

  /// Permanently remove a message and its label links. Returns `false` if it
  /// did not exist.
  fn delete_message(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn unread_count(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<UnreadCount, Self::Error>> + Send + '_;

  // ── Labels ────────────────────────────────────────────────────────────

  /// Labels owned by `owner`, by ascending `sort_order`.
  fn list_labels(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Label>, Self::Error>> + Send + '_;

  fn create_label(
    &self,
    owner: Uuid,
    input: NewLabel,
  ) -> impl Future<Output = Result<Label, Self::Error>> + Send + '_;

  fn update_label(
    &self,
    id: Uuid,
    patch: LabelPatch,
  ) -> impl Future<Output = Result<Label, Self::Error>> + Send + '_;

  /// Remove a label and every link to it. Returns `false` if it did not
  /// exist.
  fn delete_label(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Link a message to a label. Idempotent: an existing link is returned
  /// unchanged.
  fn assign_label(
    &self,
    message_id: Uuid,
    label_id: Uuid,
  ) -> impl Future<Output = Result<MessageLabel, Self::Error>> + Send + '_;

  /// Returns `false` if no such link existed.
  fn unassign_label(
    &self,
    message_id: Uuid,
    label_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn message_labels(
    &self,
    message_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Label>, Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  fn get_attendance(
    &self,
    user_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<Attendance>, Self::Error>> + Send + '_;

  /// Records matching `query`, ascending by work date.
  fn list_attendance<'a>(
    &'a self,
    query: &'a AttendanceQuery,
  ) -> impl Future<Output = Result<Vec<Attendance>, Self::Error>> + Send + 'a;

  /// Open today's record for `user_id`. Fails with
  /// [`Error::AlreadyClockedIn`] if one exists.
  fn clock_in(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Attendance, Self::Error>> + Send + '_;

  /// Close today's record for `user_id`. Fails with [`Error::NotClockedIn`]
  /// or [`Error::AlreadyClockedOut`], leaving the store unchanged.
  fn clock_out(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Attendance, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  /// Non-deleted events matching `filter`, ascending by start.
  fn list_events<'a>(
    &'a self,
    filter: &'a EventFilter,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;

  /// Soft-deleted events resolve to `None`.
  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn create_event(
    &self,
    owner: Uuid,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn update_event(
    &self,
    id: Uuid,
    patch: EventPatch,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Soft delete. Returns `false` if the event did not exist or was already
  /// deleted.
  fn delete_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Participants ──────────────────────────────────────────────────────

  fn list_participants(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ParticipantWithProfile>, Self::Error>> + Send + '_;

  /// Add `user_ids` as pending participants. Users already on the event are
  /// skipped; only the newly added participants are returned.
  fn add_participants<'a>(
    &'a self,
    event_id: Uuid,
    user_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<EventParticipant>, Self::Error>> + Send + 'a;

  fn remove_participant(
    &self,
    event_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `None` if `user_id` is not a participant of `event_id`.
  fn set_participant_status(
    &self,
    event_id: Uuid,
    user_id: Uuid,
    status: ParticipantStatus,
  ) -> impl Future<Output = Result<Option<EventParticipant>, Self::Error>> + Send + '_;

  fn get_participant(
    &self,
    event_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<EventParticipant>, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn list_profiles(&self) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;
}

// ─── Ownership ───────────────────────────────────────────────────────────────
//
// Store calls keyed by record id do not know who is asking. Callers acting on
// behalf of a principal resolve ids through these first; a record owned by
// someone else looks exactly like a missing one.

/// The message `id`, if it exists and belongs to `owner`.
pub async fn owned_message<S: GroupwareStore>(
  store: &S,
  owner: Uuid,
  id: Uuid,
) -> Result<Option<Message>, S::Error> {
  Ok(store.get_message(id).await?.filter(|m| m.user_id == owner))
}

/// The ids in `ids` that name messages owned by `owner`, in input order.
pub async fn owned_message_ids<S: GroupwareStore>(
  store: &S,
  owner: Uuid,
  ids: &[Uuid],
) -> Result<Vec<Uuid>, S::Error> {
  let mine = store.list_messages(owner, &MessageFilter::default()).await?;
  Ok(ids.iter().copied().filter(|id| mine.iter().any(|m| m.id == *id)).collect())
}

/// The label `id`, if it belongs to `owner`.
pub async fn owned_label<S: GroupwareStore>(
  store: &S,
  owner: Uuid,
  id: Uuid,
) -> Result<Option<Label>, S::Error> {
  Ok(store.list_labels(owner).await?.into_iter().find(|l| l.id == id))
}

/// The live event `id`, if `owner` created it.
pub async fn owned_event<S: GroupwareStore>(
  store: &S,
  owner: Uuid,
  id: Uuid,
) -> Result<Option<Event>, S::Error> {
  Ok(store.get_event(id).await?.filter(|e| e.user_id == owner))
}
