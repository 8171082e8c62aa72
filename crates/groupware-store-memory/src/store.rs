//! [`MemoryStore`]: the in-memory implementation of [`GroupwareStore`].

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use groupware_core::{
  attendance::{Attendance, AttendanceQuery, sort_attendance},
  clock::{Clock, SystemClock},
  event::{
    Event, EventFilter, EventParticipant, EventPatch, NewEvent, ParticipantStatus,
    ParticipantWithProfile, sort_events,
  },
  filter::{MessageFilter, sort_messages},
  message::{
    FlagPatch, Label, LabelPatch, Message, MessageLabel, MessageType, NewLabel, NewMessage,
    UnreadCount,
  },
  profile::Profile,
  store::GroupwareStore,
};

use crate::{
  Error, Result,
  fault::{Faults, Latency, pause},
  seed::Seed,
};

// ─── Tables ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Tables {
  profiles:       Vec<Profile>,
  messages:       Vec<Message>,
  labels:         Vec<Label>,
  message_labels: Vec<MessageLabel>,
  attendances:    Vec<Attendance>,
  events:         Vec<Event>,
  participants:   Vec<EventParticipant>,
}

impl From<Seed> for Tables {
  fn from(seed: Seed) -> Self {
    Self {
      profiles:       seed.profiles,
      messages:       seed.messages,
      labels:         seed.labels,
      message_labels: seed.message_labels,
      attendances:    seed.attendances,
      events:         seed.events,
      participants:   seed.event_participants,
    }
  }
}

impl Tables {
  fn message_mut(&mut self, id: Uuid) -> Option<&mut Message> {
    self.messages.iter_mut().find(|m| m.id == id)
  }

  fn live_event_mut(&mut self, id: Uuid) -> Option<&mut Event> {
    self.events.iter_mut().find(|e| e.id == id && !e.is_deleted())
  }

  fn attendance_mut(&mut self, user_id: Uuid, date: NaiveDate) -> Option<&mut Attendance> {
    self
      .attendances
      .iter_mut()
      .find(|a| a.user_id == user_id && a.work_date == date)
  }

  fn participant_mut(&mut self, event_id: Uuid, user_id: Uuid) -> Option<&mut EventParticipant> {
    self
      .participants
      .iter_mut()
      .find(|p| p.event_id == event_id && p.user_id == user_id)
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A groupware store held entirely in memory.
///
/// Cloning is cheap; clones share the same tables.
#[derive(Clone)]
pub struct MemoryStore {
  tables:  Arc<RwLock<Tables>>,
  faults:  Arc<Faults>,
  clock:   Arc<dyn Clock>,
  latency: Latency,
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new(Seed::default()) }
}

impl MemoryStore {
  /// A store populated from `seed`, reading the system clock, with no added
  /// latency.
  pub fn new(seed: Seed) -> Self {
    Self {
      tables:  Arc::new(RwLock::new(seed.into())),
      faults:  Arc::default(),
      clock:   Arc::new(SystemClock),
      latency: Latency::none(),
    }
  }

  /// A store populated with the bundled demo data set.
  pub fn demo() -> Result<Self> { Ok(Self::new(Seed::demo()?)) }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_latency(mut self, latency: Latency) -> Self {
    self.latency = latency;
    self
  }

  /// Make the next `n` reads fail with
  /// [`groupware_core::Error::Unavailable`].
  pub fn fail_next_reads(&self, n: usize) { self.faults.fail_reads(n); }

  /// Make the next `n` writes fail with
  /// [`groupware_core::Error::Unavailable`], leaving the tables untouched.
  pub fn fail_next_writes(&self, n: usize) { self.faults.fail_writes(n); }

  fn now(&self) -> DateTime<Utc> { self.clock.now() }

  async fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
    pause(self.latency.read).await;
    if self.faults.take_read() {
      return Err(unavailable("injected read failure"));
    }
    Ok(self.tables.read().await)
  }

  async fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
    pause(self.latency.write).await;
    if self.faults.take_write() {
      return Err(unavailable("injected write failure"));
    }
    Ok(self.tables.write().await)
  }
}

fn unavailable(reason: &str) -> Error {
  groupware_core::Error::Unavailable(reason.to_owned()).into()
}

// ─── GroupwareStore impl ─────────────────────────────────────────────────────

impl GroupwareStore for MemoryStore {
  type Error = Error;

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn list_messages<'a>(
    &'a self,
    owner: Uuid,
    filter: &'a MessageFilter,
  ) -> Result<Vec<Message>> {
    let t = self.read().await?;
    let mut out: Vec<Message> = t
      .messages
      .iter()
      .filter(|m| m.user_id == owner && filter.matches(m, &t.message_labels))
      .cloned()
      .collect();
    sort_messages(&mut out);
    Ok(out)
  }

  async fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
    let t = self.read().await?;
    Ok(t.messages.iter().find(|m| m.id == id).cloned())
  }

  async fn create_message(&self, owner: Uuid, input: NewMessage) -> Result<Message> {
    input.validate()?;
    let now = self.now();
    let message = Message {
      id:             Uuid::new_v4(),
      user_id:        owner,
      service:        input.service,
      message_type:   if input.draft { MessageType::Draft } else { MessageType::Sent },
      recipient_type: None,
      external_id:    None,
      thread_id:      input.thread_id,
      subject:        input.subject,
      body:           input.body,
      from_address:   input.from_address,
      to_addresses:   input.to_addresses,
      cc_addresses:   input.cc_addresses,
      bcc_addresses:  input.bcc_addresses,
      is_read:        true,
      is_starred:     false,
      is_spam:        false,
      is_trash:       false,
      attachments:    Vec::new(),
      received_at:    None,
      created_at:     now,
      updated_at:     now,
      deleted_at:     None,
    };

    self.write().await?.messages.push(message.clone());
    tracing::debug!(id = %message.id, kind = %message.message_type, "message created");
    Ok(message)
  }

  async fn update_flags<'a>(&'a self, ids: &'a [Uuid], patch: FlagPatch) -> Result<Vec<Message>> {
    let now = self.now();
    let mut t = self.write().await?;
    let mut updated = Vec::with_capacity(ids.len());
    for &id in ids {
      if let Some(message) = t.message_mut(id) {
        if message.apply_flags(&patch) {
          message.updated_at = now;
        }
        updated.push(message.clone());
      }
    }
    tracing::debug!(requested = ids.len(), updated = updated.len(), "message flags patched");
    Ok(updated)
  }

  async fn delete_message(&self, id: Uuid) -> Result<bool> {
    let mut t = self.write().await?;
    let before = t.messages.len();
    t.messages.retain(|m| m.id != id);
    let removed = t.messages.len() != before;
    if removed {
      t.message_labels.retain(|l| l.message_id != id);
      tracing::debug!(%id, "message deleted");
    }
    Ok(removed)
  }

  async fn unread_count(&self, owner: Uuid) -> Result<UnreadCount> {
    let t = self.read().await?;
    Ok(UnreadCount::tally(t.messages.iter().filter(|m| m.user_id == owner)))
  }

  // ── Labels ────────────────────────────────────────────────────────────────

  async fn list_labels(&self, owner: Uuid) -> Result<Vec<Label>> {
    let t = self.read().await?;
    let mut out: Vec<Label> = t.labels.iter().filter(|l| l.user_id == owner).cloned().collect();
    out.sort_by_key(|l| (l.sort_order, l.created_at));
    Ok(out)
  }

  async fn create_label(&self, owner: Uuid, input: NewLabel) -> Result<Label> {
    input.validate()?;
    let now = self.now();
    let mut t = self.write().await?;
    let sort_order = t
      .labels
      .iter()
      .filter(|l| l.user_id == owner)
      .map(|l| l.sort_order)
      .max()
      .map_or(0, |max| max + 1);
    let label = Label {
      id: Uuid::new_v4(),
      user_id: owner,
      name: input.name.trim().to_owned(),
      color: input.color,
      sort_order,
      created_at: now,
      updated_at: now,
    };
    t.labels.push(label.clone());
    Ok(label)
  }

  async fn update_label(&self, id: Uuid, patch: LabelPatch) -> Result<Label> {
    patch.validate()?;
    let now = self.now();
    let mut t = self.write().await?;
    let label = t
      .labels
      .iter_mut()
      .find(|l| l.id == id)
      .ok_or(groupware_core::Error::LabelNotFound(id))?;
    if let Some(name) = patch.name {
      label.name = name.trim().to_owned();
    }
    if let Some(color) = patch.color {
      label.color = color;
    }
    if let Some(sort_order) = patch.sort_order {
      label.sort_order = sort_order;
    }
    label.updated_at = now;
    Ok(label.clone())
  }

  async fn delete_label(&self, id: Uuid) -> Result<bool> {
    let mut t = self.write().await?;
    let before = t.labels.len();
    t.labels.retain(|l| l.id != id);
    let removed = t.labels.len() != before;
    if removed {
      t.message_labels.retain(|l| l.label_id != id);
    }
    Ok(removed)
  }

  async fn assign_label(&self, message_id: Uuid, label_id: Uuid) -> Result<MessageLabel> {
    let now = self.now();
    let mut t = self.write().await?;
    if !t.messages.iter().any(|m| m.id == message_id) {
      return Err(groupware_core::Error::MessageNotFound(message_id).into());
    }
    if !t.labels.iter().any(|l| l.id == label_id) {
      return Err(groupware_core::Error::LabelNotFound(label_id).into());
    }
    if let Some(existing) = t
      .message_labels
      .iter()
      .find(|l| l.message_id == message_id && l.label_id == label_id)
    {
      return Ok(existing.clone());
    }
    let link = MessageLabel { id: Uuid::new_v4(), message_id, label_id, created_at: now };
    t.message_labels.push(link.clone());
    Ok(link)
  }

  async fn unassign_label(&self, message_id: Uuid, label_id: Uuid) -> Result<bool> {
    let mut t = self.write().await?;
    let before = t.message_labels.len();
    t.message_labels
      .retain(|l| !(l.message_id == message_id && l.label_id == label_id));
    Ok(t.message_labels.len() != before)
  }

  async fn message_labels(&self, message_id: Uuid) -> Result<Vec<Label>> {
    let t = self.read().await?;
    let linked: HashSet<Uuid> = t
      .message_labels
      .iter()
      .filter(|l| l.message_id == message_id)
      .map(|l| l.label_id)
      .collect();
    let mut out: Vec<Label> =
      t.labels.iter().filter(|l| linked.contains(&l.id)).cloned().collect();
    out.sort_by_key(|l| (l.sort_order, l.created_at));
    Ok(out)
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn get_attendance(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<Attendance>> {
    let t = self.read().await?;
    Ok(
      t.attendances
        .iter()
        .find(|a| a.user_id == user_id && a.work_date == date)
        .cloned(),
    )
  }

  async fn list_attendance<'a>(&'a self, query: &'a AttendanceQuery) -> Result<Vec<Attendance>> {
    let t = self.read().await?;
    let mut out: Vec<Attendance> =
      t.attendances.iter().filter(|a| query.matches(a)).cloned().collect();
    sort_attendance(&mut out);
    Ok(out)
  }

  async fn clock_in(&self, user_id: Uuid) -> Result<Attendance> {
    let now = self.now();
    let date = now.date_naive();
    let mut t = self.write().await?;
    if t.attendance_mut(user_id, date).is_some() {
      return Err(groupware_core::Error::AlreadyClockedIn { user_id, date }.into());
    }
    let record = Attendance::open(user_id, now);
    t.attendances.push(record.clone());
    tracing::info!(%user_id, %date, "clocked in");
    Ok(record)
  }

  async fn clock_out(&self, user_id: Uuid) -> Result<Attendance> {
    let now = self.now();
    let date = now.date_naive();
    let mut t = self.write().await?;
    let record = t
      .attendance_mut(user_id, date)
      .ok_or(groupware_core::Error::NotClockedIn { user_id, date })?;
    record.close(now)?;
    tracing::info!(%user_id, %date, minutes = ?record.work_minutes, "clocked out");
    Ok(record.clone())
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn list_events<'a>(&'a self, filter: &'a EventFilter) -> Result<Vec<Event>> {
    let t = self.read().await?;
    let mut out: Vec<Event> = t.events.iter().filter(|e| filter.matches(e)).cloned().collect();
    sort_events(&mut out);
    Ok(out)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let t = self.read().await?;
    Ok(t.events.iter().find(|e| e.id == id && !e.is_deleted()).cloned())
  }

  async fn create_event(&self, owner: Uuid, input: NewEvent) -> Result<Event> {
    let event = input.into_event(owner, self.now())?;
    self.write().await?.events.push(event.clone());
    tracing::debug!(id = %event.id, "event created");
    Ok(event)
  }

  async fn update_event(&self, id: Uuid, patch: EventPatch) -> Result<Event> {
    let now = self.now();
    let mut t = self.write().await?;
    let event = t
      .live_event_mut(id)
      .ok_or(groupware_core::Error::EventNotFound(id))?;
    event.apply(patch, now)?;
    Ok(event.clone())
  }

  async fn delete_event(&self, id: Uuid) -> Result<bool> {
    let now = self.now();
    let mut t = self.write().await?;
    let Some(event) = t.live_event_mut(id) else {
      return Ok(false);
    };
    event.deleted_at = Some(now);
    event.updated_at = now;
    tracing::debug!(%id, "event deleted");
    Ok(true)
  }

  // ── Participants ──────────────────────────────────────────────────────────

  async fn list_participants(&self, event_id: Uuid) -> Result<Vec<ParticipantWithProfile>> {
    let t = self.read().await?;
    let mut out: Vec<ParticipantWithProfile> = t
      .participants
      .iter()
      .filter(|p| p.event_id == event_id)
      .map(|p| ParticipantWithProfile {
        participant: p.clone(),
        profile:     t.profiles.iter().find(|pr| pr.user_id == p.user_id).cloned(),
      })
      .collect();
    out.sort_by_key(|p| p.participant.created_at);
    Ok(out)
  }

  async fn add_participants<'a>(
    &'a self,
    event_id: Uuid,
    user_ids: &'a [Uuid],
  ) -> Result<Vec<EventParticipant>> {
    let now = self.now();
    let mut t = self.write().await?;
    if t.live_event_mut(event_id).is_none() {
      return Err(groupware_core::Error::EventNotFound(event_id).into());
    }
    let mut added = Vec::new();
    for &user_id in user_ids {
      if t.participant_mut(event_id, user_id).is_some() {
        continue;
      }
      let participant = EventParticipant::pending(event_id, user_id, now);
      t.participants.push(participant.clone());
      added.push(participant);
    }
    Ok(added)
  }

  async fn remove_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
    let mut t = self.write().await?;
    let before = t.participants.len();
    t.participants
      .retain(|p| !(p.event_id == event_id && p.user_id == user_id));
    Ok(t.participants.len() != before)
  }

  async fn set_participant_status(
    &self,
    event_id: Uuid,
    user_id: Uuid,
    status: ParticipantStatus,
  ) -> Result<Option<EventParticipant>> {
    let now = self.now();
    let mut t = self.write().await?;
    Ok(t.participant_mut(event_id, user_id).map(|p| {
      p.status = status;
      p.updated_at = now;
      p.clone()
    }))
  }

  async fn get_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<Option<EventParticipant>> {
    let t = self.read().await?;
    Ok(
      t.participants
        .iter()
        .find(|p| p.event_id == event_id && p.user_id == user_id)
        .cloned(),
    )
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    let t = self.read().await?;
    let mut out = t.profiles.clone();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
  }

  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    let t = self.read().await?;
    Ok(t.profiles.iter().find(|p| p.user_id == user_id).cloned())
  }
}
