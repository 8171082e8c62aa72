//! Calendar events and their participants.

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, message::validate_color, profile::Profile};

// ─── Event ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub id:          Uuid,
  pub user_id:     Uuid,
  pub title:       String,
  pub description: Option<String>,
  pub start_at:    DateTime<Utc>,
  pub end_at:      DateTime<Utc>,
  pub is_all_day:  bool,
  pub color:       String,
  pub recurrence:  Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  /// Soft-delete marker. Deleted events are invisible to every read.
  pub deleted_at:  Option<DateTime<Utc>>,
}

impl Event {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }

  /// Apply `patch` and re-validate. On error the event is left unchanged.
  pub fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) -> Result<()> {
    let mut next = self.clone();
    if let Some(title) = patch.title {
      next.title = title;
    }
    if let Some(description) = patch.description {
      next.description = description;
    }
    if let Some(start_at) = patch.start_at {
      next.start_at = start_at;
    }
    if let Some(end_at) = patch.end_at {
      next.end_at = end_at;
    }
    if let Some(is_all_day) = patch.is_all_day {
      next.is_all_day = is_all_day;
    }
    if let Some(color) = patch.color {
      next.color = color;
    }
    if let Some(recurrence) = patch.recurrence {
      next.recurrence = recurrence;
    }
    validate_event(&next.title, next.start_at, next.end_at, &next.color)?;

    next.updated_at = now;
    *self = next;
    Ok(())
  }
}

fn validate_event(
  title: &str,
  start_at: DateTime<Utc>,
  end_at: DateTime<Utc>,
  color: &str,
) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::Validation("event title is empty".into()));
  }
  if end_at < start_at {
    return Err(Error::InvalidTimeRange);
  }
  validate_color(color)
}

/// Input to [`crate::store::GroupwareStore::create_event`]. The owner and
/// timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
  pub title:       String,
  pub description: Option<String>,
  pub start_at:    DateTime<Utc>,
  pub end_at:      DateTime<Utc>,
  #[serde(default)]
  pub is_all_day:  bool,
  pub color:       String,
  pub recurrence:  Option<String>,
}

impl NewEvent {
  pub fn validate(&self) -> Result<()> {
    validate_event(&self.title, self.start_at, self.end_at, &self.color)
  }

  pub fn into_event(self, owner: Uuid, now: DateTime<Utc>) -> Result<Event> {
    self.validate()?;
    Ok(Event {
      id:          Uuid::new_v4(),
      user_id:     owner,
      title:       self.title,
      description: self.description,
      start_at:    self.start_at,
      end_at:      self.end_at,
      is_all_day:  self.is_all_day,
      color:       self.color,
      recurrence:  self.recurrence,
      created_at:  now,
      updated_at:  now,
      deleted_at:  None,
    })
  }
}

/// A partial update. `None` fields are left unchanged.
///
/// The optional text fields take `Some(Some(v))` to set and `Some(None)` to
/// clear. On the wire an absent key leaves the field alone and `null` clears
/// it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
  pub title:       Option<String>,
  #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
  pub description: Option<Option<String>>,
  pub start_at:    Option<DateTime<Utc>>,
  pub end_at:      Option<DateTime<Utc>>,
  pub is_all_day:  Option<bool>,
  pub color:       Option<String>,
  #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
  pub recurrence:  Option<Option<String>>,
}

/// A present key, `null` included, deserialises to `Some`.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::GroupwareStore::list_events`].
///
/// The month filter applies only when both `year` and `month` are set; the
/// range filter only when both bounds are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventFilter {
  pub year:       Option<i32>,
  pub month:      Option<u32>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date:   Option<DateTime<Utc>>,
  /// Only events starting on this UTC calendar day.
  pub on:         Option<NaiveDate>,
}

impl EventFilter {
  pub fn month(year: i32, month: u32) -> Self {
    Self { year: Some(year), month: Some(month), ..Self::default() }
  }

  pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
    Self { start_date: Some(start), end_date: Some(end), ..Self::default() }
  }

  pub fn on(day: NaiveDate) -> Self { Self { on: Some(day), ..Self::default() } }

  pub fn matches(&self, event: &Event) -> bool {
    if event.is_deleted() {
      return false;
    }
    if let (Some(year), Some(month)) = (self.year, self.month)
      && (event.start_at.year() != year || event.start_at.month() != month)
    {
      return false;
    }
    if let (Some(start), Some(end)) = (self.start_date, self.end_date)
      && (event.end_at < start || event.start_at > end)
    {
      return false;
    }
    if let Some(day) = self.on
      && event.start_at.date_naive() != day
    {
      return false;
    }
    true
  }
}

/// Ascending by start time.
pub fn sort_events(events: &mut [Event]) { events.sort_by_key(|e| e.start_at); }

// ─── Participants ────────────────────────────────────────────────────────────

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
pub enum ParticipantStatus {
  #[default]
  Pending,
  Accepted,
  Declined,
}

/// Links an event to a user. Unique per `(event_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParticipant {
  pub id:         Uuid,
  pub event_id:   Uuid,
  pub user_id:    Uuid,
  pub status:     ParticipantStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl EventParticipant {
  pub fn pending(event_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      event_id,
      user_id,
      status: ParticipantStatus::Pending,
      created_at: now,
      updated_at: now,
    }
  }
}

/// A participant with the profile of the participating user, if known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantWithProfile {
  #[serde(flatten)]
  pub participant: EventParticipant,
  pub profile:     Option<Profile>,
}
