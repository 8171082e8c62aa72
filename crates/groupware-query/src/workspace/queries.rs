//! Read operations.

use std::{future::Future, sync::Arc, time::Duration};

use groupware_core::{
  attendance::{Attendance, AttendanceQuery, AttendanceStats, DateRange},
  event::{Event, EventFilter, ParticipantStatus, ParticipantWithProfile},
  filter::MessageFilter,
  message::{Label, Message, UnreadCount},
  profile::Profile,
  store::{GroupwareStore, owned_message},
};
use uuid::Uuid;

use super::Workspace;
use crate::{
  cache::{QueryOptions, QueryResult},
  key::{QueryKey, family},
};

/// Freshness windows per query family. Single-record lookups use the
/// client default.
pub mod freshness {
  use std::time::Duration;

  pub const MESSAGES: Duration = Duration::from_secs(60);
  pub const UNREAD_COUNT: Duration = Duration::from_secs(30);
  pub const LABELS: Duration = Duration::from_secs(5 * 60);
  pub const TODAY_ATTENDANCE: Duration = Duration::from_secs(30);
  pub const WEEK_ATTENDANCE: Duration = Duration::from_secs(60);
  pub const MONTH_ATTENDANCE: Duration = Duration::from_secs(5 * 60);
  pub const TEAM_TODAY: Duration = Duration::from_secs(30);
  pub const TEAM_MONTH: Duration = Duration::from_secs(5 * 60);
  pub const EVENTS: Duration = Duration::from_secs(60);
  pub const PROFILES: Duration = Duration::from_secs(5 * 60);
}

impl<S: GroupwareStore + 'static> Workspace<S> {
  /// Read through the cache. `read` gets its own handle on the store so the
  /// fetch can outlive this call as a background refresh.
  async fn query<T, F, Fut>(
    &self,
    key: QueryKey,
    stale_time: Option<Duration>,
    read: F,
  ) -> QueryResult<T>
  where
    T: Send + Sync + 'static,
    F: Fn(Arc<S>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, S::Error>> + Send + 'static,
  {
    let store = self.store.clone();
    let options = stale_time.map_or_else(QueryOptions::default, QueryOptions::stale_for);
    self.client.fetch(key, options, move || read(store.clone())).await
  }

  // ─── Messages ──────────────────────────────────────────────────────────────

  pub async fn messages(&self, filter: MessageFilter) -> QueryResult<Vec<Message>> {
    let owner = self.principal.user_id;
    let key = QueryKey::new(family::MESSAGES).with_json(&filter);
    self
      .query(key, Some(freshness::MESSAGES), move |store: Arc<S>| {
        let filter = filter.clone();
        async move { store.list_messages(owner, &filter).await }
      })
      .await
  }

  /// One of the caller's messages. Anyone else's reads as `None`.
  pub async fn message(&self, id: Option<Uuid>) -> QueryResult<Option<Message>> {
    let Some(id) = id else { return QueryResult::idle() };
    let owner = self.principal.user_id;
    self
      .query(QueryKey::new(family::MESSAGE).with(id), None, move |store: Arc<S>| async move {
        owned_message(store.as_ref(), owner, id).await
      })
      .await
  }

  pub async fn labels(&self) -> QueryResult<Vec<Label>> {
    let owner = self.principal.user_id;
    self
      .query(QueryKey::new(family::LABELS), Some(freshness::LABELS), move |store: Arc<S>| {
        async move { store.list_labels(owner).await }
      })
      .await
  }

  /// Labels attached to one message.
  pub async fn message_labels(&self, message_id: Uuid) -> QueryResult<Vec<Label>> {
    let owner = self.principal.user_id;
    let key = QueryKey::new(family::MESSAGE_LABELS).with(message_id);
    self
      .query(key, None, move |store: Arc<S>| async move {
        match owned_message(store.as_ref(), owner, message_id).await? {
          Some(_) => store.message_labels(message_id).await,
          None => Ok(Vec::new()),
        }
      })
      .await
  }

  pub async fn unread_count(&self) -> QueryResult<UnreadCount> {
    let owner = self.principal.user_id;
    self
      .query(
        QueryKey::new(family::UNREAD_COUNT),
        Some(freshness::UNREAD_COUNT),
        move |store: Arc<S>| async move { store.unread_count(owner).await },
      )
      .await
  }

  // ─── Attendance ────────────────────────────────────────────────────────────

  /// The caller's record for today, if they have clocked in.
  pub async fn today_attendance(&self) -> QueryResult<Option<Attendance>> {
    let user_id = self.principal.user_id;
    let today = self.today();
    let key = QueryKey::new(family::ATTENDANCE).with("today").with(today);
    self
      .query(key, Some(freshness::TODAY_ATTENDANCE), move |store: Arc<S>| async move {
        store.get_attendance(user_id, today).await
      })
      .await
  }

  /// The caller's records for Monday through Friday of the current week.
  pub async fn week_attendances(&self) -> QueryResult<Vec<Attendance>> {
    let range = DateRange::work_week(self.today());
    let key = QueryKey::new(family::ATTENDANCE).with("week").with(range.start);
    self
      .attendance(key, freshness::WEEK_ATTENDANCE, AttendanceQuery::for_user(self.principal.user_id, range))
      .await
  }

  pub async fn month_attendances(&self, year: i32, month: u32) -> QueryResult<Vec<Attendance>> {
    let range = match DateRange::month(year, month) {
      Ok(range) => range,
      Err(err) => return QueryResult::failure(err.into(), None),
    };
    let key = QueryKey::new(family::ATTENDANCE).with("month").with(year).with(month);
    self
      .attendance(key, freshness::MONTH_ATTENDANCE, AttendanceQuery::for_user(self.principal.user_id, range))
      .await
  }

  pub async fn month_stats(&self, year: i32, month: u32) -> QueryResult<AttendanceStats> {
    self.month_attendances(year, month).await.map(|records| AttendanceStats::compute(records))
  }

  pub async fn week_stats(&self) -> QueryResult<AttendanceStats> {
    self.week_attendances().await.map(|records| AttendanceStats::compute(records))
  }

  /// Every user's record for today. Managers and admins only.
  pub async fn team_today_attendances(&self) -> QueryResult<Vec<Attendance>> {
    if let Err(err) = self.principal.require_team_access("view team attendance") {
      return QueryResult::failure(err.into(), None);
    }
    let today = self.today();
    let key = QueryKey::new(family::ATTENDANCE).with("team").with("today").with(today);
    let range = DateRange { start: today, end: today };
    self.attendance(key, freshness::TEAM_TODAY, AttendanceQuery::team(range)).await
  }

  /// Every user's records for a month. Managers and admins only.
  pub async fn team_month_attendances(&self, year: i32, month: u32) -> QueryResult<Vec<Attendance>> {
    if let Err(err) = self.principal.require_team_access("view team attendance") {
      return QueryResult::failure(err.into(), None);
    }
    let range = match DateRange::month(year, month) {
      Ok(range) => range,
      Err(err) => return QueryResult::failure(err.into(), None),
    };
    let key = QueryKey::new(family::ATTENDANCE).with("team").with("month").with(year).with(month);
    self.attendance(key, freshness::TEAM_MONTH, AttendanceQuery::team(range)).await
  }

  async fn attendance(
    &self,
    key: QueryKey,
    stale_time: Duration,
    query: AttendanceQuery,
  ) -> QueryResult<Vec<Attendance>> {
    self
      .query(key, Some(stale_time), move |store: Arc<S>| {
        let query = query.clone();
        async move { store.list_attendance(&query).await }
      })
      .await
  }

  // ─── Events ────────────────────────────────────────────────────────────────

  pub async fn events(&self, filter: EventFilter) -> QueryResult<Vec<Event>> {
    let key = QueryKey::new(family::EVENTS).with_json(&filter);
    self
      .query(key, Some(freshness::EVENTS), move |store: Arc<S>| {
        let filter = filter.clone();
        async move { store.list_events(&filter).await }
      })
      .await
  }

  /// Events starting today.
  pub async fn today_events(&self) -> QueryResult<Vec<Event>> {
    let today = self.today();
    let key = QueryKey::new(family::EVENTS).with("today").with(today);
    self
      .query(key, Some(freshness::EVENTS), move |store: Arc<S>| async move {
        store.list_events(&EventFilter::on(today)).await
      })
      .await
  }

  pub async fn event(&self, id: Option<Uuid>) -> QueryResult<Option<Event>> {
    let Some(id) = id else { return QueryResult::idle() };
    self
      .query(QueryKey::new(family::EVENT).with(id), None, move |store: Arc<S>| async move {
        store.get_event(id).await
      })
      .await
  }

  pub async fn participants(&self, event_id: Option<Uuid>) -> QueryResult<Vec<ParticipantWithProfile>> {
    let Some(event_id) = event_id else { return QueryResult::idle() };
    let key = QueryKey::new(family::PARTICIPANTS).with(event_id);
    self
      .query(key, None, move |store: Arc<S>| async move { store.list_participants(event_id).await })
      .await
  }

  /// The caller's response to an event they were invited to.
  pub async fn my_participant_status(
    &self,
    event_id: Option<Uuid>,
  ) -> QueryResult<Option<ParticipantStatus>> {
    let Some(event_id) = event_id else { return QueryResult::idle() };
    let user_id = self.principal.user_id;
    let key = QueryKey::new(family::PARTICIPANTS).with(event_id).with("mine");
    self
      .query(key, None, move |store: Arc<S>| async move {
        let participant = store.get_participant(event_id, user_id).await?;
        Ok::<_, S::Error>(participant.map(|p| p.status))
      })
      .await
  }

  // ─── Profiles ──────────────────────────────────────────────────────────────

  pub async fn profiles(&self) -> QueryResult<Vec<Profile>> {
    self
      .query(QueryKey::new(family::PROFILES), Some(freshness::PROFILES), |store: Arc<S>| async move {
        store.list_profiles().await
      })
      .await
  }

  pub async fn current_profile(&self) -> QueryResult<Option<Profile>> {
    self.profile(Some(self.principal.user_id)).await
  }

  pub async fn profile(&self, user_id: Option<Uuid>) -> QueryResult<Option<Profile>> {
    let Some(user_id) = user_id else { return QueryResult::idle() };
    let key = QueryKey::new(family::PROFILE).with(user_id);
    self
      .query(key, Some(freshness::PROFILES), move |store: Arc<S>| async move {
        store.get_profile(user_id).await
      })
      .await
  }

  /// Everyone but the caller, for participant pickers.
  pub async fn team_members(&self) -> QueryResult<Vec<Profile>> {
    let me = self.principal.user_id;
    let key = QueryKey::new(family::PROFILES).with("team");
    self
      .query(key, Some(freshness::PROFILES), move |store: Arc<S>| async move {
        let profiles = store.list_profiles().await?;
        Ok::<_, S::Error>(profiles.into_iter().filter(|p| p.user_id != me).collect())
      })
      .await
  }
}
