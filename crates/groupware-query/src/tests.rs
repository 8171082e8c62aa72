//! Workspace behaviour against the in-memory store and its demo data.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeZone as _, Utc};
use groupware_core::{
  attendance::AttendanceStatus,
  clock::ManualClock,
  event::{Event, EventFilter, EventPatch, NewEvent, ParticipantStatus},
  filter::{MessageFilter, View},
  message::{FlagPatch, LabelPatch, Message, NewLabel, NewMessage, Service},
  profile::{Principal, Role},
  store::GroupwareStore,
};
use groupware_store_memory::{DEMO_USER_ID, Latency, MemoryStore};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
  Level, Notification, QueryStatus, Workspace,
  key::{QueryKey, family},
};

fn user(n: u128) -> Uuid { Uuid::from_u128(0x00000000_0000_4000_8000_000000000000 + n) }

fn id(prefix: u128, n: u128) -> Uuid {
  Uuid::from_u128((prefix << 124) | 0x0000_4000_8000_000000000000 | n)
}

fn message_id(n: u128) -> Uuid { id(1, n) }

fn label_id(n: u128) -> Uuid { id(2, n) }

fn event_id(n: u128) -> Uuid { id(3, n) }

fn monday_noon() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap() }

struct Harness {
  ws:      Workspace<MemoryStore>,
  clock:   Arc<ManualClock>,
  notices: mpsc::UnboundedReceiver<Notification>,
}

fn harness_at(now: DateTime<Utc>, principal: Principal, latency: Latency) -> Harness {
  let clock = Arc::new(ManualClock::new(now));
  let store = MemoryStore::demo().unwrap().with_clock(clock.clone()).with_latency(latency);
  let (tx, notices) = mpsc::unbounded_channel();
  let ws = Workspace::new(store, principal).with_clock(clock.clone()).with_notifier(tx);
  Harness { ws, clock, notices }
}

fn manager() -> Principal { Principal::new(DEMO_USER_ID, Role::Manager) }

fn member() -> Principal { Principal::new(user(2), Role::Member) }

fn harness() -> Harness { harness_at(monday_noon(), manager(), Latency::none()) }

fn inbox_key() -> QueryKey { QueryKey::new(family::MESSAGES).with_json(&MessageFilter::view(View::Inbox)) }

fn find(list: &[Message], id: Uuid) -> &Message { list.iter().find(|m| m.id == id).unwrap() }

fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
  std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

// ─── Optimistic flags ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn star_toggle_is_visible_before_the_write_settles() {
  let h = harness_at(monday_noon(), manager(), Latency::simulated());
  let target = message_id(1);
  let before = h.ws.messages(MessageFilter::view(View::Inbox)).await;
  assert!(!find(before.data().unwrap(), target).is_starred);

  let pending = tokio::spawn({
    let ws = h.ws.clone();
    async move { ws.set_starred(target, true).await }
  });
  tokio::time::sleep(Duration::from_millis(10)).await;

  let cached = h.ws.client().get_data::<Vec<Message>>(&inbox_key()).unwrap();
  assert!(find(&cached, target).is_starred, "patched in the cache");
  let stored = h.ws.store().get_message(target).await.unwrap().unwrap();
  assert!(!stored.is_starred, "write still in flight");

  pending.await.unwrap().unwrap();
  assert!(h.ws.client().is_invalidated(&inbox_key()));
  let after = h.ws.messages(MessageFilter::view(View::Inbox)).await;
  assert!(find(after.data().unwrap(), target).is_starred);
}

#[tokio::test(start_paused = true)]
async fn failed_star_toggle_rolls_back() {
  let mut h = harness();
  let target = message_id(1);
  h.ws.messages(MessageFilter::view(View::Inbox)).await;
  h.ws.messages(MessageFilter::view(View::Starred)).await;

  h.ws.store().fail_next_writes(2);
  let err = h.ws.set_starred(target, true).await.unwrap_err();
  assert!(err.is_transient());

  let cached = h.ws.client().get_data::<Vec<Message>>(&inbox_key()).unwrap();
  assert!(!find(&cached, target).is_starred, "snapshot restored");
  assert!(h.ws.client().is_invalidated(&inbox_key()));

  let notices = drain(&mut h.notices);
  assert_eq!(notices.len(), 1);
  assert_eq!(notices[0].level, Level::Error);
  assert!(notices[0].message.starts_with("Could not update the star"));
}

#[tokio::test(start_paused = true)]
async fn one_transient_write_failure_is_retried() {
  let mut h = harness();
  h.ws.store().fail_next_writes(1);
  let updated = h.ws.set_read(message_id(1), true).await.unwrap();
  assert_eq!(updated.len(), 1);
  assert!(updated[0].is_read);
  assert_eq!(drain(&mut h.notices), vec![Notification::success("Read state updated")]);
}

#[tokio::test]
async fn bulk_trash_and_restore() {
  let h = harness();
  let trashed = h.ws.move_to_trash(&[message_id(1), message_id(10)]).await.unwrap();
  assert_eq!(trashed.len(), 2);

  let inbox = h.ws.messages(MessageFilter::view(View::Inbox)).await;
  assert!(inbox.data().unwrap().iter().all(|m| m.id != message_id(1) && m.id != message_id(10)));
  assert_eq!(h.ws.unread_count().await.data().unwrap().gmail, 0);

  let restored = h.ws.restore_message(message_id(1)).await.unwrap();
  assert!(!restored.is_trash);
  assert_eq!(h.ws.unread_count().await.data().unwrap().gmail, 1);

  let missing = h.ws.restore_message(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(missing.domain().map(|e| e.code()), Some("message_not_found"));
}

#[tokio::test]
async fn bulk_read_and_star_patch_every_list() {
  let h = harness();
  let ids = [message_id(3), message_id(4)];
  h.ws.messages(MessageFilter::view(View::Inbox)).await;

  h.ws.bulk_set_read(&ids, true).await.unwrap();
  h.ws.bulk_set_starred(&ids, true).await.unwrap();

  let starred = h.ws.messages(MessageFilter::view(View::Starred)).await;
  let starred: Vec<Uuid> = starred.data().unwrap().iter().map(|m| m.id).collect();
  assert!(ids.iter().all(|id| starred.contains(id)));
  assert_eq!(h.ws.unread_count().await.data().unwrap().slack, 0);
}

// ─── Freshness ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn expired_entries_are_served_stale_then_refreshed() {
  let h = harness();
  assert_eq!(h.ws.unread_count().await.data().unwrap().total, 4);

  // Behind the cache's back.
  h.ws.store().update_flags(&[message_id(1)], FlagPatch::read(true)).await.unwrap();

  let cached = h.ws.unread_count().await;
  assert_eq!(cached.data().unwrap().total, 4);
  assert!(!cached.is_stale);

  tokio::time::advance(Duration::from_secs(31)).await;
  let stale = h.ws.unread_count().await;
  assert_eq!(stale.data().unwrap().total, 4);
  assert!(stale.is_stale);

  tokio::time::sleep(Duration::from_millis(1)).await;
  let fresh = h.ws.unread_count().await;
  assert_eq!(fresh.data().unwrap().total, 3);
  assert!(!fresh.is_stale);
}

#[tokio::test]
async fn mutations_invalidate_dependent_reads() {
  let h = harness();
  assert_eq!(h.ws.unread_count().await.data().unwrap().total, 4);
  h.ws.set_read(message_id(3), true).await.unwrap();

  let key = QueryKey::new(family::UNREAD_COUNT);
  assert!(h.ws.client().is_invalidated(&key));
  let count = h.ws.unread_count().await;
  assert_eq!((count.data().unwrap().total, count.data().unwrap().slack), (3, 1));
}

#[tokio::test]
async fn lookups_without_an_id_stay_idle() {
  let h = harness();
  assert!(h.ws.message(None).await.is_idle());
  assert!(h.ws.event(None).await.is_idle());
  assert!(h.ws.participants(None).await.is_idle());
  assert!(h.ws.profile(None).await.is_idle());
  assert!(h.ws.my_participant_status(None).await.is_idle());
  assert!(h.ws.client().is_empty(), "nothing was fetched");
}

#[tokio::test(start_paused = true)]
async fn read_failures_surface_as_error_status() {
  let h = harness();
  h.ws.store().fail_next_reads(2);
  let labels = h.ws.labels().await;
  assert_eq!(labels.status, QueryStatus::Error);
  assert!(labels.error.unwrap().is_transient());

  let labels = h.ws.labels().await;
  assert_eq!(labels.data().unwrap().len(), 3);
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn clock_in_and_out_refresh_today() {
  let thursday = Utc.with_ymd_and_hms(2025, 1, 9, 9, 0, 0).unwrap();
  let mut h = harness_at(thursday, manager(), Latency::none());
  assert_eq!(h.ws.today_attendance().await.data().unwrap().as_ref(), None);

  h.ws.clock_in().await.unwrap();
  let today = h.ws.today_attendance().await;
  assert!(today.data().unwrap().as_ref().unwrap().is_open());

  h.clock.advance(chrono::Duration::hours(9));
  let closed = h.ws.clock_out().await.unwrap();
  assert_eq!(closed.work_minutes, Some(540));
  assert_eq!(closed.status, AttendanceStatus::Normal);

  let week = h.ws.week_attendances().await;
  assert_eq!(week.data().unwrap().len(), 4);
  assert_eq!(h.ws.week_stats().await.data().unwrap().total_minutes, 1530 + 540);

  let again = h.ws.clock_in().await.unwrap_err();
  assert_eq!(again.domain().map(|e| e.code()), Some("already_clocked_in"));

  let levels: Vec<Level> = drain(&mut h.notices).into_iter().map(|n| n.level).collect();
  assert_eq!(levels, vec![Level::Success, Level::Success, Level::Error]);
}

#[tokio::test]
async fn clock_out_without_clock_in_changes_nothing() {
  let thursday = Utc.with_ymd_and_hms(2025, 1, 9, 18, 0, 0).unwrap();
  let h = harness_at(thursday, manager(), Latency::none());
  let err = h.ws.clock_out().await.unwrap_err();
  assert_eq!(err.domain().map(|e| e.code()), Some("not_clocked_in"));
  assert_eq!(h.ws.today_attendance().await.data().unwrap().as_ref(), None);
}

#[tokio::test]
async fn month_stats_sum_the_demo_month() {
  let h = harness();
  let stats = h.ws.month_stats(2025, 1).await;
  let stats = stats.data().unwrap();
  assert_eq!(stats.total_days, 3);
  assert_eq!(stats.total_minutes, 1530);
  assert_eq!((stats.total_hours, stats.remaining_minutes), (25, 30));
  assert_eq!((stats.normal_days, stats.late_days, stats.early_leave_days), (1, 1, 1));

  let bad = h.ws.month_attendances(2025, 13).await;
  assert_eq!(bad.error.and_then(|e| e.domain().map(|d| d.code())), Some("validation"));
}

#[tokio::test]
async fn team_views_require_a_manager() {
  let member = harness_at(monday_noon(), member(), Latency::none());
  let denied = member.ws.team_today_attendances().await;
  assert!(denied.is_error());
  assert_eq!(denied.error.unwrap().domain().map(|e| e.code()), Some("forbidden"));
  assert!(member.ws.team_month_attendances(2025, 1).await.is_error());

  let h = harness();
  assert_eq!(h.ws.team_today_attendances().await.data().unwrap().len(), 3);
  assert_eq!(h.ws.team_month_attendances(2025, 1).await.data().unwrap().len(), 5);
}

// ─── Events ──────────────────────────────────────────────────────────────────

fn new_event(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> NewEvent {
  NewEvent {
    title: title.to_owned(),
    description: None,
    start_at: start,
    end_at: end,
    is_all_day: false,
    color: "#3B82F6".to_owned(),
    recurrence: None,
  }
}

fn titles(events: &[Event]) -> Vec<String> { events.iter().map(|e| e.title.clone()).collect() }

#[tokio::test]
async fn event_writes_refresh_month_view() {
  let h = harness();
  let january = EventFilter::month(2025, 1);
  let before = h.ws.events(january.clone()).await;
  assert_eq!(titles(before.data().unwrap()), ["Team standup", "Sprint planning", "Company holiday"]);

  let start = Utc.with_ymd_and_hms(2025, 1, 10, 15, 0, 0).unwrap();
  let backwards = new_event("Retro", start, start - chrono::Duration::hours(1));
  let err = h.ws.create_event(backwards).await.unwrap_err();
  assert_eq!(err.domain(), Some(&groupware_core::Error::InvalidTimeRange));
  assert!(!h.ws.client().is_invalidated(&QueryKey::new(family::EVENTS).with_json(&january)));

  let retro = h
    .ws
    .create_event(new_event("Retro", start, start + chrono::Duration::hours(1)))
    .await
    .unwrap();
  let after = h.ws.events(january.clone()).await;
  assert_eq!(titles(after.data().unwrap())[2], "Retro");

  assert!(h.ws.delete_event(retro.id).await.unwrap());
  assert!(h.ws.event(Some(retro.id)).await.data().unwrap().is_none());
  assert_eq!(h.ws.events(january).await.data().unwrap().len(), 3);
}

#[tokio::test]
async fn today_events_follow_the_clock() {
  let h = harness();
  let today = h.ws.today_events().await;
  let ids: Vec<Uuid> = today.data().unwrap().iter().map(|e| e.id).collect();
  assert_eq!(ids, vec![event_id(1)]);
}

#[tokio::test]
async fn participants_dedup_and_responses() {
  let h = harness();
  let added = h.ws.add_participants(event_id(1), &[user(2), user(4)]).await.unwrap();
  assert_eq!(added.len(), 1);
  assert_eq!(added[0].user_id, user(4));
  assert_eq!(h.ws.participants(Some(event_id(1))).await.data().unwrap().len(), 3);

  let mine = h.ws.my_participant_status(Some(event_id(2))).await;
  assert_eq!(*mine.data().unwrap(), Some(ParticipantStatus::Pending));
  h.ws.respond(event_id(2), ParticipantStatus::Accepted).await.unwrap();
  let mine = h.ws.my_participant_status(Some(event_id(2))).await;
  assert_eq!(*mine.data().unwrap(), Some(ParticipantStatus::Accepted));

  assert!(h.ws.remove_participant(event_id(1), user(4)).await.unwrap());
  assert_eq!(h.ws.participants(Some(event_id(1))).await.data().unwrap().len(), 2);
}

// ─── Ownership ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn another_users_messages_are_out_of_reach() {
  let h = harness_at(monday_noon(), member(), Latency::none());
  let theirs = message_id(1);
  assert!(h.ws.message(Some(theirs)).await.data().unwrap().is_none());
  assert!(h.ws.message(Some(message_id(11))).await.data().unwrap().is_some());
  assert!(h.ws.message_labels(theirs).await.data().unwrap().is_empty());

  assert!(h.ws.set_read(theirs, true).await.unwrap().is_empty());
  assert!(h.ws.move_to_trash(&[theirs]).await.unwrap().is_empty());
  let err = h.ws.restore_message(theirs).await.unwrap_err();
  assert_eq!(err.domain(), Some(&groupware_core::Error::MessageNotFound(theirs)));
  assert!(!h.ws.delete_permanently(theirs).await.unwrap());

  let stored = h.ws.store().get_message(theirs).await.unwrap().unwrap();
  assert!(!stored.is_read && !stored.is_trash);
}

#[tokio::test]
async fn another_users_labels_and_events_are_out_of_reach() {
  let h = harness_at(monday_noon(), member(), Latency::none());
  let rename = LabelPatch { name: Some("Mine".into()), ..LabelPatch::default() };
  let err = h.ws.update_label(label_id(1), rename).await.unwrap_err();
  assert_eq!(err.domain(), Some(&groupware_core::Error::LabelNotFound(label_id(1))));
  assert!(!h.ws.delete_label(label_id(1)).await.unwrap());
  let err = h.ws.assign_label(message_id(11), label_id(1)).await.unwrap_err();
  assert_eq!(err.domain(), Some(&groupware_core::Error::LabelNotFound(label_id(1))));

  let retitle = EventPatch { title: Some("Mine".into()), ..EventPatch::default() };
  let err = h.ws.update_event(event_id(1), retitle).await.unwrap_err();
  assert_eq!(err.domain(), Some(&groupware_core::Error::EventNotFound(event_id(1))));
  assert!(!h.ws.delete_event(event_id(1)).await.unwrap());
  assert!(h.ws.add_participants(event_id(1), &[user(4)]).await.is_err());

  let store = h.ws.store();
  assert!(store.list_labels(DEMO_USER_ID).await.unwrap().iter().any(|l| l.id == label_id(1)));
  let standup = store.get_event(event_id(1)).await.unwrap().unwrap();
  assert_eq!(standup.title, "Team standup");
}

#[tokio::test]
async fn only_participants_answer_for_themselves() {
  let h = harness_at(monday_noon(), member(), Latency::none());
  // Event 2 is the member's own, yet the invitee's answer is still theirs.
  let err = h
    .ws
    .set_participant_status(event_id(2), DEMO_USER_ID, ParticipantStatus::Accepted)
    .await
    .unwrap_err();
  assert_eq!(err.domain().map(|e| e.code()), Some("forbidden"));
  let err = h.ws.remove_participant(event_id(1), user(3)).await.unwrap_err();
  assert_eq!(err.domain().map(|e| e.code()), Some("forbidden"));

  let answered = h.ws.respond(event_id(1), ParticipantStatus::Declined).await.unwrap();
  assert_eq!(answered.map(|p| p.status), Some(ParticipantStatus::Declined));
  assert!(h.ws.remove_participant(event_id(2), DEMO_USER_ID).await.unwrap());
  assert!(h.ws.remove_participant(event_id(1), user(2)).await.unwrap());
}

// ─── Labels, compose, profiles ───────────────────────────────────────────────

#[tokio::test]
async fn labels_flow_through_message_filter() {
  let h = harness();
  assert_eq!(h.ws.labels().await.data().unwrap().len(), 3);

  let urgent = h
    .ws
    .create_label(NewLabel { name: "Urgent".into(), color: "#EF4444".into() })
    .await
    .unwrap();
  assert_eq!(h.ws.labels().await.data().unwrap().len(), 4);

  h.ws.assign_label(message_id(2), urgent.id).await.unwrap();
  let filter = MessageFilter { label_id: Some(urgent.id), ..MessageFilter::default() };
  let tagged = h.ws.messages(filter.clone()).await;
  assert_eq!(tagged.data().unwrap().iter().map(|m| m.id).collect::<Vec<_>>(), [message_id(2)]);
  assert_eq!(h.ws.message_labels(message_id(2)).await.data().unwrap().len(), 1);

  assert!(h.ws.delete_label(urgent.id).await.unwrap());
  assert!(h.ws.messages(filter).await.data().unwrap().is_empty());
  assert!(h.ws.unassign_label(message_id(1), label_id(1)).await.unwrap());
}

#[tokio::test]
async fn compose_saves_drafts_and_sends() {
  let mut h = harness();
  let draft = NewMessage {
    service:       Service::Gmail,
    draft:         true,
    subject:       Some("Half-written".into()),
    body:          None,
    from_address:  None,
    to_addresses:  Vec::new(),
    cc_addresses:  Vec::new(),
    bcc_addresses: Vec::new(),
    thread_id:     None,
  };
  h.ws.compose(draft.clone()).await.unwrap();
  assert_eq!(h.ws.messages(MessageFilter::view(View::Draft)).await.data().unwrap().len(), 2);

  let unaddressed = NewMessage { draft: false, ..draft };
  assert!(h.ws.compose(unaddressed).await.is_err());

  let messages: Vec<String> = drain(&mut h.notices).into_iter().map(|n| n.message).collect();
  assert_eq!(messages[0], "Draft saved");
  assert!(messages[1].starts_with("Could not send the message"));
}

#[tokio::test]
async fn team_members_exclude_the_caller() {
  let h = harness();
  let members = h.ws.team_members().await;
  let members = members.data().unwrap();
  assert_eq!(members.len(), 3);
  assert!(members.iter().all(|p| p.user_id != DEMO_USER_ID));

  let me = h.ws.current_profile().await;
  assert_eq!(me.data().unwrap().as_ref().map(|p| p.role), Some(Role::Manager));
  assert_eq!(h.ws.profiles().await.data().unwrap().len(), 4);
}
