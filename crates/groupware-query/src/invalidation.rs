//! Which cache entries each mutation makes stale.

use uuid::Uuid;

use crate::key::{QueryKey, family};

/// Every write the application performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
  ClockIn,
  ClockOut,

  CreateEvent,
  UpdateEvent(Uuid),
  DeleteEvent(Uuid),
  AddParticipants(Uuid),
  RemoveParticipant(Uuid),
  SetParticipantStatus(Uuid),

  CreateLabel,
  UpdateLabel,
  DeleteLabel,
  AssignLabel(Uuid),
  UnassignLabel(Uuid),

  SetRead,
  SetStarred,
  MoveToTrash,
  Restore,
  DeletePermanently,
  Compose { draft: bool },
}

impl Mutation {
  /// Key prefixes to invalidate once the mutation settles.
  pub fn invalidates(&self) -> Vec<QueryKey> {
    let key = QueryKey::new;
    let messages = || vec![key(family::MESSAGES), key(family::MESSAGE), key(family::UNREAD_COUNT)];
    match *self {
      Self::ClockIn | Self::ClockOut => vec![key(family::ATTENDANCE)],

      Self::CreateEvent => vec![key(family::EVENTS)],
      Self::UpdateEvent(id) | Self::DeleteEvent(id) => {
        vec![key(family::EVENTS), key(family::EVENT).with(id)]
      }
      Self::AddParticipants(event_id) | Self::RemoveParticipant(event_id) => {
        vec![key(family::PARTICIPANTS).with(event_id)]
      }
      Self::SetParticipantStatus(event_id) => {
        vec![key(family::PARTICIPANTS).with(event_id), key(family::EVENTS)]
      }

      Self::CreateLabel | Self::UpdateLabel => vec![key(family::LABELS), key(family::MESSAGE_LABELS)],
      Self::DeleteLabel => vec![
        key(family::LABELS),
        key(family::MESSAGE_LABELS),
        key(family::MESSAGES),
      ],
      Self::AssignLabel(message_id) | Self::UnassignLabel(message_id) => vec![
        key(family::MESSAGE_LABELS).with(message_id),
        key(family::MESSAGES),
      ],

      Self::SetRead | Self::SetStarred | Self::MoveToTrash | Self::Restore | Self::Compose { .. } => {
        messages()
      }
      Self::DeletePermanently => {
        let mut keys = messages();
        keys.push(key(family::MESSAGE_LABELS));
        keys
      }
    }
  }

  /// Shown to the user when the mutation succeeds.
  pub fn success_message(&self) -> &'static str {
    match self {
      Self::ClockIn => "Clocked in",
      Self::ClockOut => "Clocked out",
      Self::CreateEvent => "Event added",
      Self::UpdateEvent(_) => "Event updated",
      Self::DeleteEvent(_) => "Event deleted",
      Self::AddParticipants(_) => "Participants added",
      Self::RemoveParticipant(_) => "Participant removed",
      Self::SetParticipantStatus(_) => "Response saved",
      Self::CreateLabel => "Label created",
      Self::UpdateLabel => "Label updated",
      Self::DeleteLabel => "Label deleted",
      Self::AssignLabel(_) => "Label applied",
      Self::UnassignLabel(_) => "Label removed",
      Self::SetRead => "Read state updated",
      Self::SetStarred => "Star updated",
      Self::MoveToTrash => "Moved to trash",
      Self::Restore => "Message restored",
      Self::DeletePermanently => "Message deleted",
      Self::Compose { draft: true } => "Draft saved",
      Self::Compose { draft: false } => "Message sent",
    }
  }

  /// Shown to the user when the mutation fails.
  pub fn failure_message(&self) -> &'static str {
    match self {
      Self::ClockIn => "Could not clock in",
      Self::ClockOut => "Could not clock out",
      Self::CreateEvent => "Could not add the event",
      Self::UpdateEvent(_) => "Could not update the event",
      Self::DeleteEvent(_) => "Could not delete the event",
      Self::AddParticipants(_) => "Could not add participants",
      Self::RemoveParticipant(_) => "Could not remove the participant",
      Self::SetParticipantStatus(_) => "Could not save the response",
      Self::CreateLabel => "Could not create the label",
      Self::UpdateLabel => "Could not update the label",
      Self::DeleteLabel => "Could not delete the label",
      Self::AssignLabel(_) => "Could not apply the label",
      Self::UnassignLabel(_) => "Could not remove the label",
      Self::SetRead => "Could not update the read state",
      Self::SetStarred => "Could not update the star",
      Self::MoveToTrash => "Could not move to trash",
      Self::Restore => "Could not restore the message",
      Self::DeletePermanently => "Could not delete the message",
      Self::Compose { draft: true } => "Could not save the draft",
      Self::Compose { draft: false } => "Could not send the message",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn covers(m: Mutation, key: &QueryKey) -> bool {
    m.invalidates().iter().any(|prefix| key.starts_with(prefix))
  }

  #[test]
  fn attendance_writes_cover_every_attendance_view() {
    let team_month = QueryKey::new(family::ATTENDANCE).with("team").with("month").with(2025).with(1);
    assert!(covers(Mutation::ClockIn, &team_month));
    assert!(covers(Mutation::ClockOut, &QueryKey::new(family::ATTENDANCE).with("today")));
    assert!(!covers(Mutation::ClockIn, &QueryKey::new(family::EVENTS)));
  }

  #[test]
  fn participant_status_also_touches_event_lists() {
    let event = Uuid::new_v4();
    let mine = QueryKey::new(family::PARTICIPANTS).with(event).with("mine");
    let other = QueryKey::new(family::PARTICIPANTS).with(Uuid::new_v4());
    assert!(covers(Mutation::SetParticipantStatus(event), &mine));
    assert!(covers(Mutation::SetParticipantStatus(event), &QueryKey::new(family::EVENTS)));
    assert!(!covers(Mutation::AddParticipants(event), &QueryKey::new(family::EVENTS)));
    assert!(!covers(Mutation::AddParticipants(event), &other));
  }

  #[test]
  fn message_writes_refresh_unread_count() {
    for m in [Mutation::SetRead, Mutation::MoveToTrash, Mutation::Restore, Mutation::DeletePermanently] {
      assert!(covers(m, &QueryKey::new(family::UNREAD_COUNT)), "{m:?}");
      assert!(covers(m, &QueryKey::new(family::MESSAGE).with(Uuid::new_v4())), "{m:?}");
    }
  }

  #[test]
  fn event_update_covers_its_detail_only() {
    let id = Uuid::new_v4();
    assert!(covers(Mutation::UpdateEvent(id), &QueryKey::new(family::EVENT).with(id)));
    assert!(!covers(Mutation::UpdateEvent(id), &QueryKey::new(family::EVENT).with(Uuid::new_v4())));
  }
}
