//! Write operations.
//!
//! Every write retries transient failures with the client's mutation policy,
//! then settles: dependent cache entries are invalidated on success and the
//! outcome is reported to the notifier.
//!
//! Writes only reach records the session principal owns. Messages, labels
//! and events belonging to someone else behave as if they were missing, and
//! a participant status can only be set by that participant.

use std::future::Future;

use groupware_core::{
  attendance::Attendance,
  event::{Event, EventParticipant, EventPatch, NewEvent, ParticipantStatus},
  message::{FlagPatch, Label, LabelPatch, Message, MessageLabel, NewLabel, NewMessage},
  store::{GroupwareStore, owned_event, owned_label, owned_message, owned_message_ids},
};
use uuid::Uuid;

use super::Workspace;
use crate::{
  Error, Result,
  invalidation::Mutation,
  key::{QueryKey, family},
  retry::with_retry,
};

impl<S: GroupwareStore + 'static> Workspace<S> {
  async fn run<T, E, F, Fut>(&self, mutation: Mutation, write: F) -> Result<T>
  where
    E: Into<Error>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let outcome = with_retry(self.client.config().mutation_retry, write).await;
    self.settle(mutation, &outcome);
    outcome
  }

  /// Patch every cached message list, write, then commit or roll back.
  /// Ids the caller does not own are dropped before the write.
  async fn update_flags_optimistic(
    &self,
    mutation: Mutation,
    ids: &[Uuid],
    patch: FlagPatch,
  ) -> Result<Vec<Message>> {
    let owner = self.principal.user_id;
    let outcome = self
      .client
      .mutate_optimistic(
        QueryKey::new(family::MESSAGES),
        |list: &Vec<Message>| patched(list, ids, &patch),
        move || async move {
          let owned = owned_message_ids(self.store.as_ref(), owner, ids).await?;
          self.store.update_flags(&owned, patch).await
        },
      )
      .await;
    self.settle(mutation, &outcome);
    outcome
  }

  // ─── Attendance ────────────────────────────────────────────────────────────

  pub async fn clock_in(&self) -> Result<Attendance> {
    let user_id = self.principal.user_id;
    self.run(Mutation::ClockIn, move || self.store.clock_in(user_id)).await
  }

  pub async fn clock_out(&self) -> Result<Attendance> {
    let user_id = self.principal.user_id;
    self.run(Mutation::ClockOut, move || self.store.clock_out(user_id)).await
  }

  // ─── Events ────────────────────────────────────────────────────────────────

  /// Create an event owned by the caller.
  pub async fn create_event(&self, input: NewEvent) -> Result<Event> {
    let owner = self.principal.user_id;
    self
      .run(Mutation::CreateEvent, move || self.store.create_event(owner, input.clone()))
      .await
  }

  pub async fn update_event(&self, id: Uuid, patch: EventPatch) -> Result<Event> {
    self
      .run(Mutation::UpdateEvent(id), move || {
        let patch = patch.clone();
        async move {
          self.require_event(id).await?;
          Ok::<_, Error>(self.store.update_event(id, patch).await?)
        }
      })
      .await
  }

  pub async fn delete_event(&self, id: Uuid) -> Result<bool> {
    let owner = self.principal.user_id;
    self
      .run(Mutation::DeleteEvent(id), move || async move {
        match owned_event(self.store.as_ref(), owner, id).await? {
          Some(_) => self.store.delete_event(id).await,
          None => Ok(false),
        }
      })
      .await
  }

  pub async fn add_participants(
    &self,
    event_id: Uuid,
    user_ids: &[Uuid],
  ) -> Result<Vec<EventParticipant>> {
    self
      .run(Mutation::AddParticipants(event_id), move || async move {
        self.require_event(event_id).await?;
        Ok::<_, Error>(self.store.add_participants(event_id, user_ids).await?)
      })
      .await
  }

  /// Leave an event, or, as its owner, take someone else off it.
  pub async fn remove_participant(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
    self
      .run(Mutation::RemoveParticipant(event_id), move || async move {
        if user_id != self.principal.user_id {
          let owned = owned_event(self.store.as_ref(), self.principal.user_id, event_id).await?;
          if owned.is_none() {
            return Err(Error::Domain(self.principal.forbidden("remove another participant")));
          }
        }
        Ok::<_, Error>(self.store.remove_participant(event_id, user_id).await?)
      })
      .await
  }

  pub async fn set_participant_status(
    &self,
    event_id: Uuid,
    user_id: Uuid,
    status: ParticipantStatus,
  ) -> Result<Option<EventParticipant>> {
    self
      .run(Mutation::SetParticipantStatus(event_id), move || async move {
        self.principal.require_self(user_id, "respond for another user")?;
        Ok::<_, Error>(self.store.set_participant_status(event_id, user_id, status).await?)
      })
      .await
  }

  /// Accept or decline an invitation on the caller's behalf.
  pub async fn respond(
    &self,
    event_id: Uuid,
    status: ParticipantStatus,
  ) -> Result<Option<EventParticipant>> {
    self.set_participant_status(event_id, self.principal.user_id, status).await
  }

  // ─── Labels ────────────────────────────────────────────────────────────────

  pub async fn create_label(&self, input: NewLabel) -> Result<Label> {
    let owner = self.principal.user_id;
    self
      .run(Mutation::CreateLabel, move || self.store.create_label(owner, input.clone()))
      .await
  }

  pub async fn update_label(&self, id: Uuid, patch: LabelPatch) -> Result<Label> {
    self
      .run(Mutation::UpdateLabel, move || {
        let patch = patch.clone();
        async move {
          self.require_label(id).await?;
          Ok::<_, Error>(self.store.update_label(id, patch).await?)
        }
      })
      .await
  }

  pub async fn delete_label(&self, id: Uuid) -> Result<bool> {
    let owner = self.principal.user_id;
    self
      .run(Mutation::DeleteLabel, move || async move {
        match owned_label(self.store.as_ref(), owner, id).await? {
          Some(_) => self.store.delete_label(id).await,
          None => Ok(false),
        }
      })
      .await
  }

  pub async fn assign_label(&self, message_id: Uuid, label_id: Uuid) -> Result<MessageLabel> {
    self
      .run(Mutation::AssignLabel(message_id), move || async move {
        self.require_message(message_id).await?;
        self.require_label(label_id).await?;
        Ok::<_, Error>(self.store.assign_label(message_id, label_id).await?)
      })
      .await
  }

  pub async fn unassign_label(&self, message_id: Uuid, label_id: Uuid) -> Result<bool> {
    let owner = self.principal.user_id;
    self
      .run(Mutation::UnassignLabel(message_id), move || async move {
        let message = owned_message(self.store.as_ref(), owner, message_id).await?;
        let label = owned_label(self.store.as_ref(), owner, label_id).await?;
        if message.is_none() || label.is_none() {
          return Ok(false);
        }
        self.store.unassign_label(message_id, label_id).await
      })
      .await
  }

  // ─── Messages ──────────────────────────────────────────────────────────────

  pub async fn set_read(&self, id: Uuid, read: bool) -> Result<Vec<Message>> {
    self.update_flags_optimistic(Mutation::SetRead, &[id], FlagPatch::read(read)).await
  }

  pub async fn set_starred(&self, id: Uuid, starred: bool) -> Result<Vec<Message>> {
    self.update_flags_optimistic(Mutation::SetStarred, &[id], FlagPatch::starred(starred)).await
  }

  pub async fn bulk_set_read(&self, ids: &[Uuid], read: bool) -> Result<Vec<Message>> {
    self.update_flags_optimistic(Mutation::SetRead, ids, FlagPatch::read(read)).await
  }

  pub async fn bulk_set_starred(&self, ids: &[Uuid], starred: bool) -> Result<Vec<Message>> {
    self.update_flags_optimistic(Mutation::SetStarred, ids, FlagPatch::starred(starred)).await
  }

  /// Bulk delete: messages go to the trash, not away.
  pub async fn move_to_trash(&self, ids: &[Uuid]) -> Result<Vec<Message>> {
    self.update_flags_optimistic(Mutation::MoveToTrash, ids, FlagPatch::trash(true)).await
  }

  /// Take a message back out of the trash.
  pub async fn restore_message(&self, id: Uuid) -> Result<Message> {
    self
      .run(Mutation::Restore, move || async move {
        self.require_message(id).await?;
        let mut restored = self.store.update_flags(&[id], FlagPatch::trash(false)).await?;
        restored.pop().ok_or(Error::Domain(groupware_core::Error::MessageNotFound(id)))
      })
      .await
  }

  pub async fn delete_permanently(&self, id: Uuid) -> Result<bool> {
    let owner = self.principal.user_id;
    self
      .run(Mutation::DeletePermanently, move || async move {
        match owned_message(self.store.as_ref(), owner, id).await? {
          Some(_) => self.store.delete_message(id).await,
          None => Ok(false),
        }
      })
      .await
  }

  /// Send a message, or save it as a draft.
  pub async fn compose(&self, input: NewMessage) -> Result<Message> {
    let owner = self.principal.user_id;
    let mutation = Mutation::Compose { draft: input.draft };
    self.run(mutation, move || self.store.create_message(owner, input.clone())).await
  }
}

// ─── Ownership ────────────────────────────────────────────────────────────────

impl<S: GroupwareStore + 'static> Workspace<S> {
  async fn require_message(&self, id: Uuid) -> Result<Message> {
    owned_message(self.store.as_ref(), self.principal.user_id, id)
      .await?
      .ok_or(Error::Domain(groupware_core::Error::MessageNotFound(id)))
  }

  async fn require_label(&self, id: Uuid) -> Result<Label> {
    owned_label(self.store.as_ref(), self.principal.user_id, id)
      .await?
      .ok_or(Error::Domain(groupware_core::Error::LabelNotFound(id)))
  }

  async fn require_event(&self, id: Uuid) -> Result<Event> {
    owned_event(self.store.as_ref(), self.principal.user_id, id)
      .await?
      .ok_or(Error::Domain(groupware_core::Error::EventNotFound(id)))
  }
}

fn patched(list: &[Message], ids: &[Uuid], patch: &FlagPatch) -> Vec<Message> {
  list
    .iter()
    .cloned()
    .map(|mut message| {
      if ids.contains(&message.id) {
        message.apply_flags(patch);
      }
      message
    })
    .collect()
}
