//! Handlers for `/events` and their participants.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | Query: [`EventFilter`] fields; ascending by start |
//! | `POST`   | `/events` | Body: [`NewEvent`]; caller becomes the owner |
//! | `GET`    | `/events/{id}` | 404 if missing or deleted |
//! | `PATCH`  | `/events/{id}` | Body: [`EventPatch`] |
//! | `DELETE` | `/events/{id}` | Soft delete |
//! | `GET`    | `/events/{id}/participants` | With profiles |
//! | `POST`   | `/events/{id}/participants` | Body: [`ParticipantIds`]; returns only new rows |
//! | `GET`    | `/events/{id}/participants/{user_id}` | 404 if not invited |
//! | `PATCH`  | `/events/{id}/participants/{user_id}` | Body: [`StatusUpdate`]; self only |
//! | `DELETE` | `/events/{id}/participants/{user_id}` | Self, or the event owner |
//!
//! Reads are visible to the whole team. Changing or deleting an event and
//! inviting people is reserved for its owner; anyone else sees
//! `event_not_found`. A participant status can only be set by that
//! participant.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use groupware_core::{
  Error,
  event::{Event, EventFilter, EventParticipant, EventPatch, NewEvent, ParticipantWithProfile},
  store::{GroupwareStore, owned_event},
};
use uuid::Uuid;

use crate::{
  caller::Caller,
  error::ApiError,
  wire::{ParticipantIds, Removed, StatusUpdate},
};

// ─── Events ───────────────────────────────────────────────────────────────────

/// `GET /events[?year=..&month=..][&start_date=..&end_date=..][&on=..]`
pub async fn list<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(_): Caller,
  Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let events = store.list_events(&filter).await.map_err(ApiError::from_store)?;
  Ok(Json(events))
}

/// `POST /events`
pub async fn create<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
  let event = store
    .create_event(caller.user_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events/{id}`
pub async fn get_one<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(_): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
  let event = store
    .get_event(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  Ok(Json(event))
}

/// `PATCH /events/{id}`
pub async fn update<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<EventPatch>,
) -> Result<Json<Event>, ApiError> {
  owned_event(store.as_ref(), caller.user_id, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Error::EventNotFound(id))?;
  let event = store.update_event(id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(event))
}

/// `DELETE /events/{id}`
pub async fn remove<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Removed>, ApiError> {
  let owned = owned_event(store.as_ref(), caller.user_id, id)
    .await
    .map_err(ApiError::from_store)?;
  if owned.is_none() {
    return Ok(Json(Removed { removed: false }));
  }
  let removed = store.delete_event(id).await.map_err(ApiError::from_store)?;
  Ok(Json(Removed { removed }))
}

// ─── Participants ─────────────────────────────────────────────────────────────

/// `GET /events/{id}/participants`
pub async fn participants<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(_): Caller,
  Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<ParticipantWithProfile>>, ApiError> {
  let participants = store.list_participants(event_id).await.map_err(ApiError::from_store)?;
  Ok(Json(participants))
}

/// `POST /events/{id}/participants`
pub async fn add_participants<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(event_id): Path<Uuid>,
  Json(body): Json<ParticipantIds>,
) -> Result<Json<Vec<EventParticipant>>, ApiError> {
  owned_event(store.as_ref(), caller.user_id, event_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Error::EventNotFound(event_id))?;
  let added = store
    .add_participants(event_id, &body.user_ids)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(added))
}

/// `GET /events/{id}/participants/{user_id}`
pub async fn participant<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(_): Caller,
  Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EventParticipant>, ApiError> {
  let participant = store
    .get_participant(event_id, user_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("{user_id} is not on event {event_id}")))?;
  Ok(Json(participant))
}

/// `PATCH /events/{id}/participants/{user_id}`
pub async fn set_status<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path((event_id, user_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<StatusUpdate>,
) -> Result<Json<EventParticipant>, ApiError> {
  caller.require_self(user_id, "respond for another user")?;
  let participant = store
    .set_participant_status(event_id, user_id, body.status)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("{user_id} is not on event {event_id}")))?;
  Ok(Json(participant))
}

/// `DELETE /events/{id}/participants/{user_id}`
pub async fn remove_participant<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Removed>, ApiError> {
  if user_id != caller.user_id {
    owned_event(store.as_ref(), caller.user_id, event_id)
      .await
      .map_err(ApiError::from_store)?
      .ok_or_else(|| caller.forbidden("remove another participant"))?;
  }
  let removed = store
    .remove_participant(event_id, user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Removed { removed }))
}
