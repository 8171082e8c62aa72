//! Handlers for `/messages` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/messages` | Query: [`MessageFilter`] fields; caller's messages, newest first |
//! | `POST`   | `/messages` | Body: [`NewMessage`]; returns 201 |
//! | `GET`    | `/messages/unread-count` | Caller's unread inbox by service |
//! | `PATCH`  | `/messages/flags` | Body: [`FlagUpdate`]; returns the updated messages |
//! | `GET`    | `/messages/{id}` | 404 if not found |
//! | `DELETE` | `/messages/{id}/permanent` | Hard delete; returns [`Removed`] |
//!
//! Every by-id endpoint only sees the caller's own messages. Anyone else's
//! message is treated as missing.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use groupware_core::{
  filter::MessageFilter,
  message::{Message, NewMessage, UnreadCount},
  store::{GroupwareStore, owned_message, owned_message_ids},
};
use uuid::Uuid;

use crate::{
  caller::Caller,
  error::ApiError,
  wire::{FlagUpdate, Removed},
};

/// `GET /messages[?service=..][&view=..][&recipient=..][&search=..][&label_id=..]`
pub async fn list<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(filter): Query<MessageFilter>,
) -> Result<Json<Vec<Message>>, ApiError> {
  let messages = store
    .list_messages(caller.user_id, &filter)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(messages))
}

/// `POST /messages`: send, or save a draft when `draft` is true.
pub async fn create<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<NewMessage>,
) -> Result<impl IntoResponse, ApiError> {
  let message = store
    .create_message(caller.user_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /messages/unread-count`
pub async fn unread_count<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
) -> Result<Json<UnreadCount>, ApiError> {
  let count = store.unread_count(caller.user_id).await.map_err(ApiError::from_store)?;
  Ok(Json(count))
}

/// `PATCH /messages/flags`: ids the caller does not own are skipped.
pub async fn update_flags<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<FlagUpdate>,
) -> Result<Json<Vec<Message>>, ApiError> {
  let ids = owned_message_ids(store.as_ref(), caller.user_id, &body.ids)
    .await
    .map_err(ApiError::from_store)?;
  let updated = store
    .update_flags(&ids, body.patch)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(updated))
}

/// `GET /messages/{id}`
pub async fn get_one<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
  let message = owned_message(store.as_ref(), caller.user_id, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("message {id} not found")))?;
  Ok(Json(message))
}

/// `DELETE /messages/{id}/permanent`
pub async fn delete_permanently<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Removed>, ApiError> {
  let owned = owned_message(store.as_ref(), caller.user_id, id)
    .await
    .map_err(ApiError::from_store)?;
  if owned.is_none() {
    return Ok(Json(Removed { removed: false }));
  }
  let removed = store.delete_message(id).await.map_err(ApiError::from_store)?;
  Ok(Json(Removed { removed }))
}
