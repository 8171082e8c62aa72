//! Handlers for labels and message/label links.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/labels` | Caller's labels by `sort_order` |
//! | `POST`   | `/labels` | Body: [`NewLabel`]; returns 201 |
//! | `PATCH`  | `/labels/{id}` | Body: [`LabelPatch`] |
//! | `DELETE` | `/labels/{id}` | Also unlinks every message |
//! | `GET`    | `/messages/{id}/labels` | Labels on one message |
//! | `PUT`    | `/messages/{id}/labels/{label_id}` | Idempotent link |
//! | `DELETE` | `/messages/{id}/labels/{label_id}` | Unlink |
//!
//! Labels and messages owned by someone else read as missing.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use groupware_core::{
  Error,
  message::{Label, LabelPatch, MessageLabel, NewLabel},
  store::{GroupwareStore, owned_label, owned_message},
};
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError, wire::Removed};

// ─── Labels ───────────────────────────────────────────────────────────────────

/// `GET /labels`
pub async fn list<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
) -> Result<Json<Vec<Label>>, ApiError> {
  let labels = store.list_labels(caller.user_id).await.map_err(ApiError::from_store)?;
  Ok(Json(labels))
}

/// `POST /labels`
pub async fn create<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(body): Json<NewLabel>,
) -> Result<impl IntoResponse, ApiError> {
  let label = store
    .create_label(caller.user_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(label)))
}

/// `PATCH /labels/{id}`
pub async fn update<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<Uuid>,
  Json(patch): Json<LabelPatch>,
) -> Result<Json<Label>, ApiError> {
  owned_label(store.as_ref(), caller.user_id, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Error::LabelNotFound(id))?;
  let label = store.update_label(id, patch).await.map_err(ApiError::from_store)?;
  Ok(Json(label))
}

/// `DELETE /labels/{id}`
pub async fn remove<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<Removed>, ApiError> {
  let owned = owned_label(store.as_ref(), caller.user_id, id)
    .await
    .map_err(ApiError::from_store)?;
  if owned.is_none() {
    return Ok(Json(Removed { removed: false }));
  }
  let removed = store.delete_label(id).await.map_err(ApiError::from_store)?;
  Ok(Json(Removed { removed }))
}

// ─── Links ────────────────────────────────────────────────────────────────────

/// `GET /messages/{id}/labels`
pub async fn for_message<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path(message_id): Path<Uuid>,
) -> Result<Json<Vec<Label>>, ApiError> {
  let owned = owned_message(store.as_ref(), caller.user_id, message_id)
    .await
    .map_err(ApiError::from_store)?;
  if owned.is_none() {
    return Ok(Json(Vec::new()));
  }
  let labels = store.message_labels(message_id).await.map_err(ApiError::from_store)?;
  Ok(Json(labels))
}

/// `PUT /messages/{id}/labels/{label_id}`
pub async fn assign<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path((message_id, label_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageLabel>, ApiError> {
  owned_message(store.as_ref(), caller.user_id, message_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Error::MessageNotFound(message_id))?;
  owned_label(store.as_ref(), caller.user_id, label_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(Error::LabelNotFound(label_id))?;
  let link = store
    .assign_label(message_id, label_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(link))
}

/// `DELETE /messages/{id}/labels/{label_id}`
pub async fn unassign<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path((message_id, label_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Removed>, ApiError> {
  let message = owned_message(store.as_ref(), caller.user_id, message_id)
    .await
    .map_err(ApiError::from_store)?;
  let label = owned_label(store.as_ref(), caller.user_id, label_id)
    .await
    .map_err(ApiError::from_store)?;
  if message.is_none() || label.is_none() {
    return Ok(Json(Removed { removed: false }));
  }
  let removed = store
    .unassign_label(message_id, label_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Removed { removed }))
}
