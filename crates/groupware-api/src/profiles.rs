//! Handlers for `/profiles`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use groupware_core::{profile::Profile, store::GroupwareStore};
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError};

/// `GET /profiles`
pub async fn list<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(_): Caller,
) -> Result<Json<Vec<Profile>>, ApiError> {
  let profiles = store.list_profiles().await.map_err(ApiError::from_store)?;
  Ok(Json(profiles))
}

/// `GET /profiles/{user_id}`
pub async fn get_one<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(_): Caller,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
  let profile = store
    .get_profile(user_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {user_id} not found")))?;
  Ok(Json(profile))
}
