//! Handlers for `/attendance` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/attendance` | Query: [`AttendanceQuery`]; other users need a manager role |
//! | `GET`  | `/attendance/{user_id}/{date}` | 404 if there is no record |
//! | `POST` | `/attendance/clock-in` | Opens today's record; returns 201 |
//! | `POST` | `/attendance/clock-out` | Closes today's record |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use groupware_core::{
  attendance::{Attendance, AttendanceQuery},
  profile::Principal,
  store::GroupwareStore,
};
use uuid::Uuid;

use crate::{caller::Caller, error::ApiError};

fn require_access(caller: &Principal, user_id: Option<Uuid>) -> Result<(), ApiError> {
  if user_id != Some(caller.user_id) {
    caller.require_team_access("view team attendance")?;
  }
  Ok(())
}

/// `GET /attendance[?user_id=..][&start=..][&end=..]`
pub async fn list<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<Attendance>>, ApiError> {
  require_access(&caller, query.user_id)?;
  let records = store.list_attendance(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(records))
}

/// `GET /attendance/{user_id}/{date}`
pub async fn get_one<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Path((user_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<Attendance>, ApiError> {
  require_access(&caller, Some(user_id))?;
  let record = store
    .get_attendance(user_id, date)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("no attendance for {user_id} on {date}")))?;
  Ok(Json(record))
}

/// `POST /attendance/clock-in`
pub async fn clock_in<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
) -> Result<impl IntoResponse, ApiError> {
  let record = store.clock_in(caller.user_id).await.map_err(ApiError::from_store)?;
  tracing::info!(user_id = %caller.user_id, date = %record.work_date, "clocked in");
  Ok((StatusCode::CREATED, Json(record)))
}

/// `POST /attendance/clock-out`
pub async fn clock_out<S: GroupwareStore>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
) -> Result<Json<Attendance>, ApiError> {
  let record = store.clock_out(caller.user_id).await.map_err(ApiError::from_store)?;
  tracing::info!(user_id = %caller.user_id, date = %record.work_date, "clocked out");
  Ok(Json(record))
}
