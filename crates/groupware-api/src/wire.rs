//! Request and response bodies that are not domain types themselves.
//!
//! Shared with `groupware-client` so both ends agree on the shapes.

use groupware_core::{event::ParticipantStatus, message::FlagPatch};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `PATCH /messages/flags`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagUpdate {
  pub ids:   Vec<Uuid>,
  pub patch: FlagPatch,
}

/// Response to every `DELETE`: whether anything was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removed {
  pub removed: bool,
}

/// `POST /events/{id}/participants`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantIds {
  pub user_ids: Vec<Uuid>,
}

/// `PATCH /events/{id}/participants/{user_id}`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdate {
  pub status: ParticipantStatus,
}
