//! Initial table contents.
//!
//! A [`Seed`] is plain JSON: one array per table, every array optional. The
//! bundled demo data set lives in `fixtures/demo.json`.

use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

use groupware_core::{
  attendance::Attendance,
  event::{Event, EventParticipant},
  message::{Label, Message, MessageLabel},
  profile::Profile,
};

use crate::Result;

const DEMO_JSON: &str = include_str!("../fixtures/demo.json");

/// The user the demo data set is centred on. Holds the manager role.
pub const DEMO_USER_ID: Uuid = Uuid::from_u128(0x00000000_0000_4000_8000_000000000001);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
  pub profiles:           Vec<Profile>,
  pub messages:           Vec<Message>,
  pub labels:             Vec<Label>,
  pub message_labels:     Vec<MessageLabel>,
  pub attendances:        Vec<Attendance>,
  pub events:             Vec<Event>,
  pub event_participants: Vec<EventParticipant>,
}

impl Seed {
  /// The bundled demo data set.
  pub fn demo() -> Result<Self> { Self::from_json(DEMO_JSON) }

  pub fn from_json(json: &str) -> Result<Self> { Ok(serde_json::from_str(json)?) }

  pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let json = tokio::fs::read_to_string(path).await?;
    Self::from_json(&json)
  }
}
