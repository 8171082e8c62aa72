//! In-memory view state.
//!
//! These stores hold what the screen is showing, not what the backend holds.
//! Each wraps a [`tokio::sync::watch`] channel: actions modify the state in
//! place and every subscriber sees the change.

mod mail;
mod session;

pub use self::{
  mail::{MailState, MailStore},
  session::{SessionState, SessionStore},
};
