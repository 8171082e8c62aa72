//! Who is signed in.
//!
//! Identity is resolved elsewhere; this store only remembers the result so
//! the screen can render while the profile loads.

use std::sync::Arc;

use groupware_core::profile::{Principal, Profile};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
  pub principal:  Option<Principal>,
  pub profile:    Option<Profile>,
  /// Starts `true` until the identity check has finished.
  pub is_loading: bool,
}

impl Default for SessionState {
  fn default() -> Self { Self { principal: None, profile: None, is_loading: true } }
}

impl SessionState {
  pub fn is_authenticated(&self) -> bool { self.principal.is_some() }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
  state: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionStore {
  fn default() -> Self { Self::new() }
}

impl SessionStore {
  pub fn new() -> Self {
    let (state, _) = watch::channel(SessionState::default());
    Self { state: Arc::new(state) }
  }

  pub fn snapshot(&self) -> SessionState { self.state.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<SessionState> { self.state.subscribe() }

  pub fn is_authenticated(&self) -> bool { self.state.borrow().is_authenticated() }

  pub fn set_principal(&self, principal: Option<Principal>) {
    self.state.send_modify(|s| s.principal = principal);
  }

  pub fn set_profile(&self, profile: Option<Profile>) {
    self.state.send_modify(|s| s.profile = profile);
  }

  pub fn set_loading(&self, loading: bool) { self.state.send_modify(|s| s.is_loading = loading); }

  /// Sign out.
  pub fn reset(&self) { self.state.send_replace(SessionState::default()); }
}

#[cfg(test)]
mod tests {
  use groupware_core::profile::Role;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn authentication_follows_principal() {
    let session = SessionStore::new();
    assert!(session.snapshot().is_loading);
    assert!(!session.is_authenticated());

    session.set_principal(Some(Principal::new(Uuid::new_v4(), Role::Member)));
    session.set_loading(false);
    assert!(session.is_authenticated());
    assert!(!session.snapshot().is_loading);

    session.reset();
    assert!(!session.is_authenticated());
    assert!(session.snapshot().is_loading);
  }
}
