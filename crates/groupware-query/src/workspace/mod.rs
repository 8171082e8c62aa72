//! [`Workspace`]: every read and write of the application, on behalf of one
//! principal.
//!
//! Reads go through the [`QueryClient`] cache with a freshness window chosen
//! per query family (see [`freshness`]). Writes go straight to the store,
//! then invalidate whatever the [`Mutation`] says they touched and report the
//! outcome to the [`Notifier`]. Flag toggles on messages are applied to the
//! cached lists optimistically before the write is sent.

mod mutations;
mod queries;

use std::sync::Arc;

use chrono::NaiveDate;
use groupware_core::{
  clock::{Clock, SystemClock},
  profile::Principal,
  store::GroupwareStore,
};

pub use self::queries::freshness;
use crate::{
  Result,
  cache::QueryClient,
  invalidation::Mutation,
  notify::{Notification, Notifier, TracingNotifier},
};

pub struct Workspace<S> {
  store:     Arc<S>,
  client:    QueryClient,
  principal: Principal,
  clock:     Arc<dyn Clock>,
  notifier:  Arc<dyn Notifier>,
}

impl<S> Clone for Workspace<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      client:    self.client.clone(),
      principal: self.principal,
      clock:     self.clock.clone(),
      notifier:  self.notifier.clone(),
    }
  }
}

impl<S: GroupwareStore + 'static> Workspace<S> {
  pub fn new(store: S, principal: Principal) -> Self { Self::shared(Arc::new(store), principal) }

  /// A workspace over a store that is also used elsewhere.
  pub fn shared(store: Arc<S>, principal: Principal) -> Self {
    Self {
      store,
      client: QueryClient::default(),
      principal,
      clock: Arc::new(SystemClock),
      notifier: Arc::new(TracingNotifier),
    }
  }

  /// Share a cache with other workspaces.
  pub fn with_client(mut self, client: QueryClient) -> Self {
    self.client = client;
    self
  }

  /// The clock that decides what "today" and "this week" mean for keys.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
    self.notifier = Arc::new(notifier);
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn client(&self) -> &QueryClient { &self.client }

  pub fn principal(&self) -> Principal { self.principal }

  fn today(&self) -> NaiveDate { self.clock.today() }

  /// Invalidate on success and tell the user either way.
  fn settle<T>(&self, mutation: Mutation, outcome: &Result<T>) {
    match outcome {
      Ok(_) => {
        for prefix in mutation.invalidates() {
          self.client.invalidate(&prefix);
        }
        tracing::debug!(?mutation, "mutation settled");
        self.notifier.notify(Notification::success(mutation.success_message()));
      }
      Err(err) => {
        tracing::warn!(?mutation, error = %err, "mutation failed");
        self
          .notifier
          .notify(Notification::error(format!("{}: {err}", mutation.failure_message())));
      }
    }
  }
}
