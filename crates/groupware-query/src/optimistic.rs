//! Optimistic cache rewrites with rollback.
//!
//! An [`Optimistic`] transaction cancels in-flight fetches under a key
//! prefix, snapshots every entry under it, and lets the caller rewrite those
//! entries to the state a pending write is expected to produce. When the
//! write settles the transaction is either committed or rolled back, and in
//! both cases the prefix is invalidated so the next read reconciles with the
//! store.

use std::{any::Any, future::Future, sync::Arc};

use crate::{Error, Result, cache::QueryClient, key::QueryKey, retry::with_retry};

#[must_use = "an optimistic transaction must be committed or rolled back"]
pub struct Optimistic<'c> {
  client:   &'c QueryClient,
  prefix:   QueryKey,
  snapshot: Vec<(QueryKey, Arc<dyn Any + Send + Sync>)>,
}

impl QueryClient {
  /// Begin an optimistic transaction over `prefix`.
  pub fn optimistic(&self, prefix: QueryKey) -> Optimistic<'_> {
    self.cancel(&prefix);
    let snapshot = self.snapshot(&prefix);
    Optimistic { client: self, prefix, snapshot }
  }

  /// Apply `patch` optimistically under `prefix`, run `write` with the
  /// client's mutation retry policy, then commit or roll back.
  pub async fn mutate_optimistic<T, V, E, P, W, Fut>(
    &self,
    prefix: QueryKey,
    patch: P,
    write: W,
  ) -> Result<V>
  where
    T: Send + Sync + 'static,
    E: Into<Error>,
    P: Fn(&T) -> T,
    W: FnMut() -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    let tx = self.optimistic(prefix);
    tx.apply(patch);
    let outcome = with_retry(self.config().mutation_retry, write).await;
    match &outcome {
      Ok(_) => tx.commit(),
      Err(err) => {
        tracing::warn!(prefix = %tx.prefix, error = %err, "optimistic write failed, rolling back");
        tx.rollback();
      }
    }
    outcome
  }
}

impl Optimistic<'_> {
  pub fn prefix(&self) -> &QueryKey { &self.prefix }

  /// Number of entries captured for rollback.
  pub fn snapshot_len(&self) -> usize { self.snapshot.len() }

  /// Rewrite every entry under the prefix that holds a `T`.
  pub fn apply<T, F>(&self, patch: F) -> usize
  where
    T: Send + Sync + 'static,
    F: Fn(&T) -> T,
  {
    self.client.update_where(&self.prefix, patch)
  }

  /// Keep the optimistic state until the refetch replaces it.
  pub fn commit(self) { self.client.invalidate(&self.prefix); }

  /// Put back every snapshotted entry.
  pub fn rollback(self) {
    self.client.restore(self.snapshot);
    self.client.invalidate(&self.prefix);
  }
}
