//! [`QueryClient`]: a keyed cache of asynchronously fetched values.
//!
//! Every entry carries the time its data was last written. A read inside the
//! entry's freshness window is served from memory; a read after it returns
//! the cached data marked stale and refreshes the entry in the background; a
//! read of a missing or invalidated entry waits for a fetch.
//!
//! Concurrent readers of one key share a single fetch: each entry owns an
//! async lock that is held while a fetch is running.

use std::{
  any::Any,
  collections::HashMap,
  future::Future,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use tokio::{
  sync::{Mutex as FetchLock, broadcast},
  task::JoinHandle,
  time::Instant,
};

use crate::{Error, Result, key::QueryKey, retry::with_retry};

type Value = Arc<dyn Any + Send + Sync>;

const EVENT_CAPACITY: usize = 256;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Client-wide defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
  /// How long fetched data counts as fresh.
  pub stale_time:     Duration,
  /// How long an unread entry survives [`QueryClient::gc`].
  pub gc_time:        Duration,
  /// Extra attempts for a failing query.
  pub retry:          u32,
  /// Extra attempts for a failing mutation.
  pub mutation_retry: u32,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      stale_time:     Duration::from_secs(60),
      gc_time:        Duration::from_secs(5 * 60),
      retry:          1,
      mutation_retry: 1,
    }
  }
}

/// Per-query overrides of [`ClientConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
  pub stale_time: Option<Duration>,
  pub retry:      Option<u32>,
  /// A disabled query never fetches and reports [`QueryStatus::Idle`].
  pub enabled:    bool,
}

impl Default for QueryOptions {
  fn default() -> Self { Self { stale_time: None, retry: None, enabled: true } }
}

impl QueryOptions {
  pub fn stale_for(stale_time: Duration) -> Self {
    Self { stale_time: Some(stale_time), ..Self::default() }
  }

  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Never fetched, or disabled.
  Idle,
  /// First fetch in flight.
  Loading,
  Success,
  Error,
}

/// What a reader sees: status, the data if any, the last error, and whether
/// the data is past its freshness window.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
  pub status:   QueryStatus,
  pub data:     Option<Arc<T>>,
  pub error:    Option<Error>,
  pub is_stale: bool,
}

impl<T> QueryResult<T> {
  pub fn idle() -> Self { Self { status: QueryStatus::Idle, data: None, error: None, is_stale: false } }

  pub fn success(data: Arc<T>, is_stale: bool) -> Self {
    Self { status: QueryStatus::Success, data: Some(data), error: None, is_stale }
  }

  /// A failed fetch. `data` is whatever the cache held before.
  pub fn failure(error: Error, data: Option<Arc<T>>) -> Self {
    Self { status: QueryStatus::Error, is_stale: data.is_some(), data, error: Some(error) }
  }

  pub fn is_idle(&self) -> bool { self.status == QueryStatus::Idle }

  pub fn is_success(&self) -> bool { self.status == QueryStatus::Success }

  pub fn is_error(&self) -> bool { self.status == QueryStatus::Error }

  pub fn data(&self) -> Option<&T> { self.data.as_deref() }

  /// Derive a value from the data, keeping status and error.
  pub fn map<U>(self, f: impl FnOnce(&T) -> U) -> QueryResult<U> {
    QueryResult {
      status:   self.status,
      data:     self.data.as_deref().map(|d| Arc::new(f(d))),
      error:    self.error,
      is_stale: self.is_stale,
    }
  }

  /// The data on success, the error on failure, `None` when idle.
  pub fn into_result(self) -> Result<Option<Arc<T>>> {
    match self.error {
      Some(err) if self.status == QueryStatus::Error => Err(err),
      _ => Ok(self.data),
    }
  }
}

/// Broadcast on every change to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
  Updated(QueryKey),
  Invalidated(QueryKey),
  Removed(QueryKey),
}

// ─── Entries ─────────────────────────────────────────────────────────────────

struct Entry {
  data:        Option<Value>,
  error:       Option<Error>,
  status:      QueryStatus,
  updated_at:  Option<Instant>,
  last_used:   Instant,
  invalidated: bool,
  /// Bumped by cancellation; a fetch that started under an older generation
  /// must not write its result.
  generation:  u64,
  fetch_lock:  Arc<FetchLock<()>>,
}

impl Entry {
  fn new(now: Instant) -> Self {
    Self {
      data:        None,
      error:       None,
      status:      QueryStatus::Idle,
      updated_at:  None,
      last_used:   now,
      invalidated: false,
      generation:  0,
      fetch_lock:  Arc::default(),
    }
  }

  fn is_fetching(&self) -> bool { self.fetch_lock.try_lock().is_err() }
}

enum Lookup {
  Fresh(Value),
  Stale(Value),
  Missing,
}

fn typed<T: Send + Sync + 'static>(key: &QueryKey, value: Value, is_stale: bool) -> QueryResult<T> {
  match value.downcast::<T>() {
    Ok(data) => QueryResult::success(data, is_stale),
    Err(_) => QueryResult::failure(Error::TypeMismatch { key: key.clone() }, None),
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// A shared query cache. Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<Inner>,
}

struct Inner {
  config:  ClientConfig,
  entries: Mutex<HashMap<QueryKey, Entry>>,
  events:  broadcast::Sender<CacheEvent>,
}

impl Default for QueryClient {
  fn default() -> Self { Self::new(ClientConfig::default()) }
}

impl QueryClient {
  pub fn new(config: ClientConfig) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self { inner: Arc::new(Inner { config, entries: Mutex::default(), events }) }
  }

  pub fn config(&self) -> &ClientConfig { &self.inner.config }

  pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> { self.inner.events.subscribe() }

  fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
    self.inner.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn emit(&self, event: CacheEvent) {
    // No subscribers is fine.
    let _ = self.inner.events.send(event);
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Read `key`, fetching with `fetcher` as the entry's state requires.
  pub async fn fetch<T, E, F, Fut>(
    &self,
    key: QueryKey,
    options: QueryOptions,
    fetcher: F,
  ) -> QueryResult<T>
  where
    T: Send + Sync + 'static,
    E: Into<Error>,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    if !options.enabled {
      return QueryResult::idle();
    }
    let stale_time = options.stale_time.unwrap_or(self.inner.config.stale_time);
    let retry = options.retry.unwrap_or(self.inner.config.retry);

    match self.lookup(&key, stale_time) {
      Lookup::Fresh(value) => typed(&key, value, false),
      Lookup::Stale(value) => {
        self.refetch_in_background(key.clone(), retry, fetcher);
        typed(&key, value, true)
      }
      Lookup::Missing => self.fetch_now(key, stale_time, retry, &fetcher).await,
    }
  }

  fn lookup(&self, key: &QueryKey, stale_time: Duration) -> Lookup {
    let now = Instant::now();
    let mut entries = self.entries();
    let Some(entry) = entries.get_mut(key) else {
      return Lookup::Missing;
    };
    entry.last_used = now;
    let Some(value) = entry.data.clone() else {
      return Lookup::Missing;
    };
    if entry.invalidated {
      return Lookup::Missing;
    }
    match entry.updated_at {
      Some(at) if now.duration_since(at) < stale_time => Lookup::Fresh(value),
      _ => Lookup::Stale(value),
    }
  }

  async fn fetch_now<T, E, F, Fut>(
    &self,
    key: QueryKey,
    stale_time: Duration,
    retry: u32,
    fetcher: &F,
  ) -> QueryResult<T>
  where
    T: Send + Sync + 'static,
    E: Into<Error>,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let lock = self.fetch_lock(&key);
    let _guard = lock.lock().await;
    // Another reader may have filled the entry while we waited.
    if let Lookup::Fresh(value) = self.lookup(&key, stale_time) {
      return typed(&key, value, false);
    }

    let generation = self.begin_fetch(&key);
    let outcome = with_retry(retry, fetcher).await;
    self.complete_fetch(&key, generation, outcome.map(Arc::new))
  }

  fn refetch_in_background<T, E, F, Fut>(&self, key: QueryKey, retry: u32, fetcher: F)
  where
    T: Send + Sync + 'static,
    E: Into<Error>,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    let Ok(guard) = self.fetch_lock(&key).try_lock_owned() else {
      return;
    };
    tracing::debug!(%key, "refetching stale entry");
    let client = self.clone();
    tokio::spawn(async move {
      let _guard = guard;
      let generation = client.begin_fetch(&key);
      let outcome = with_retry(retry, &fetcher).await;
      client.complete_fetch(&key, generation, outcome.map(Arc::new));
    });
  }

  fn fetch_lock(&self, key: &QueryKey) -> Arc<FetchLock<()>> {
    let mut entries = self.entries();
    let entry = entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(Instant::now()));
    entry.fetch_lock.clone()
  }

  fn begin_fetch(&self, key: &QueryKey) -> u64 {
    let mut entries = self.entries();
    let entry = entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(Instant::now()));
    if entry.data.is_none() {
      entry.status = QueryStatus::Loading;
    }
    entry.generation
  }

  fn complete_fetch<T: Send + Sync + 'static>(
    &self,
    key: &QueryKey,
    generation: u64,
    outcome: Result<Arc<T>>,
  ) -> QueryResult<T> {
    let mut entries = self.entries();
    let Some(entry) = entries.get_mut(key).filter(|e| e.generation == generation) else {
      tracing::debug!(%key, "discarding result of cancelled fetch");
      return match outcome {
        Ok(data) => QueryResult::success(data, true),
        Err(err) => QueryResult::failure(err, None),
      };
    };

    match outcome {
      Ok(data) => {
        entry.data = Some(data.clone() as Value);
        entry.error = None;
        entry.status = QueryStatus::Success;
        entry.updated_at = Some(Instant::now());
        entry.invalidated = false;
        drop(entries);
        self.emit(CacheEvent::Updated(key.clone()));
        QueryResult::success(data, false)
      }
      Err(err) => {
        tracing::warn!(%key, error = %err, "query failed");
        entry.error = Some(err.clone());
        entry.status = QueryStatus::Error;
        let previous = entry.data.clone().and_then(|v| v.downcast::<T>().ok());
        QueryResult::failure(err, previous)
      }
    }
  }

  // ── Direct access ─────────────────────────────────────────────────────────

  /// The cached data under `key`, if present and of type `T`.
  pub fn get_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
    let entries = self.entries();
    entries.get(key)?.data.clone()?.downcast::<T>().ok()
  }

  /// Write `value` under `key` as freshly fetched data.
  pub fn set_data<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
    let now = Instant::now();
    {
      let mut entries = self.entries();
      let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(now));
      entry.data = Some(Arc::new(value) as Value);
      entry.error = None;
      entry.status = QueryStatus::Success;
      entry.updated_at = Some(now);
      entry.invalidated = false;
    }
    self.emit(CacheEvent::Updated(key));
  }

  pub fn status(&self, key: &QueryKey) -> QueryStatus {
    self.entries().get(key).map_or(QueryStatus::Idle, |e| e.status)
  }

  pub fn is_invalidated(&self, key: &QueryKey) -> bool {
    self.entries().get(key).is_some_and(|e| e.invalidated)
  }

  pub fn len(&self) -> usize { self.entries().len() }

  pub fn is_empty(&self) -> bool { self.entries().is_empty() }

  // ── Prefix operations ─────────────────────────────────────────────────────

  /// Mark every entry under `prefix` for refetch on its next read.
  pub fn invalidate(&self, prefix: &QueryKey) -> usize {
    let keys: Vec<QueryKey> = {
      let mut entries = self.entries();
      entries
        .iter_mut()
        .filter(|(key, _)| key.starts_with(prefix))
        .map(|(key, entry)| {
          entry.invalidated = true;
          key.clone()
        })
        .collect()
    };
    tracing::debug!(%prefix, count = keys.len(), "invalidated");
    let count = keys.len();
    for key in keys {
      self.emit(CacheEvent::Invalidated(key));
    }
    count
  }

  /// Discard the results of fetches in flight under `prefix`.
  pub fn cancel(&self, prefix: &QueryKey) -> usize {
    let mut entries = self.entries();
    let mut count = 0;
    for entry in entries
      .iter_mut()
      .filter(|(key, _)| key.starts_with(prefix))
      .map(|(_, entry)| entry)
    {
      entry.generation += 1;
      count += 1;
    }
    count
  }

  /// Drop every entry under `prefix`.
  pub fn remove(&self, prefix: &QueryKey) -> usize {
    let removed: Vec<QueryKey> = {
      let mut entries = self.entries();
      let keys: Vec<QueryKey> = entries.keys().filter(|k| k.starts_with(prefix)).cloned().collect();
      for key in &keys {
        entries.remove(key);
      }
      keys
    };
    let count = removed.len();
    for key in removed {
      self.emit(CacheEvent::Removed(key));
    }
    count
  }

  pub fn clear(&self) { self.entries().clear(); }

  /// Drop entries nobody has read for `gc_time`. Entries with a fetch in
  /// flight are kept.
  pub fn gc(&self) -> usize {
    let now = Instant::now();
    let gc_time = self.inner.config.gc_time;
    let removed: Vec<QueryKey> = {
      let mut entries = self.entries();
      let expired: Vec<QueryKey> = entries
        .iter()
        .filter(|(_, e)| now.duration_since(e.last_used) >= gc_time && !e.is_fetching())
        .map(|(key, _)| key.clone())
        .collect();
      for key in &expired {
        entries.remove(key);
      }
      expired
    };
    if !removed.is_empty() {
      tracing::debug!(count = removed.len(), "collected unused entries");
    }
    let count = removed.len();
    for key in removed {
      self.emit(CacheEvent::Removed(key));
    }
    count
  }

  /// Run [`Self::gc`] every `gc_time` until the last client handle is
  /// dropped.
  pub fn spawn_gc(&self) -> JoinHandle<()> {
    let inner = Arc::downgrade(&self.inner);
    let period = self.inner.config.gc_time.max(Duration::from_secs(1));
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(period);
      ticker.tick().await;
      loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
          break;
        };
        QueryClient { inner }.gc();
      }
    })
  }

  // ── Optimistic support ────────────────────────────────────────────────────

  pub(crate) fn snapshot(&self, prefix: &QueryKey) -> Vec<(QueryKey, Value)> {
    self
      .entries()
      .iter()
      .filter(|(key, _)| key.starts_with(prefix))
      .filter_map(|(key, e)| Some((key.clone(), e.data.clone()?)))
      .collect()
  }

  pub(crate) fn restore(&self, snapshot: Vec<(QueryKey, Value)>) {
    let now = Instant::now();
    let keys: Vec<QueryKey> = {
      let mut entries = self.entries();
      snapshot
        .into_iter()
        .map(|(key, value)| {
          let entry = entries.entry(key.clone()).or_insert_with(|| Entry::new(now));
          entry.data = Some(value);
          entry.status = QueryStatus::Success;
          key
        })
        .collect()
    };
    for key in keys {
      self.emit(CacheEvent::Updated(key));
    }
  }

  /// Replace the data of every entry under `prefix` that holds a `T` with
  /// `f` of it. Returns how many entries were rewritten.
  pub fn update_where<T, F>(&self, prefix: &QueryKey, f: F) -> usize
  where
    T: Send + Sync + 'static,
    F: Fn(&T) -> T,
  {
    let keys: Vec<QueryKey> = {
      let mut entries = self.entries();
      entries
        .iter_mut()
        .filter(|(key, _)| key.starts_with(prefix))
        .filter_map(|(key, entry)| {
          let current = entry.data.clone()?.downcast::<T>().ok()?;
          entry.data = Some(Arc::new(f(&current)) as Value);
          Some(key.clone())
        })
        .collect()
    };
    let count = keys.len();
    for key in keys {
      self.emit(CacheEvent::Updated(key));
    }
    count
  }
}
