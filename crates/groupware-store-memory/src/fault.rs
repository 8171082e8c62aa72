//! Simulated latency and fault injection.

use std::{
  sync::atomic::{AtomicUsize, Ordering},
  time::Duration,
};

/// Delay applied before every read or write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
  pub read:  Duration,
  pub write: Duration,
}

impl Latency {
  pub const fn none() -> Self { Self { read: Duration::ZERO, write: Duration::ZERO } }

  /// Round-trip times of a typical hosted backend.
  pub const fn simulated() -> Self {
    Self { read: Duration::from_millis(200), write: Duration::from_millis(300) }
  }
}

pub(crate) async fn pause(delay: Duration) {
  if !delay.is_zero() {
    tokio::time::sleep(delay).await;
  }
}

/// Counters of calls that should fail before the store behaves again.
#[derive(Debug, Default)]
pub(crate) struct Faults {
  reads:  AtomicUsize,
  writes: AtomicUsize,
}

impl Faults {
  pub fn fail_reads(&self, n: usize) { self.reads.store(n, Ordering::SeqCst); }

  pub fn fail_writes(&self, n: usize) { self.writes.store(n, Ordering::SeqCst); }

  /// Consume one pending read failure, if any.
  pub fn take_read(&self) -> bool { take(&self.reads) }

  pub fn take_write(&self) -> bool { take(&self.writes) }
}

fn take(counter: &AtomicUsize) -> bool {
  counter
    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
    .is_ok()
}
