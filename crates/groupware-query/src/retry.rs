//! Retry with exponential backoff.

use std::{future::Future, time::Duration};

use crate::{Error, Result};

const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt` (zero-based): 1s, 2s, 4s, capped at
/// 30s.
pub(crate) fn backoff(attempt: u32) -> Duration {
  BASE_DELAY
    .checked_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    .map_or(MAX_DELAY, |d| d.min(MAX_DELAY))
}

/// Run `op` until it succeeds, fails with a non-transient error, or has been
/// retried `retries` times.
pub(crate) async fn with_retry<T, E, F, Fut>(retries: u32, mut op: F) -> Result<T>
where
  E: Into<Error>,
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
{
  let mut attempt = 0;
  loop {
    match op().await.map_err(Into::into) {
      Ok(value) => return Ok(value),
      Err(err) if attempt < retries && err.is_transient() => {
        let delay = backoff(attempt);
        tracing::debug!(attempt, ?delay, error = %err, "retrying after transient error");
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(err) => return Err(err),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  #[test]
  fn backoff_doubles_and_caps() {
    assert_eq!(backoff(0), Duration::from_secs(1));
    assert_eq!(backoff(1), Duration::from_secs(2));
    assert_eq!(backoff(3), Duration::from_secs(8));
    assert_eq!(backoff(5), MAX_DELAY);
    assert_eq!(backoff(40), MAX_DELAY);
  }

  #[tokio::test(start_paused = true)]
  async fn transient_errors_are_retried() {
    let calls = &AtomicU32::new(0);
    let out = with_retry(1, move || async move {
      if calls.fetch_add(1, Ordering::SeqCst) == 0 {
        Err(groupware_core::Error::Unavailable("flaky".into()))
      } else {
        Ok(7)
      }
    })
    .await;
    assert_eq!(out.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn domain_errors_fail_immediately() {
    let calls = &AtomicU32::new(0);
    let out: Result<()> = with_retry(3, move || async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Err(groupware_core::Error::InvalidTimeRange)
    })
    .await;
    assert!(out.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn retries_are_bounded() {
    let calls = &AtomicU32::new(0);
    let out: Result<()> = with_retry(2, move || async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Err(groupware_core::Error::Unavailable("down".into()))
    })
    .await;
    assert!(out.unwrap_err().is_transient());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }
}
