//! The user-facing notification surface.
//!
//! Notifications are fire-and-forget; a notifier must never block or fail.

use serde::Serialize;
use strum::{AsRefStr, Display};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
  Success,
  Info,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
  pub level:   Level,
  pub message: String,
}

impl Notification {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: Level::Success, message: message.into() }
  }

  pub fn info(message: impl Into<String>) -> Self { Self { level: Level::Info, message: message.into() } }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: Level::Error, message: message.into() }
  }
}

pub trait Notifier: Send + Sync {
  fn notify(&self, notification: Notification);
}

/// Writes notifications to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, n: Notification) {
    match n.level {
      Level::Success | Level::Info => tracing::info!(level = %n.level, "{}", n.message),
      Level::Error => tracing::warn!(level = %n.level, "{}", n.message),
    }
  }
}

/// Forwards notifications to a channel, dropping them once the receiver is
/// gone.
impl Notifier for mpsc::UnboundedSender<Notification> {
  fn notify(&self, notification: Notification) { let _ = self.send(notification); }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn channel_notifier_forwards() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.notify(Notification::success("Clocked in"));
    let got = rx.try_recv().unwrap();
    assert_eq!(got.level, Level::Success);
    assert_eq!(got.message, "Clocked in");

    drop(rx);
    tx.notify(Notification::error("ignored"));
  }
}
