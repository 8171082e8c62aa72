//! Error types for `groupware-query`.

use std::sync::Arc;

use groupware_core::store::StoreError;
use thiserror::Error;

use crate::key::QueryKey;

/// Errors are cloned into every [`crate::QueryResult`] that observes them.
#[derive(Debug, Clone, Error)]
pub enum Error {
  #[error(transparent)]
  Domain(groupware_core::Error),

  /// A backend failure that carries no domain error (transport, decoding).
  #[error("store error: {source}")]
  Store {
    source:    Arc<dyn std::error::Error + Send + Sync>,
    transient: bool,
  },

  #[error("cached value under {key} has an unexpected type")]
  TypeMismatch { key: QueryKey },
}

/// Any backend error converts, keeping its domain error when it has one.
impl<E: StoreError> From<E> for Error {
  fn from(err: E) -> Self {
    match err.domain() {
      Some(domain) => Self::Domain(domain.clone()),
      None => Self::Store { transient: err.is_transient(), source: Arc::new(err) },
    }
  }
}

impl Error {
  /// Transient errors are retried; domain-rule violations are not.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Domain(e) => e.is_transient(),
      Self::Store { transient, .. } => *transient,
      Self::TypeMismatch { .. } => false,
    }
  }

  pub fn domain(&self) -> Option<&groupware_core::Error> {
    match self {
      Self::Domain(e) => Some(e),
      Self::Store { .. } | Self::TypeMismatch { .. } => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
