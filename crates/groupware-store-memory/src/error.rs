//! Error type for `groupware-store-memory`.

use groupware_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] groupware_core::Error),

  #[error("fixture error: {0}")]
  Fixture(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl StoreError for Error {
  fn domain(&self) -> Option<&groupware_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      Self::Fixture(_) | Self::Io(_) => None,
    }
  }

  fn is_transient(&self) -> bool {
    match self {
      Self::Core(e) => e.is_transient(),
      Self::Fixture(_) | Self::Io(_) => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
