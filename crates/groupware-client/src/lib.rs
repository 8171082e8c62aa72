//! [`HttpStore`]: a [`groupware_core::store::GroupwareStore`] that talks to
//! the JSON REST API served by `groupware-server`.
//!
//! Domain errors returned by the server are decoded back into
//! [`groupware_core::Error`], so callers see the same failures they would
//! from an in-process store.

pub mod error;
pub mod store;

pub use error::{Error, Result};
pub use store::HttpStore;
