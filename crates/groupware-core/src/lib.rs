//! Core types and trait definitions for the groupware data layer.
//!
//! No HTTP, caching or storage code lives here. All other crates depend on
//! it.

pub mod attendance;
pub mod clock;
pub mod error;
pub mod event;
pub mod filter;
pub mod message;
pub mod profile;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
