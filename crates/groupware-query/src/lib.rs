//! Client-side query layer for the groupware store.
//!
//! [`QueryClient`] is a keyed cache of asynchronously fetched values with
//! freshness windows, prefix invalidation and optimistic rewrites.
//! [`Workspace`] binds a client to a [`groupware_core::store::GroupwareStore`]
//! and a principal, exposing every read and write of the application.
//! [`ui`] holds the in-memory view state of the mail screen.

pub mod cache;
pub mod error;
pub mod invalidation;
pub mod key;
pub mod notify;
pub mod optimistic;
pub mod ui;
pub mod workspace;

mod retry;

pub use cache::{CacheEvent, ClientConfig, QueryClient, QueryOptions, QueryResult, QueryStatus};
pub use error::{Error, Result};
pub use invalidation::Mutation;
pub use key::QueryKey;
pub use notify::{Level, Notification, Notifier, TracingNotifier};
pub use workspace::Workspace;

#[cfg(test)]
mod tests;
