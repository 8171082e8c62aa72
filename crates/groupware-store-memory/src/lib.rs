//! In-memory backend for the groupware store.
//!
//! Holds every table behind a single [`tokio::sync::RwLock`]. Optional
//! simulated latency and injected faults make it usable as a stand-in for a
//! remote backend in tests and demos.

mod fault;
mod seed;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use fault::Latency;
pub use seed::{DEMO_USER_ID, Seed};
pub use store::MemoryStore;
