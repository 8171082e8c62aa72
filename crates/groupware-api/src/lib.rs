//! JSON REST API for the groupware backend.
//!
//! Exposes an axum [`Router`] backed by any
//! [`groupware_core::store::GroupwareStore`]. Every request runs as the
//! [`caller::Caller`] named by the identity proxy headers; TLS and sign-in
//! happen upstream.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", groupware_api::api_router(store.clone()))
//! ```

pub mod attendance;
pub mod caller;
pub mod error;
pub mod events;
pub mod labels;
pub mod messages;
pub mod profiles;
pub mod wire;


use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch, post, put},
};
use groupware_core::store::GroupwareStore;

pub use caller::{Caller, USER_ID_HEADER, USER_ROLE_HEADER};
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: GroupwareStore + 'static,
{
  Router::new()
    // Messages
    .route("/messages", get(messages::list::<S>).post(messages::create::<S>))
    .route("/messages/unread-count", get(messages::unread_count::<S>))
    .route("/messages/flags", patch(messages::update_flags::<S>))
    .route("/messages/{id}", get(messages::get_one::<S>))
    .route("/messages/{id}/permanent", delete(messages::delete_permanently::<S>))
    .route("/messages/{id}/labels", get(labels::for_message::<S>))
    .route(
      "/messages/{id}/labels/{label_id}",
      put(labels::assign::<S>).delete(labels::unassign::<S>),
    )
    // Labels
    .route("/labels", get(labels::list::<S>).post(labels::create::<S>))
    .route("/labels/{id}", patch(labels::update::<S>).delete(labels::remove::<S>))
    // Attendance
    .route("/attendance", get(attendance::list::<S>))
    .route("/attendance/clock-in", post(attendance::clock_in::<S>))
    .route("/attendance/clock-out", post(attendance::clock_out::<S>))
    .route("/attendance/{user_id}/{date}", get(attendance::get_one::<S>))
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route(
      "/events/{id}",
      get(events::get_one::<S>).patch(events::update::<S>).delete(events::remove::<S>),
    )
    .route(
      "/events/{id}/participants",
      get(events::participants::<S>).post(events::add_participants::<S>),
    )
    .route(
      "/events/{id}/participants/{user_id}",
      get(events::participant::<S>)
        .patch(events::set_status::<S>)
        .delete(events::remove_participant::<S>),
    )
    // Profiles
    .route("/profiles", get(profiles::list::<S>))
    .route("/profiles/{user_id}", get(profiles::get_one::<S>))
    .with_state(store)
}
