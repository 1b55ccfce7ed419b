//! JSON HTTP API for a Secret Santa event.
//!
//! Exposes an axum [`Router`] backed by a [`SecretSanta`] over any
//! [`SantaStore`]. Participant routes are open; routes that run, reset or
//! notify require the administrator (see [`auth`]). TLS and message delivery
//! are the caller's responsibility.
//!
//! Participant routes take the participant id from the path and do not check
//! who is asking. The chat front end in front of this service must
//! authenticate its user and only forward requests for that user's own id,
//! since `/participants/{id}/recipient` reveals a secret assignment.

pub mod auth;
pub mod draw;
pub mod error;
pub mod participants;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use santa_core::{SecretSanta, notify::Notifier, store::SantaStore};
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, N> {
  pub santa:    Arc<SecretSanta<S>>,
  pub auth:     Arc<AuthConfig>,
  pub notifier: Arc<N>,
}

impl<S, N> Clone for AppState<S, N> {
  fn clone(&self) -> Self {
    Self {
      santa:    Arc::clone(&self.santa),
      auth:     Arc::clone(&self.auth),
      notifier: Arc::clone(&self.notifier),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S, N>(state: AppState<S, N>) -> Router
where
  S: SantaStore + 'static,
  N: Notifier,
{
  Router::new()
    // Participants
    .route("/participants", get(participants::list::<S, N>))
    .route(
      "/participants/{id}",
      get(participants::get_one::<S, N>).put(participants::register::<S, N>),
    )
    .route("/participants/{id}/recipient", get(participants::recipient::<S, N>))
    .route("/participants/{id}/history", get(participants::history::<S, N>))
    // Draw
    .route(
      "/draw",
      get(draw::status::<S, N>)
        .post(draw::run::<S, N>)
        .delete(draw::reset::<S, N>),
    )
    .route("/draw/pairs", get(draw::pairs::<S, N>))
    .route("/draw/notify", post(draw::notify::<S, N>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
