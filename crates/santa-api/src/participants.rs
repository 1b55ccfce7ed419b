//! Handlers for `/participants` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/participants` | Registration order |
//! | `PUT`  | `/participants/:id` | Body: [`RegisterBody`]; upsert |
//! | `GET`  | `/participants/:id` | 404 if not registered |
//! | `GET`  | `/participants/:id/recipient` | 404 if not registered or unassigned; marks notified |
//! | `GET`  | `/participants/:id/history` | Past receivers, newest round first |
//!
//! The path id is trusted as-is. Binding it to the caller (the chat user the
//! request came from) is the fronting chat layer's job; without that anyone
//! who knows an id can read that participant's receiver.

use axum::{
  Json,
  extract::{Path, State},
};
use santa_core::{
  event::{PastGift, Recipient},
  notify::Notifier,
  participant::{Participant, ParticipantId, Registration},
  store::SantaStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

fn parse_id(raw: String) -> Result<ParticipantId, ApiError> {
  Ok(ParticipantId::new(raw)?)
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /participants`
pub async fn list<S, N>(
  State(state): State<AppState<S, N>>,
) -> Result<Json<Vec<Participant>>, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  Ok(Json(state.santa.list_all().await?))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:     String,
  pub username: Option<String>,
  pub wish:     Option<String>,
  pub avoid:    Option<String>,
}

/// `PUT /participants/:id` — body: `{"name":"...","wish":"...","avoid":"..."}`
pub async fn register<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<String>,
  Json(body): Json<RegisterBody>,
) -> Result<Json<Participant>, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  let input = Registration {
    participant_id: id,
    name:           body.name,
    username:       body.username,
    wish:           body.wish,
    avoid:          body.avoid,
  };
  Ok(Json(state.santa.register(input).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /participants/:id`
pub async fn get_one<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<String>,
) -> Result<Json<Participant>, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  let id = parse_id(id)?;
  Ok(Json(state.santa.get_participant(&id).await?))
}

// ─── Recipient ────────────────────────────────────────────────────────────────

/// `GET /participants/:id/recipient`
///
/// Showing a giver their recipient counts as notifying them.
pub async fn recipient<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<String>,
) -> Result<Json<Recipient>, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  let id = parse_id(id)?;
  let recipient = state
    .santa
    .reveal_receiver(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("participant {id} has no recipient assigned")))?;

  Ok(Json(recipient))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /participants/:id/history`
pub async fn history<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<PastGift>>, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  let id = parse_id(id)?;
  Ok(Json(state.santa.history_for(&id).await?))
}
