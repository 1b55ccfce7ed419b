//! Handlers for `/draw` endpoints. Everything but `GET /draw` requires the
//! administrator.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/draw` | [`EventStatus`] |
//! | `POST`   | `/draw` | Run the assignment; 409 if already done or too few participants |
//! | `DELETE` | `/draw` | Reset; participants are kept |
//! | `GET`    | `/draw/pairs` | Committed pairs in cycle order |
//! | `POST`   | `/draw/notify` | Start a background notification pass; 202 |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use santa_core::{
  event::EventStatus,
  notify::Notifier,
  pairing::Pair,
  store::{Round, SantaStore},
};
use serde_json::json;

use crate::{AppState, auth::Admin, error::ApiError};

/// `GET /draw`
pub async fn status<S, N>(
  State(state): State<AppState<S, N>>,
) -> Result<Json<EventStatus>, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  Ok(Json(state.santa.status().await?))
}

/// `POST /draw`
pub async fn run<S, N>(
  _admin: Admin,
  State(state): State<AppState<S, N>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  let round: Round = state.santa.run().await?;
  Ok((StatusCode::CREATED, Json(round)))
}

/// `DELETE /draw`
pub async fn reset<S, N>(
  _admin: Admin,
  State(state): State<AppState<S, N>>,
) -> Result<StatusCode, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  state.santa.reset().await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /draw/pairs`
pub async fn pairs<S, N>(
  _admin: Admin,
  State(state): State<AppState<S, N>>,
) -> Result<Json<Vec<Pair>>, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  Ok(Json(state.santa.pairs().await?))
}

/// `POST /draw/notify`
///
/// Returns immediately; the pass runs in the background and logs its report.
pub async fn notify<S, N>(
  _admin: Admin,
  State(state): State<AppState<S, N>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SantaStore + 'static,
  N: Notifier,
{
  if !state.santa.distribution_done().await? {
    return Err(ApiError::Conflict("gifts have not been distributed yet".into()));
  }

  let santa = Arc::clone(&state.santa);
  let notifier = Arc::clone(&state.notifier);
  tokio::spawn(async move {
    if let Err(e) = santa.notify_pending(notifier).await {
      tracing::error!(error = %e, "notification pass failed");
    }
  });

  Ok((StatusCode::ACCEPTED, Json(json!({ "status": "started" }))))
}
