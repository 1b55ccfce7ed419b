//! Error types for `santa-core`.

use thiserror::Error;

use crate::participant::ParticipantId;

#[derive(Debug, Error)]
pub enum Error {
  /// Bad caller input; the caller should re-prompt.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("at least 2 participants are required, {count} registered")]
  InsufficientParticipants { count: usize },

  #[error("gifts have already been distributed; reset first")]
  AlreadyDone,

  #[error("participant not found: {0}")]
  NotFound(ParticipantId),

  #[error("registration is closed while a distribution round is active")]
  RegistrationClosed,

  /// A drawn mapping failed verification. Nothing was committed.
  #[error("invalid assignment: {0}")]
  InvalidAssignment(String),

  /// Infrastructure failure in the storage backend.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
