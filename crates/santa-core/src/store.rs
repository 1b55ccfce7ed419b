//! The `SantaStore` trait and the round record it persists.
//!
//! The trait is implemented by storage backends ([`crate::memory::MemoryStore`],
//! `santa-store-sqlite`). [`crate::SecretSanta`] depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  pairing::Pair,
  participant::{Participant, ParticipantId, ValidRegistration},
};

// ─── Round ───────────────────────────────────────────────────────────────────

/// One committed distribution. Its presence is the `distribution_done` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
  pub round_id:     Uuid,
  pub committed_at: DateTime<Utc>,
}

impl Round {
  pub fn new() -> Self {
    Self {
      round_id:     Uuid::new_v4(),
      committed_at: Utc::now(),
    }
  }
}

impl Default for Round {
  fn default() -> Self { Self::new() }
}

/// One archived edge of a past round. Written by `commit_round`, never
/// removed by `clear_round`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftRecord {
  pub round_id:     Uuid,
  pub giver:        ParticipantId,
  pub receiver:     ParticipantId,
  pub committed_at: DateTime<Utc>,
}

/// Result of [`SantaStore::commit_round`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
  Committed,
  /// Another round was already committed; nothing was written.
  AlreadyDone,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Keyed storage for participants and the pair table.
///
/// `commit_round` and `clear_round` are the only bulk mutations of pair data
/// and assignment flags, and each must be all-or-nothing.
pub trait SantaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Participants ──────────────────────────────────────────────────────

  /// Insert a participant, or overwrite the profile of an existing one.
  /// Assignment flags and `registered_at` of an existing row are preserved.
  fn upsert_participant(
    &self,
    input: ValidRegistration,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  fn get_participant<'a>(
    &'a self,
    id: &'a ParticipantId,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + 'a;

  /// All participants in registration order.
  fn list_participants(
    &self,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  fn count_participants(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Set `notified` for `id`. Returns `false` if the participant is unknown.
  fn set_notified<'a>(
    &'a self,
    id: &'a ParticipantId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Set `notified` for `id` only while `round_id` is the committed round.
  /// Returns `false`, writing nothing, if the round has changed or `id` is
  /// unknown.
  fn set_notified_in<'a>(
    &'a self,
    round_id: Uuid,
    id: &'a ParticipantId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Rounds ────────────────────────────────────────────────────────────

  /// The committed round, if any.
  fn current_round(
    &self,
  ) -> impl Future<Output = Result<Option<Round>, Self::Error>> + Send + '_;

  /// Atomically record `round` and every pair, append the pairs to the gift
  /// history, set `has_receiver` and `is_giver` from the pairs and clear
  /// `notified` for everyone.
  ///
  /// Compare-and-set on the round: if one is already committed nothing is
  /// written and [`CommitOutcome::AlreadyDone`] is returned.
  fn commit_round(
    &self,
    round: Round,
    pairs: Vec<Pair>,
  ) -> impl Future<Output = Result<CommitOutcome, Self::Error>> + Send + '_;

  /// Delete the round and every pair, and clear all assignment flags.
  /// Participants and the gift history are kept.
  fn clear_round(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Pairs ─────────────────────────────────────────────────────────────

  fn pair_for_giver<'a>(
    &'a self,
    giver: &'a ParticipantId,
  ) -> impl Future<Output = Result<Option<Pair>, Self::Error>> + Send + 'a;

  fn list_pairs(&self) -> impl Future<Output = Result<Vec<Pair>, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Every archived edge with `giver` as giver, newest round first.
  fn gift_history<'a>(
    &'a self,
    giver: &'a ParticipantId,
  ) -> impl Future<Output = Result<Vec<GiftRecord>, Self::Error>> + Send + 'a;
}
