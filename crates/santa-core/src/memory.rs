//! [`MemoryStore`] — an in-process [`SantaStore`] for tests and single-node
//! deployments that do not need persistence.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;

use crate::{
  pairing::Pair,
  participant::{AssignmentFlags, Participant, ParticipantId, ValidRegistration},
  store::{CommitOutcome, GiftRecord, Round, SantaStore},
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
  /// Registration order.
  participants: Vec<Participant>,
  index:        HashMap<ParticipantId, usize>,
  round:        Option<Round>,
  /// Cycle order as committed.
  pairs:        Vec<Pair>,
  /// Append-only, oldest first.
  history:      Vec<GiftRecord>,
}

impl State {
  fn participant_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
    let idx = *self.index.get(id)?;
    self.participants.get_mut(idx)
  }
}

/// A [`SantaStore`] held entirely in memory behind one mutex.
///
/// Cloning is cheap; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, State> {
    // Every mutation below completes before the guard drops, so a poisoned
    // lock still holds consistent state.
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl SantaStore for MemoryStore {
  type Error = Infallible;

  async fn upsert_participant(&self, input: ValidRegistration) -> Result<Participant, Infallible> {
    let mut state = self.lock();

    if let Some(existing) = state.participant_mut(&input.participant_id) {
      existing.profile = input.profile;
      return Ok(existing.clone());
    }

    let participant = Participant {
      participant_id: input.participant_id,
      profile:        input.profile,
      flags:          AssignmentFlags::default(),
      registered_at:  Utc::now(),
    };
    let idx = state.participants.len();
    state.index.insert(participant.participant_id.clone(), idx);
    state.participants.push(participant.clone());
    Ok(participant)
  }

  async fn get_participant(&self, id: &ParticipantId) -> Result<Option<Participant>, Infallible> {
    let state = self.lock();
    Ok(state.index.get(id).map(|&idx| state.participants[idx].clone()))
  }

  async fn list_participants(&self) -> Result<Vec<Participant>, Infallible> {
    Ok(self.lock().participants.clone())
  }

  async fn count_participants(&self) -> Result<usize, Infallible> {
    Ok(self.lock().participants.len())
  }

  async fn set_notified(&self, id: &ParticipantId) -> Result<bool, Infallible> {
    let mut state = self.lock();
    match state.participant_mut(id) {
      Some(p) => {
        p.flags.notified = true;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn set_notified_in(&self, round_id: Uuid, id: &ParticipantId) -> Result<bool, Infallible> {
    let mut state = self.lock();
    if state.round.as_ref().map(|r| r.round_id) != Some(round_id) {
      return Ok(false);
    }
    match state.participant_mut(id) {
      Some(p) => {
        p.flags.notified = true;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn current_round(&self) -> Result<Option<Round>, Infallible> {
    Ok(self.lock().round.clone())
  }

  async fn commit_round(&self, round: Round, pairs: Vec<Pair>) -> Result<CommitOutcome, Infallible> {
    let mut state = self.lock();
    if state.round.is_some() {
      return Ok(CommitOutcome::AlreadyDone);
    }

    for p in &mut state.participants {
      p.flags = AssignmentFlags::default();
    }
    for pair in &pairs {
      if let Some(giver) = state.participant_mut(&pair.giver) {
        giver.flags.is_giver = true;
      }
      if let Some(receiver) = state.participant_mut(&pair.receiver) {
        receiver.flags.has_receiver = true;
      }
    }
    state.history.extend(pairs.iter().map(|pair| GiftRecord {
      round_id:     round.round_id,
      giver:        pair.giver.clone(),
      receiver:     pair.receiver.clone(),
      committed_at: round.committed_at,
    }));
    state.pairs = pairs;
    state.round = Some(round);
    Ok(CommitOutcome::Committed)
  }

  async fn clear_round(&self) -> Result<(), Infallible> {
    let mut state = self.lock();
    state.round = None;
    state.pairs.clear();
    for p in &mut state.participants {
      p.flags = AssignmentFlags::default();
    }
    Ok(())
  }

  async fn pair_for_giver(&self, giver: &ParticipantId) -> Result<Option<Pair>, Infallible> {
    Ok(self.lock().pairs.iter().find(|p| &p.giver == giver).cloned())
  }

  async fn list_pairs(&self) -> Result<Vec<Pair>, Infallible> {
    Ok(self.lock().pairs.clone())
  }

  async fn gift_history(&self, giver: &ParticipantId) -> Result<Vec<GiftRecord>, Infallible> {
    Ok(
      self
        .lock()
        .history
        .iter()
        .rev()
        .filter(|r| &r.giver == giver)
        .cloned()
        .collect(),
    )
  }
}
