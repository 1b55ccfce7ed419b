//! [`SecretSanta`] — the participant registry and assignment engine for one
//! event, layered over a [`SantaStore`].
//!
//! Every operation runs under one event-wide lock. Mutations (`register`,
//! `run`, `reset`, the notified writes and `reveal_receiver`) take it
//! exclusively and lookups share it, so no reader ever observes a
//! half-committed pair set.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
  Error, Result,
  pairing::{self, Pair},
  participant::{Participant, ParticipantId, Profile, Registration},
  policy::EventPolicy,
  store::{CommitOutcome, Round, SantaStore},
};

/// Givers still waiting for their assignment, captured from one round.
pub(crate) struct PendingBatch {
  pub round_id: Uuid,
  pub pending:  Vec<(Participant, Recipient)>,
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// What a giver is told: who they give to and that person's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
  pub participant_id: ParticipantId,
  pub profile:        Profile,
}

/// Snapshot of the event state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventStatus {
  pub participants:      usize,
  pub notified:          usize,
  pub distribution_done: bool,
  pub can_run:           bool,
  pub round:             Option<Round>,
}

/// A receiver `giver` was assigned in some past or current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PastGift {
  pub round_id:      Uuid,
  pub receiver:      ParticipantId,
  pub receiver_name: String,
  pub committed_at:  DateTime<Utc>,
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// One Secret Santa round: owns the store and serialises access to it.
pub struct SecretSanta<S> {
  store:  S,
  policy: EventPolicy,
  gate:   RwLock<()>,
  rng:    Mutex<StdRng>,
}

impl<S: SantaStore> SecretSanta<S> {
  pub fn new(store: S, policy: EventPolicy) -> Self {
    Self::with_rng(store, policy, StdRng::from_os_rng())
  }

  /// Build an event whose draws are reproducible from `seed`.
  pub fn with_seed(store: S, policy: EventPolicy, seed: u64) -> Self {
    Self::with_rng(store, policy, StdRng::seed_from_u64(seed))
  }

  fn with_rng(store: S, policy: EventPolicy, rng: StdRng) -> Self {
    Self {
      store,
      policy,
      gate: RwLock::new(()),
      rng: Mutex::new(rng),
    }
  }

  pub fn policy(&self) -> &EventPolicy { &self.policy }

  pub fn store(&self) -> &S { &self.store }

  // ── Registry ──────────────────────────────────────────────────────────

  /// Register a participant, or overwrite the profile of an existing one.
  ///
  /// Assignment flags are never touched here.
  pub async fn register(&self, input: Registration) -> Result<Participant> {
    let valid = input.validate(&self.policy)?;
    let _guard = self.gate.write().await;

    if !self.policy.allow_registration_after_draw && self.round().await?.is_some() {
      return Err(Error::RegistrationClosed);
    }

    let participant = self
      .store
      .upsert_participant(valid)
      .await
      .map_err(Error::store)?;

    tracing::info!(
      participant_id = %participant.participant_id,
      name = %participant.profile.name,
      "registered participant"
    );
    Ok(participant)
  }

  pub async fn is_registered(&self, id: &ParticipantId) -> Result<bool> {
    let _guard = self.gate.read().await;
    Ok(self.participant(id).await?.is_some())
  }

  pub async fn get_participant(&self, id: &ParticipantId) -> Result<Participant> {
    let _guard = self.gate.read().await;
    self
      .participant(id)
      .await?
      .ok_or_else(|| Error::NotFound(id.clone()))
  }

  pub async fn get_profile(&self, id: &ParticipantId) -> Result<Profile> {
    Ok(self.get_participant(id).await?.profile)
  }

  /// Every participant, in registration order.
  pub async fn list_all(&self) -> Result<Vec<Participant>> {
    let _guard = self.gate.read().await;
    self.store.list_participants().await.map_err(Error::store)
  }

  pub async fn count(&self) -> Result<usize> {
    let _guard = self.gate.read().await;
    self.store.count_participants().await.map_err(Error::store)
  }

  /// Record that `id` has been shown their assignment. Unknown ids are
  /// ignored.
  pub async fn mark_notified(&self, id: &ParticipantId) -> Result<()> {
    let _guard = self.gate.write().await;
    let found = self.store.set_notified(id).await.map_err(Error::store)?;
    if !found {
      tracing::debug!(participant_id = %id, "mark_notified on unknown participant");
    }
    Ok(())
  }

  /// Mark `id` notified only if `round_id` is still the committed round.
  /// Returns whether the flag was set.
  pub async fn mark_notified_in(&self, round_id: Uuid, id: &ParticipantId) -> Result<bool> {
    let _guard = self.gate.write().await;
    let marked = self
      .store
      .set_notified_in(round_id, id)
      .await
      .map_err(Error::store)?;
    if !marked {
      tracing::debug!(participant_id = %id, %round_id, "round no longer current, not marking");
    }
    Ok(marked)
  }

  /// Every receiver `giver` has been assigned, newest round first. Survives
  /// `reset`.
  pub async fn history_for(&self, giver: &ParticipantId) -> Result<Vec<PastGift>> {
    let _guard = self.gate.read().await;

    if self.participant(giver).await?.is_none() {
      return Err(Error::NotFound(giver.clone()));
    }

    let records = self.store.gift_history(giver).await.map_err(Error::store)?;
    let mut gifts = Vec::with_capacity(records.len());
    for record in records {
      let receiver_name = self
        .participant(&record.receiver)
        .await?
        .map(|p| p.profile.name)
        .unwrap_or_default();
      gifts.push(PastGift {
        round_id: record.round_id,
        receiver: record.receiver,
        receiver_name,
        committed_at: record.committed_at,
      });
    }
    Ok(gifts)
  }

  // ── Assignment engine ─────────────────────────────────────────────────

  pub async fn distribution_done(&self) -> Result<bool> {
    let _guard = self.gate.read().await;
    Ok(self.round().await?.is_some())
  }

  /// `true` iff at least two participants are registered and no round is
  /// committed.
  pub async fn can_run(&self) -> Result<bool> {
    let _guard = self.gate.read().await;
    let count = self.store.count_participants().await.map_err(Error::store)?;
    Ok(count >= 2 && self.round().await?.is_none())
  }

  /// Draw and commit a single-cycle assignment over every registered
  /// participant.
  pub async fn run(&self) -> Result<Round> {
    let _guard = self.gate.write().await;

    if self.round().await?.is_some() {
      return Err(Error::AlreadyDone);
    }

    let ids: Vec<ParticipantId> = self
      .store
      .list_participants()
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|p| p.participant_id)
      .collect();

    let pairs = {
      let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
      pairing::draw(&ids, &mut *rng)?
    };
    pairing::verify(&ids, &pairs)?;

    let round = Round::new();
    match self
      .store
      .commit_round(round.clone(), pairs)
      .await
      .map_err(Error::store)?
    {
      CommitOutcome::Committed => {
        tracing::info!(
          round_id = %round.round_id,
          participants = ids.len(),
          "distribution committed"
        );
        Ok(round)
      }
      CommitOutcome::AlreadyDone => Err(Error::AlreadyDone),
    }
  }

  /// Who `giver` gives to. `Ok(None)` if `giver` is registered but holds no
  /// giver edge (no round yet, or registered after the round).
  pub async fn get_receiver_for(&self, giver: &ParticipantId) -> Result<Option<Recipient>> {
    let _guard = self.gate.read().await;
    self.receiver_of(giver).await
  }

  /// [`Self::get_receiver_for`], marking `giver` notified in the same
  /// critical section when a recipient is returned.
  pub async fn reveal_receiver(&self, giver: &ParticipantId) -> Result<Option<Recipient>> {
    let _guard = self.gate.write().await;
    let recipient = self.receiver_of(giver).await?;
    if recipient.is_some() {
      self.store.set_notified(giver).await.map_err(Error::store)?;
    }
    Ok(recipient)
  }

  /// Clear every pair and assignment flag. Participants are kept.
  pub async fn reset(&self) -> Result<()> {
    let _guard = self.gate.write().await;
    self.store.clear_round().await.map_err(Error::store)?;
    tracing::info!("distribution reset");
    Ok(())
  }

  /// The committed pairs in cycle order; empty before the first run.
  pub async fn pairs(&self) -> Result<Vec<Pair>> {
    let _guard = self.gate.read().await;
    self.store.list_pairs().await.map_err(Error::store)
  }

  pub async fn status(&self) -> Result<EventStatus> {
    let _guard = self.gate.read().await;
    let participants = self.store.list_participants().await.map_err(Error::store)?;
    let round = self.round().await?;
    let distribution_done = round.is_some();

    Ok(EventStatus {
      participants: participants.len(),
      notified: participants.iter().filter(|p| p.flags.notified).count(),
      distribution_done,
      can_run: participants.len() >= 2 && !distribution_done,
      round,
    })
  }

  /// Every assigned giver not yet notified, paired with their recipient,
  /// read under one lock together with the round they belong to.
  pub(crate) async fn pending_notifications(&self) -> Result<Option<PendingBatch>> {
    let _guard = self.gate.read().await;
    let Some(round) = self.round().await? else {
      return Ok(None);
    };
    let participants = self.store.list_participants().await.map_err(Error::store)?;
    let pairs = self.store.list_pairs().await.map_err(Error::store)?;

    let mut pending = Vec::new();
    for pair in pairs {
      let giver = participants.iter().find(|p| p.participant_id == pair.giver);
      let receiver = participants.iter().find(|p| p.participant_id == pair.receiver);
      if let (Some(giver), Some(receiver)) = (giver, receiver)
        && !giver.flags.notified
      {
        pending.push((giver.clone(), Recipient {
          participant_id: receiver.participant_id.clone(),
          profile:        receiver.profile.clone(),
        }));
      }
    }
    Ok(Some(PendingBatch {
      round_id: round.round_id,
      pending,
    }))
  }

  pub(crate) async fn is_current_round(&self, round_id: Uuid) -> Result<bool> {
    let _guard = self.gate.read().await;
    Ok(self.round().await?.is_some_and(|r| r.round_id == round_id))
  }

  // ── Helpers (caller holds the gate) ───────────────────────────────────

  async fn participant(&self, id: &ParticipantId) -> Result<Option<Participant>> {
    self.store.get_participant(id).await.map_err(Error::store)
  }

  async fn round(&self) -> Result<Option<Round>> {
    self.store.current_round().await.map_err(Error::store)
  }

  async fn receiver_of(&self, giver: &ParticipantId) -> Result<Option<Recipient>> {
    if self.participant(giver).await?.is_none() {
      return Err(Error::NotFound(giver.clone()));
    }

    let Some(pair) = self.store.pair_for_giver(giver).await.map_err(Error::store)? else {
      return Ok(None);
    };

    let receiver = self
      .participant(&pair.receiver)
      .await?
      .ok_or_else(|| Error::NotFound(pair.receiver.clone()))?;

    Ok(Some(Recipient {
      participant_id: receiver.participant_id,
      profile:        receiver.profile,
    }))
  }
}
