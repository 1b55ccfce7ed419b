//! Fan-out of assignment notifications to every giver.
//!
//! Delivery itself is external; this module only schedules it. Each giver is
//! handled by an independent task with its own retries, and a failure for one
//! giver never affects another or the committed pairs.

use std::{future::Future, sync::Arc, time::Duration};

use serde::Serialize;
use tokio::task::JoinSet;

use crate::{
  Result,
  event::{Recipient, SecretSanta},
  participant::{Participant, ParticipantId},
  store::SantaStore,
};

/// Transport that tells a giver who their receiver is.
pub trait Notifier: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  fn deliver<'a>(
    &'a self,
    giver: &'a Participant,
    recipient: &'a Recipient,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Outcome of one [`SecretSanta::notify_pending`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
  pub delivered: Vec<ParticipantId>,
  pub failed:    Vec<ParticipantId>,
  /// Givers whose round was reset before their delivery finished. They stay
  /// unnotified in whatever round is now committed.
  pub stale:     Vec<ParticipantId>,
}

enum Delivery<E> {
  Delivered,
  Failed(E),
  Stale,
}

impl<S: SantaStore + 'static> SecretSanta<S> {
  /// Deliver to every assigned giver not yet notified, marking each one
  /// notified as its delivery succeeds.
  ///
  /// Marking is tied to the round the pass started from: if that round is
  /// reset meanwhile, finished deliveries are reported as stale and change
  /// nothing.
  ///
  /// The event lock is only held while taking the snapshot, never across a
  /// delivery.
  pub async fn notify_pending<N: Notifier>(
    self: &Arc<Self>,
    notifier: Arc<N>,
  ) -> Result<NotifyReport> {
    let Some(batch) = self.pending_notifications().await? else {
      return Ok(NotifyReport::default());
    };
    let round_id = batch.round_id;
    let max_attempts = self.policy().notify_max_attempts.max(1);
    let base_delay = Duration::from_millis(self.policy().notify_retry_delay_ms);

    let mut tasks = JoinSet::new();
    for (giver, recipient) in batch.pending {
      let santa = Arc::clone(self);
      let notifier = Arc::clone(&notifier);
      tasks.spawn(async move {
        let id = giver.participant_id.clone();
        match santa.is_current_round(round_id).await {
          Ok(true) => {}
          Ok(false) => return (id, Delivery::Stale),
          Err(e) => {
            tracing::warn!(participant_id = %id, error = %e, "could not check round");
            return (id, Delivery::Stale);
          }
        }

        if let Err(e) =
          deliver_with_retry(&*notifier, &giver, &recipient, max_attempts, base_delay).await
        {
          return (id, Delivery::Failed(e));
        }

        match santa.mark_notified_in(round_id, &id).await {
          Ok(true) => (id, Delivery::Delivered),
          Ok(false) => (id, Delivery::Stale),
          Err(e) => {
            tracing::warn!(participant_id = %id, error = %e, "delivered but could not mark notified");
            (id, Delivery::Delivered)
          }
        }
      });
    }

    let mut report = NotifyReport::default();
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((id, Delivery::Delivered)) => report.delivered.push(id),
        Ok((id, Delivery::Failed(e))) => {
          tracing::warn!(participant_id = %id, error = %e, "notification failed");
          report.failed.push(id);
        }
        Ok((id, Delivery::Stale)) => {
          tracing::warn!(participant_id = %id, %round_id, "round reset during notification");
          report.stale.push(id);
        }
        Err(e) => tracing::error!(error = %e, "notification task aborted"),
      }
    }

    tracing::info!(
      delivered = report.delivered.len(),
      failed = report.failed.len(),
      stale = report.stale.len(),
      "notification pass finished"
    );
    Ok(report)
  }
}

async fn deliver_with_retry<N: Notifier>(
  notifier: &N,
  giver: &Participant,
  recipient: &Recipient,
  max_attempts: u32,
  base_delay: Duration,
) -> Result<(), N::Error> {
  let mut attempt = 1;
  loop {
    match notifier.deliver(giver, recipient).await {
      Ok(()) => return Ok(()),
      Err(e) if attempt >= max_attempts => return Err(e),
      Err(e) => {
        tracing::debug!(
          participant_id = %giver.participant_id,
          attempt,
          error = %e,
          "delivery attempt failed, retrying"
        );
        tokio::time::sleep(base_delay.saturating_mul(2u32.saturating_pow(attempt - 1))).await;
        attempt += 1;
      }
    }
  }
}
