//! Derangement construction and verification.
//!
//! One shuffle of the participant ids, read as a ring: the participant at
//! position `i` gives to the participant at `i + 1`, and the last gives to the
//! first. For two or more distinct ids this is a single cycle covering every
//! participant, so no self-pair can occur and no retry is needed.

use std::collections::{HashMap, HashSet};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, participant::ParticipantId};

/// A directed giver → receiver edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
  pub giver:    ParticipantId,
  pub receiver: ParticipantId,
}

/// Draw a single-cycle derangement over `ids`.
///
/// Pairs are returned in cycle order.
pub fn draw<R: Rng + ?Sized>(ids: &[ParticipantId], rng: &mut R) -> Result<Vec<Pair>> {
  if ids.len() < 2 {
    return Err(Error::InsufficientParticipants { count: ids.len() });
  }

  let mut seen = HashSet::with_capacity(ids.len());
  if let Some(dup) = ids.iter().find(|id| !seen.insert(*id)) {
    return Err(Error::Validation(format!("duplicate participant id: {dup}")));
  }

  let mut ring = ids.to_vec();
  ring.shuffle(rng);

  let pairs = ring
    .iter()
    .zip(ring.iter().cycle().skip(1))
    .map(|(giver, receiver)| Pair {
      giver:    giver.clone(),
      receiver: receiver.clone(),
    })
    .collect();

  Ok(pairs)
}

/// Check that `pairs` is a total bijection on `ids` with no fixed point that
/// forms exactly one cycle of length `ids.len()`.
pub fn verify(ids: &[ParticipantId], pairs: &[Pair]) -> Result<()> {
  let invalid = |msg: String| Err(Error::InvalidAssignment(msg));

  if pairs.len() != ids.len() {
    return invalid(format!("{} pairs for {} participants", pairs.len(), ids.len()));
  }

  let members: HashSet<&ParticipantId> = ids.iter().collect();
  let mut next: HashMap<&ParticipantId, &ParticipantId> = HashMap::with_capacity(pairs.len());
  let mut receivers = HashSet::with_capacity(pairs.len());

  for pair in pairs {
    if pair.giver == pair.receiver {
      return invalid(format!("{} is paired with themselves", pair.giver));
    }
    if !members.contains(&pair.giver) || !members.contains(&pair.receiver) {
      return invalid(format!("pair {} -> {} names an unknown participant", pair.giver, pair.receiver));
    }
    if next.insert(&pair.giver, &pair.receiver).is_some() {
      return invalid(format!("{} gives more than once", pair.giver));
    }
    if !receivers.insert(&pair.receiver) {
      return invalid(format!("{} receives more than once", pair.receiver));
    }
  }

  // Walk the cycle from an arbitrary start; it must close after exactly N steps.
  let Some(start) = ids.first() else {
    return Ok(());
  };
  let mut current = start;
  for step in 1..=ids.len() {
    current = next[current];
    if current == start && step != ids.len() {
      return invalid(format!("cycle through {start} has length {step}"));
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  fn ids(n: usize) -> Vec<ParticipantId> {
    (0..n).map(|i| ParticipantId::new(format!("p{i}")).unwrap()).collect()
  }

  fn pair(giver: &str, receiver: &str) -> Pair {
    Pair {
      giver:    ParticipantId::new(giver).unwrap(),
      receiver: ParticipantId::new(receiver).unwrap(),
    }
  }

  #[test]
  fn draw_rejects_fewer_than_two() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(
      draw(&ids(0), &mut rng),
      Err(Error::InsufficientParticipants { count: 0 })
    ));
    assert!(matches!(
      draw(&ids(1), &mut rng),
      Err(Error::InsufficientParticipants { count: 1 })
    ));
  }

  #[test]
  fn draw_rejects_duplicates() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut dup = ids(3);
    dup.push(dup[0].clone());
    assert!(matches!(draw(&dup, &mut rng), Err(Error::Validation(_))));
  }

  #[test]
  fn two_participants_swap() {
    let mut rng = StdRng::seed_from_u64(7);
    let ids = ids(2);
    let pairs = draw(&ids, &mut rng).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].giver, pairs[1].receiver);
    assert_eq!(pairs[1].giver, pairs[0].receiver);
  }

  #[test]
  fn draws_are_single_cycle_derangements() {
    let mut rng = StdRng::seed_from_u64(2024);
    for n in 2..40 {
      let ids = ids(n);
      let pairs = draw(&ids, &mut rng).unwrap();
      verify(&ids, &pairs).unwrap();
    }
  }

  #[test]
  fn same_seed_same_draw() {
    let ids = ids(12);
    let a = draw(&ids, &mut StdRng::seed_from_u64(99)).unwrap();
    let b = draw(&ids, &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(a, b);
  }

  #[test]
  fn verify_rejects_self_pair() {
    let ids = ids(2);
    let pairs = vec![pair("p0", "p0"), pair("p1", "p1")];
    assert!(matches!(verify(&ids, &pairs), Err(Error::InvalidAssignment(_))));
  }

  #[test]
  fn verify_rejects_two_cycles() {
    // p0 <-> p1 and p2 <-> p3 is a derangement, but not a single cycle.
    let ids = ids(4);
    let pairs = vec![
      pair("p0", "p1"),
      pair("p1", "p0"),
      pair("p2", "p3"),
      pair("p3", "p2"),
    ];
    assert!(matches!(verify(&ids, &pairs), Err(Error::InvalidAssignment(_))));
  }

  #[test]
  fn verify_rejects_double_receiver() {
    let ids = ids(3);
    let pairs = vec![pair("p0", "p1"), pair("p1", "p2"), pair("p2", "p1")];
    assert!(matches!(verify(&ids, &pairs), Err(Error::InvalidAssignment(_))));
  }

  #[test]
  fn verify_rejects_missing_pairs() {
    let ids = ids(3);
    let pairs = vec![pair("p0", "p1"), pair("p1", "p0")];
    assert!(matches!(verify(&ids, &pairs), Err(Error::InvalidAssignment(_))));
  }

  #[test]
  fn verify_rejects_unknown_participant() {
    let ids = ids(2);
    let pairs = vec![pair("p0", "p1"), pair("p1", "zz")];
    assert!(matches!(verify(&ids, &pairs), Err(Error::InvalidAssignment(_))));
  }
}
