//! Participant — a registered member of the gift exchange.
//!
//! Profile fields come from the participant; assignment flags are owned by
//! the engine and only change on a committed run or a reset.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, policy::EventPolicy};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque, stable identifier supplied by the calling context (e.g. a chat
/// user id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
  /// Build an identifier; blank input is rejected.
  pub fn new(raw: impl Into<String>) -> Result<Self> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(Error::Validation("participant id must not be empty".into()));
    }
    Ok(Self(trimmed.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ParticipantId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// What a giver is shown about their receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub name:     String,
  /// Chat handle, if the calling context has one. Display only.
  pub username: Option<String>,
  /// What the participant would like to receive.
  pub wish:     Option<String>,
  /// What the participant would rather not receive.
  pub avoid:    Option<String>,
}

/// Per-participant state written by the assignment engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentFlags {
  /// Someone has been assigned to give to this participant.
  pub has_receiver: bool,
  /// This participant has been assigned someone to give to.
  pub is_giver:     bool,
  /// This participant has been shown their assignment.
  pub notified:     bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  pub participant_id: ParticipantId,
  pub profile:        Profile,
  pub flags:          AssignmentFlags,
  /// Set on first registration; preserved by later upserts.
  pub registered_at:  DateTime<Utc>,
}

// ─── Registration input ──────────────────────────────────────────────────────

/// Raw registration input as received from the boundary layer.
#[derive(Debug, Clone, Default)]
pub struct Registration {
  pub participant_id: String,
  pub name:           String,
  pub username:       Option<String>,
  pub wish:           Option<String>,
  pub avoid:          Option<String>,
}

impl Registration {
  pub fn new(participant_id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      participant_id: participant_id.into(),
      name: name.into(),
      ..Self::default()
    }
  }

  pub fn with_wish(mut self, wish: impl Into<String>) -> Self {
    self.wish = Some(wish.into());
    self
  }

  pub fn with_avoid(mut self, avoid: impl Into<String>) -> Self {
    self.avoid = Some(avoid.into());
    self
  }

  pub fn with_username(mut self, username: impl Into<String>) -> Self {
    self.username = Some(username.into());
    self
  }

  /// Trim and check the input against `policy`.
  pub fn validate(self, policy: &EventPolicy) -> Result<ValidRegistration> {
    let participant_id = ParticipantId::new(self.participant_id)?;

    let name = self.name.trim().to_owned();
    if name.is_empty() {
      return Err(Error::Validation("name must not be empty".into()));
    }
    if name.chars().count() < policy.min_name_chars {
      return Err(Error::Validation(format!(
        "name must be at least {} characters",
        policy.min_name_chars
      )));
    }

    Ok(ValidRegistration {
      participant_id,
      profile: Profile {
        name,
        username: non_blank(self.username),
        wish: non_blank(self.wish),
        avoid: non_blank(self.avoid),
      },
    })
  }
}

/// Registration input that passed [`Registration::validate`]; the only form a
/// store accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
  pub participant_id: ParticipantId,
  pub profile:        Profile,
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_id_is_rejected() {
    assert!(matches!(ParticipantId::new("   "), Err(Error::Validation(_))));
  }

  #[test]
  fn id_is_trimmed() {
    assert_eq!(ParticipantId::new(" 42 ").unwrap().as_str(), "42");
  }

  #[test]
  fn short_name_is_rejected() {
    let policy = EventPolicy::default();
    let err = Registration::new("1", "Ann").validate(&policy).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn empty_name_is_rejected() {
    let policy = EventPolicy::default();
    let err = Registration::new("1", "  ").validate(&policy).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn name_length_counts_characters_not_bytes() {
    // Four Cyrillic letters are eight bytes.
    let policy = EventPolicy::default();
    assert!(Registration::new("1", "Иван").validate(&policy).is_err());
    assert!(Registration::new("1", "Иванов").validate(&policy).is_ok());
  }

  #[test]
  fn blank_optional_texts_become_none() {
    let policy = EventPolicy::default();
    let valid = Registration::new("1", "Alice Liddell")
      .with_wish("  ")
      .with_avoid(" socks ")
      .validate(&policy)
      .unwrap();
    assert_eq!(valid.profile.wish, None);
    assert_eq!(valid.profile.avoid.as_deref(), Some("socks"));
    assert_eq!(valid.profile.username, None);
  }

  #[test]
  fn min_name_chars_follows_policy() {
    let policy = EventPolicy { min_name_chars: 2, ..EventPolicy::default() };
    assert!(Registration::new("1", "Al").validate(&policy).is_ok());
  }
}
