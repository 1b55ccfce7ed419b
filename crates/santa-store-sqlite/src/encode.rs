//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, flags
//! plain integers.

use chrono::{DateTime, Utc};
use santa_core::{
  pairing::Pair,
  participant::{AssignmentFlags, Participant, ParticipantId, Profile},
  store::{GiftRecord, Round},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ParticipantId ────────────────────────────────────────────────────────────

pub fn decode_participant_id(s: &str) -> Result<ParticipantId> {
  Ok(ParticipantId::new(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawParticipant::from_row`].
pub const PARTICIPANT_COLUMNS: &str = "participant_id, name, username, wish, avoid, \
                                       has_receiver, is_giver, notified, registered_at";

/// Raw values read directly from a `participants` row.
pub struct RawParticipant {
  pub participant_id: String,
  pub name:           String,
  pub username:       Option<String>,
  pub wish:           Option<String>,
  pub avoid:          Option<String>,
  pub has_receiver:   bool,
  pub is_giver:       bool,
  pub notified:       bool,
  pub registered_at:  String,
}

impl RawParticipant {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      participant_id: row.get(0)?,
      name:           row.get(1)?,
      username:       row.get(2)?,
      wish:           row.get(3)?,
      avoid:          row.get(4)?,
      has_receiver:   row.get(5)?,
      is_giver:       row.get(6)?,
      notified:       row.get(7)?,
      registered_at:  row.get(8)?,
    })
  }

  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      participant_id: decode_participant_id(&self.participant_id)?,
      profile:        Profile {
        name:     self.name,
        username: self.username,
        wish:     self.wish,
        avoid:    self.avoid,
      },
      flags:          AssignmentFlags {
        has_receiver: self.has_receiver,
        is_giver:     self.is_giver,
        notified:     self.notified,
      },
      registered_at:  decode_dt(&self.registered_at)?,
    })
  }
}

/// Raw strings read directly from the `rounds` row.
pub struct RawRound {
  pub round_id:     String,
  pub committed_at: String,
}

impl RawRound {
  pub fn into_round(self) -> Result<Round> {
    Ok(Round {
      round_id:     decode_uuid(&self.round_id)?,
      committed_at: decode_dt(&self.committed_at)?,
    })
  }
}

/// Raw strings read directly from a `pairs` row.
pub struct RawPair {
  pub giver_id:    String,
  pub receiver_id: String,
}

impl RawPair {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      giver_id:    row.get(0)?,
      receiver_id: row.get(1)?,
    })
  }

  pub fn into_pair(self) -> Result<Pair> {
    Ok(Pair {
      giver:    decode_participant_id(&self.giver_id)?,
      receiver: decode_participant_id(&self.receiver_id)?,
    })
  }
}

/// Raw strings read directly from a `round_history` row.
pub struct RawGift {
  pub round_id:     String,
  pub giver_id:     String,
  pub receiver_id:  String,
  pub committed_at: String,
}

impl RawGift {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      round_id:     row.get(0)?,
      giver_id:     row.get(1)?,
      receiver_id:  row.get(2)?,
      committed_at: row.get(3)?,
    })
  }

  pub fn into_record(self) -> Result<GiftRecord> {
    Ok(GiftRecord {
      round_id:     decode_uuid(&self.round_id)?,
      giver:        decode_participant_id(&self.giver_id)?,
      receiver:     decode_participant_id(&self.receiver_id)?,
      committed_at: decode_dt(&self.committed_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dt_roundtrip_preserves_instant() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn bad_dt_is_date_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn blank_participant_id_is_core_error() {
    assert!(matches!(decode_participant_id(""), Err(Error::Core(_))));
  }
}
