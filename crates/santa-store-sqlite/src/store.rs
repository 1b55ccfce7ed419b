//! [`SqliteStore`] — the SQLite implementation of [`SantaStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use santa_core::{
  pairing::Pair,
  participant::{Participant, ParticipantId, Profile, ValidRegistration},
  store::{CommitOutcome, GiftRecord, Round, SantaStore},
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    PARTICIPANT_COLUMNS, RawGift, RawPair, RawParticipant, RawRound, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Secret Santa store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SantaStore impl ─────────────────────────────────────────────────────────

impl SantaStore for SqliteStore {
  type Error = crate::Error;

  // ── Participants ──────────────────────────────────────────────────────────

  async fn upsert_participant(&self, input: ValidRegistration) -> Result<Participant> {
    let id_str = input.participant_id.as_str().to_owned();
    let Profile { name, username, wish, avoid } = input.profile;
    let at_str = encode_dt(Utc::now());

    let raw: RawParticipant = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Flags, seq and registered_at of an existing row are left alone.
        tx.execute(
          "INSERT INTO participants (participant_id, name, username, wish, avoid, registered_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (participant_id) DO UPDATE SET
             name     = excluded.name,
             username = excluded.username,
             wish     = excluded.wish,
             avoid    = excluded.avoid",
          rusqlite::params![id_str, name, username, wish, avoid, at_str],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE participant_id = ?1"),
          rusqlite::params![id_str],
          RawParticipant::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_participant()
  }

  async fn get_participant(&self, id: &ParticipantId) -> Result<Option<Participant>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawParticipant> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE participant_id = ?1"),
              rusqlite::params![id_str],
              RawParticipant::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }

  async fn list_participants(&self) -> Result<Vec<Participant>> {
    let raws: Vec<RawParticipant> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {PARTICIPANT_COLUMNS} FROM participants ORDER BY seq"))?;
        let rows = stmt
          .query_map([], RawParticipant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  async fn count_participants(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM participants", [], |r| r.get(0))?))
      .await?;
    Ok(count as usize)
  }

  async fn set_notified(&self, id: &ParticipantId) -> Result<bool> {
    let id_str = id.as_str().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE participants SET notified = 1 WHERE participant_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn set_notified_in(&self, round_id: Uuid, id: &ParticipantId) -> Result<bool> {
    let round_id_str = encode_uuid(round_id);
    let id_str = id.as_str().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE participants SET notified = 1
           WHERE participant_id = ?1
             AND EXISTS (SELECT 1 FROM rounds WHERE slot = 1 AND round_id = ?2)",
          rusqlite::params![id_str, round_id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Rounds ────────────────────────────────────────────────────────────────

  async fn current_round(&self) -> Result<Option<Round>> {
    let raw: Option<RawRound> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row("SELECT round_id, committed_at FROM rounds WHERE slot = 1", [], |row| {
              Ok(RawRound {
                round_id:     row.get(0)?,
                committed_at: row.get(1)?,
              })
            })
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRound::into_round).transpose()
  }

  async fn commit_round(&self, round: Round, pairs: Vec<Pair>) -> Result<CommitOutcome> {
    let round_id_str = encode_uuid(round.round_id);
    let at_str       = encode_dt(round.committed_at);
    let rows: Vec<(String, String)> = pairs
      .into_iter()
      .map(|p| (p.giver.as_str().to_owned(), p.receiver.as_str().to_owned()))
      .collect();

    let committed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Compare-and-set on the single round slot. Dropping `tx` without
        // committing rolls back.
        let inserted = tx.execute(
          "INSERT INTO rounds (slot, round_id, committed_at) VALUES (1, ?1, ?2)
           ON CONFLICT (slot) DO NOTHING",
          rusqlite::params![round_id_str, at_str],
        )?;
        if inserted == 0 {
          return Ok(false);
        }

        tx.execute("DELETE FROM pairs", [])?;
        tx.execute(
          "UPDATE participants SET has_receiver = 0, is_giver = 0, notified = 0",
          [],
        )?;
        {
          let mut insert_pair = tx.prepare(
            "INSERT INTO pairs (position, giver_id, receiver_id) VALUES (?1, ?2, ?3)",
          )?;
          let mut mark_giver =
            tx.prepare("UPDATE participants SET is_giver = 1 WHERE participant_id = ?1")?;
          let mut mark_receiver =
            tx.prepare("UPDATE participants SET has_receiver = 1 WHERE participant_id = ?1")?;
          let mut archive = tx.prepare(
            "INSERT INTO round_history (round_id, giver_id, receiver_id, committed_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;

          for (position, (giver, receiver)) in rows.iter().enumerate() {
            insert_pair.execute(rusqlite::params![position as i64, giver, receiver])?;
            mark_giver.execute(rusqlite::params![giver])?;
            mark_receiver.execute(rusqlite::params![receiver])?;
            archive.execute(rusqlite::params![round_id_str, giver, receiver, at_str])?;
          }
        }

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if committed {
      tracing::debug!(round_id = %round.round_id, "round written");
      Ok(CommitOutcome::Committed)
    } else {
      Ok(CommitOutcome::AlreadyDone)
    }
  }

  async fn clear_round(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM pairs", [])?;
        tx.execute("DELETE FROM rounds", [])?;
        tx.execute(
          "UPDATE participants SET has_receiver = 0, is_giver = 0, notified = 0",
          [],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Pairs ─────────────────────────────────────────────────────────────────

  async fn pair_for_giver(&self, giver: &ParticipantId) -> Result<Option<Pair>> {
    let giver_str = giver.as_str().to_owned();

    let raw: Option<RawPair> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT giver_id, receiver_id FROM pairs WHERE giver_id = ?1",
              rusqlite::params![giver_str],
              RawPair::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPair::into_pair).transpose()
  }

  async fn list_pairs(&self) -> Result<Vec<Pair>> {
    let raws: Vec<RawPair> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT giver_id, receiver_id FROM pairs ORDER BY position")?;
        let rows = stmt
          .query_map([], RawPair::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPair::into_pair).collect()
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn gift_history(&self, giver: &ParticipantId) -> Result<Vec<GiftRecord>> {
    let giver_str = giver.as_str().to_owned();

    let raws: Vec<RawGift> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT round_id, giver_id, receiver_id, committed_at FROM round_history
           WHERE giver_id = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![giver_str], RawGift::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGift::into_record).collect()
  }
}
