//! SQL schema for the Secret Santa SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- `seq` gives the stable registration order used for listing.
CREATE TABLE IF NOT EXISTS participants (
    seq            INTEGER PRIMARY KEY AUTOINCREMENT,
    participant_id TEXT    NOT NULL UNIQUE,
    name           TEXT    NOT NULL,
    username       TEXT,
    wish           TEXT,
    avoid          TEXT,
    has_receiver   INTEGER NOT NULL DEFAULT 0,
    is_giver       INTEGER NOT NULL DEFAULT 0,
    notified       INTEGER NOT NULL DEFAULT 0,
    registered_at  TEXT    NOT NULL   -- ISO 8601 UTC
);

-- At most one committed round; its presence is the distribution flag.
CREATE TABLE IF NOT EXISTS rounds (
    slot         INTEGER PRIMARY KEY CHECK (slot = 1),
    round_id     TEXT    NOT NULL,
    committed_at TEXT    NOT NULL
);

-- Written in bulk by one commit, deleted in bulk by a reset.
CREATE TABLE IF NOT EXISTS pairs (
    position    INTEGER PRIMARY KEY,   -- cycle order
    giver_id    TEXT NOT NULL UNIQUE REFERENCES participants(participant_id),
    receiver_id TEXT NOT NULL UNIQUE REFERENCES participants(participant_id),
    CHECK (giver_id != receiver_id)
);

-- Append-only archive of every committed pair. A reset never touches it.
CREATE TABLE IF NOT EXISTS round_history (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    round_id     TEXT NOT NULL,
    giver_id     TEXT NOT NULL REFERENCES participants(participant_id),
    receiver_id  TEXT NOT NULL REFERENCES participants(participant_id),
    committed_at TEXT NOT NULL   -- ISO 8601 UTC
);

CREATE INDEX IF NOT EXISTS round_history_giver ON round_history (giver_id);

PRAGMA user_version = 1;
";
