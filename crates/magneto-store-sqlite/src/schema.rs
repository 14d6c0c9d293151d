//! SQL schema for the Magneto SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,
    chat_id      INTEGER NOT NULL UNIQUE,   -- external chat id
    display_name TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL              -- ISO 8601 UTC
);

-- Exactly one row per user, inserted in the same transaction as the user.
CREATE TABLE IF NOT EXISTS profiles (
    user_id               TEXT PRIMARY KEY REFERENCES users(user_id),
    notifications_enabled INTEGER NOT NULL DEFAULT 1,
    survey_enabled        INTEGER NOT NULL DEFAULT 1,
    min_alert_threshold   INTEGER NOT NULL DEFAULT 1
        CHECK (min_alert_threshold BETWEEN 1 AND 9)
);

-- Survey answers are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS health_records (
    record_id     TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL REFERENCES users(user_id),
    response_text TEXT NOT NULL,
    index_value   REAL,                     -- day's max Kp, NULL if unknown
    recorded_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS health_records_user_idx ON health_records(user_id);

PRAGMA user_version = 1;
";
