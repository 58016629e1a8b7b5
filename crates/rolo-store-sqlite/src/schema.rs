//! SQL schema for the Rolo SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS identities (
    id                 TEXT PRIMARY KEY,
    name               TEXT NOT NULL,
    email              TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash      TEXT NOT NULL,
    role               TEXT NOT NULL DEFAULT 'user',   -- 'user' | 'admin'
    is_active          INTEGER NOT NULL DEFAULT 1,
    refresh_token_hash TEXT,                           -- SHA-256 hex or NULL
    last_login         TEXT,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    id         TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL REFERENCES identities(id),
    name       TEXT NOT NULL,
    email      TEXT NOT NULL,
    phone      TEXT,
    company    TEXT,
    status     TEXT NOT NULL DEFAULT 'Lead',
    notes      TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS contacts_owner_idx ON contacts(owner_id, created_at DESC);

-- Activities are strictly append-only.
CREATE TABLE IF NOT EXISTS activities (
    id           TEXT PRIMARY KEY,
    action       TEXT NOT NULL,   -- 'CREATE' | 'UPDATE' | 'DELETE'
    entity_type  TEXT NOT NULL,
    entity_id    TEXT NOT NULL,
    entity_label TEXT NOT NULL,
    performed_by TEXT NOT NULL,
    changes      TEXT,            -- JSON object or NULL
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS activities_performer_idx
    ON activities(performed_by, created_at DESC);
CREATE INDEX IF NOT EXISTS activities_created_idx ON activities(created_at DESC);

CREATE TRIGGER IF NOT EXISTS activities_no_update
BEFORE UPDATE ON activities
BEGIN
    SELECT RAISE(ABORT, 'activities are append-only');
END;

CREATE TRIGGER IF NOT EXISTS activities_no_delete
BEFORE DELETE ON activities
BEGIN
    SELECT RAISE(ABORT, 'activities are append-only');
END;

PRAGMA user_version = 1;
";
