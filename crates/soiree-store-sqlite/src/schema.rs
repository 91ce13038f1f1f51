//! SQL schema for the Soirée SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Every dependent row cascades from its user or party, so deleting either
/// never leaves orphaned invitations, requests or edges behind.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id        TEXT PRIMARY KEY,
    username       TEXT NOT NULL UNIQUE,
    email          TEXT NOT NULL UNIQUE,   -- immutable after insert
    first_name     TEXT NOT NULL DEFAULT '',
    last_name      TEXT NOT NULL DEFAULT '',
    date_of_birth  TEXT NOT NULL,          -- ISO 8601 date
    avatar         TEXT NOT NULL,          -- path relative to media_dir
    password_hash  TEXT NOT NULL,          -- argon2 PHC string
    created_at     TEXT NOT NULL
);

-- One row per direction; {a, b} is always stored as (a, b) and (b, a).
CREATE TABLE IF NOT EXISTS friendships (
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    friend_id  TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, friend_id),
    CHECK (user_id != friend_id)
);

CREATE TABLE IF NOT EXISTS friend_invitations (
    invitation_id TEXT PRIMARY KEY,
    sender        TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    receiver      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    UNIQUE (sender, receiver),
    CHECK  (sender != receiver)
);

CREATE TABLE IF NOT EXISTS parties (
    party_id    TEXT PRIMARY KEY,
    owner       TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    privacy     TEXT NOT NULL DEFAULT 'private',  -- 'private' | 'public' | 'secret'
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL,
    start_time  TEXT NOT NULL,
    stop_time   TEXT NOT NULL,
    image       TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participants (
    party_id  TEXT NOT NULL REFERENCES parties(party_id) ON DELETE CASCADE,
    user_id   TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    joined_at TEXT NOT NULL,
    PRIMARY KEY (party_id, user_id)
);

CREATE TABLE IF NOT EXISTS party_invitations (
    invitation_id TEXT PRIMARY KEY,
    party_id      TEXT NOT NULL REFERENCES parties(party_id) ON DELETE CASCADE,
    receiver      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at    TEXT NOT NULL,
    UNIQUE (party_id, receiver)
);

CREATE TABLE IF NOT EXISTS party_requests (
    request_id TEXT PRIMARY KEY,
    party_id   TEXT NOT NULL REFERENCES parties(party_id) ON DELETE CASCADE,
    sender     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    UNIQUE (party_id, sender)
);

CREATE INDEX IF NOT EXISTS friendships_friend_idx   ON friendships(friend_id);
CREATE INDEX IF NOT EXISTS friend_inv_receiver_idx  ON friend_invitations(receiver);
CREATE INDEX IF NOT EXISTS parties_owner_idx        ON parties(owner);
CREATE INDEX IF NOT EXISTS parties_location_idx     ON parties(latitude, longitude);
CREATE INDEX IF NOT EXISTS participants_user_idx    ON participants(user_id);
CREATE INDEX IF NOT EXISTS party_inv_receiver_idx   ON party_invitations(receiver);
CREATE INDEX IF NOT EXISTS party_req_sender_idx     ON party_requests(sender);

PRAGMA user_version = 1;
";
