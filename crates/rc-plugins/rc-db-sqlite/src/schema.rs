//! Table definitions, applied idempotently on startup.
//!
//! The unique pairs on `reactions` and `shares` are what actually guarantee
//! one reaction / one share per (announcement, profile); the services' own
//! read-then-write is only best effort.

pub(crate) const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        id            BLOB PRIMARY KEY NOT NULL,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS profiles (
        id           BLOB PRIMARY KEY NOT NULL,
        user_id      BLOB NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
        username     TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        avatar_url   TEXT,
        bio          TEXT,
        is_admin     BOOLEAN NOT NULL DEFAULT 0,
        banned       BOOLEAN NOT NULL DEFAULT 0,
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS announcements (
        id         BLOB PRIMARY KEY NOT NULL,
        title      TEXT NOT NULL,
        content    TEXT NOT NULL,
        author_id  BLOB NOT NULL REFERENCES profiles(id),
        image_url  TEXT,
        is_pinned  BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS reactions (
        id              BLOB PRIMARY KEY NOT NULL,
        announcement_id BLOB NOT NULL REFERENCES announcements(id) ON DELETE CASCADE,
        user_id         BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        reaction_type   TEXT NOT NULL DEFAULT 'like'
                        CHECK (reaction_type IN ('like', 'love', 'laugh', 'angry', 'sad')),
        created_at      TEXT NOT NULL,
        UNIQUE (announcement_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id              BLOB PRIMARY KEY NOT NULL,
        announcement_id BLOB NOT NULL REFERENCES announcements(id) ON DELETE CASCADE,
        user_id         BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        content         TEXT NOT NULL,
        parent_id       BLOB REFERENCES comments(id) ON DELETE CASCADE,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS shares (
        id              BLOB PRIMARY KEY NOT NULL,
        announcement_id BLOB NOT NULL REFERENCES announcements(id) ON DELETE CASCADE,
        user_id         BLOB NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        shared_at       TEXT NOT NULL,
        UNIQUE (announcement_id, user_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_comments_announcement ON comments (announcement_id)",
    "CREATE INDEX IF NOT EXISTS idx_announcements_feed ON announcements (is_pinned DESC, created_at DESC)",
];
