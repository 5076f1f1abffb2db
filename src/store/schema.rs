//! SQL schema definitions.

/// Complete schema for the Peekly v1 database.
///
/// The at-most-one-per-pair invariants for entitlement and like records
/// are enforced by UNIQUE constraints rather than application-level
/// check-then-insert, so concurrent writers race on the index and
/// exactly one wins.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Accounts
-- ============================================================

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    address TEXT UNIQUE,
    username TEXT,
    created_at INTEGER NOT NULL
);

-- ============================================================
-- Content
-- ============================================================

CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    ipfs TEXT NOT NULL,
    description TEXT NOT NULL,
    price REAL NOT NULL,
    creator_address TEXT,
    like_count INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(user_id);
CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at);

-- ============================================================
-- Entitlement records
-- ============================================================

CREATE TABLE IF NOT EXISTS views (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    post_id TEXT NOT NULL REFERENCES posts(id),
    amount REAL NOT NULL,
    is_base_pay INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    UNIQUE (user_id, post_id)
);

CREATE INDEX IF NOT EXISTS idx_views_post ON views(post_id);

-- ============================================================
-- Like records
-- ============================================================

CREATE TABLE IF NOT EXISTS likes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    post_id TEXT NOT NULL REFERENCES posts(id),
    created_at INTEGER NOT NULL,
    UNIQUE (user_id, post_id)
);

CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id);
"#;
