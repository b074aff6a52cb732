//! Database schema definitions

/// SQL schema for the checkpoint database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Single-row-per-key checkpoint bookkeeping (presence flag, search index)
CREATE TABLE IF NOT EXISTS checkpoint_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Credential cooldown state in rotation order; keys are never stored
CREATE TABLE IF NOT EXISTS credentials (
    position INTEGER PRIMARY KEY,
    credential_id TEXT NOT NULL,
    cooldown_ms INTEGER NOT NULL,
    blocked_at TEXT
);

-- Frontier levels, ordered within each level
CREATE TABLE IF NOT EXISTS frontier (
    level TEXT NOT NULL CHECK (level IN ('current', 'next')),
    position INTEGER NOT NULL,
    node_id INTEGER NOT NULL,
    PRIMARY KEY (level, position)
);

-- Accumulated graph
CREATE TABLE IF NOT EXISTS nodes (
    node_id INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS edges (
    a INTEGER NOT NULL,
    b INTEGER NOT NULL,
    PRIMARY KEY (a, b)
);

-- In-flight lookup batch (at most one row in pending_batch)
CREATE TABLE IF NOT EXISTS pending_batch (
    parent INTEGER PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS pending_remaining (
    position INTEGER PRIMARY KEY,
    node_id INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS pending_scored (
    position INTEGER PRIMARY KEY,
    node_id INTEGER NOT NULL,
    popularity INTEGER NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
