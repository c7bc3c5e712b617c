//! Database Migrations
//!
//! Schema migration definitions for the card store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: flashcards with memory model state",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Review log for downstream analytics sinks",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS flashcards (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    word_id TEXT NOT NULL,
    topic_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    -- Scheduling state
    status TEXT NOT NULL DEFAULT 'new',
    next_review_at TEXT NOT NULL,
    last_reviewed_at TEXT,
    ease_factor REAL NOT NULL DEFAULT 2.5,
    interval_days REAL NOT NULL DEFAULT 0,
    repetitions INTEGER NOT NULL DEFAULT 0,

    -- Memory model as JSON [alpha, beta, t], NULL until first review
    memory_model TEXT
);

CREATE INDEX IF NOT EXISTS idx_cards_user_due ON flashcards(user_id, next_review_at);
CREATE INDEX IF NOT EXISTS idx_cards_word ON flashcards(word_id);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Review log
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS review_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    card_id TEXT NOT NULL REFERENCES flashcards(id) ON DELETE CASCADE,
    rating TEXT NOT NULL,
    response_time_ms INTEGER NOT NULL DEFAULT 0,
    occurred_at TEXT NOT NULL,
    reviewed_at TEXT NOT NULL,
    elapsed_days REAL NOT NULL,
    interval_days REAL NOT NULL,
    status_after TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_log_card ON review_log(card_id, reviewed_at);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
