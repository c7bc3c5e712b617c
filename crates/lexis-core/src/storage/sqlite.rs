//! SQLite Card Store
//!
//! Persists flashcards and applies reviews as one read-modify-write
//! transaction per card.

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::card::{CardStatus, Flashcard, Rating, ReviewOutcome};
use crate::model::{MemoryModel, ModelError};
use crate::scheduler::ReviewScheduler;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Card not found
    #[error("Card not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Memory model could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The scheduler rejected the review
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] ModelError),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// One row of the review log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: i64,
    pub card_id: String,
    pub rating: Rating,
    pub response_time_ms: u64,
    /// When the learner answered
    pub occurred_at: DateTime<Utc>,
    /// When the scheduler processed the answer
    pub reviewed_at: DateTime<Utc>,
    pub elapsed_days: f64,
    pub interval_days: f64,
    pub status_after: CardStatus,
}

// ============================================================================
// CARD STORE
// ============================================================================

/// Flashcard persistence backed by SQLite
///
/// Uses separate reader/writer connections. All methods take `&self`, so the
/// store can be shared as `Arc<CardStore>`.
pub struct CardStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    scheduler: ReviewScheduler,
}

impl CardStore {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open (or create) the store with the default scheduler
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        Self::with_scheduler(db_path, ReviewScheduler::default())
    }

    /// Open (or create) the store with a custom scheduler
    pub fn with_scheduler(db_path: Option<PathBuf>, scheduler: ReviewScheduler) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "lexis", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("lexis.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            scheduler,
        })
    }

    pub fn scheduler(&self) -> &ReviewScheduler {
        &self.scheduler
    }

    /// Create and persist a new card
    pub fn add_card(
        &self,
        user_id: &str,
        word_id: &str,
        topic_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let mut card = Flashcard::new(user_id, word_id, now);
        card.topic_id = topic_id.map(str::to_string);
        self.create_card(&card)?;
        Ok(card)
    }

    /// Persist an existing card value (fails if the id is taken)
    pub fn create_card(&self, card: &Flashcard) -> Result<()> {
        let model_json = encode_model(card.memory_model)?;
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;

        writer.execute(
            "INSERT INTO flashcards (
                id, user_id, word_id, topic_id, created_at, updated_at,
                status, next_review_at, last_reviewed_at, ease_factor,
                interval_days, repetitions, memory_model
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                card.id,
                card.user_id,
                card.word_id,
                card.topic_id,
                format_timestamp(card.created_at),
                format_timestamp(Utc::now()),
                card.status.as_str(),
                format_timestamp(card.next_review_at),
                card.last_reviewed_at.map(format_timestamp),
                card.ease_factor,
                card.interval_days,
                card.repetitions,
                model_json,
            ],
        )?;
        Ok(())
    }

    /// Get a card by id
    pub fn get_card(&self, id: &str) -> Result<Option<Flashcard>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let card = reader
            .query_row(
                "SELECT * FROM flashcards WHERE id = ?1",
                params![id],
                |row| Self::row_to_card(row),
            )
            .optional()?;
        Ok(card)
    }

    /// Load, schedule, and store a review in one transaction.
    ///
    /// If scheduling fails the transaction rolls back and the stored card is
    /// unchanged.
    pub fn review_card(
        &self,
        id: &str,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;

        // IMMEDIATE holds the database write lock from the read onward, so
        // reviews of one card from any connection never interleave.
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let card = tx
            .query_row(
                "SELECT * FROM flashcards WHERE id = ?1",
                params![id],
                |row| Self::row_to_card(row),
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let elapsed_days = self.scheduler.elapsed_days(&card, now);
        let updated = self.scheduler.submit_review(&card, outcome, now)?;
        let model_json = encode_model(updated.memory_model)?;

        tx.execute(
            "UPDATE flashcards SET
                status = ?1,
                next_review_at = ?2,
                last_reviewed_at = ?3,
                ease_factor = ?4,
                interval_days = ?5,
                repetitions = ?6,
                memory_model = ?7,
                updated_at = ?8
            WHERE id = ?9",
            params![
                updated.status.as_str(),
                format_timestamp(updated.next_review_at),
                updated.last_reviewed_at.map(format_timestamp),
                updated.ease_factor,
                updated.interval_days,
                updated.repetitions,
                model_json,
                format_timestamp(now),
                id,
            ],
        )?;

        tx.execute(
            "INSERT INTO review_log (
                card_id, rating, response_time_ms, occurred_at, reviewed_at,
                elapsed_days, interval_days, status_after
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                outcome.rating.as_str(),
                i64::try_from(outcome.response_time_ms).unwrap_or(i64::MAX),
                format_timestamp(outcome.occurred_at),
                format_timestamp(now),
                elapsed_days,
                updated.interval_days,
                updated.status.as_str(),
            ],
        )?;

        tx.commit()?;
        Ok(updated)
    }

    /// Cards of `user_id` due at `now`, most overdue first
    pub fn due_cards(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Flashcard>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let mut stmt = reader.prepare(
            "SELECT * FROM flashcards
             WHERE user_id = ?1 AND next_review_at <= ?2
             ORDER BY next_review_at ASC
             LIMIT ?3",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let cards = stmt
            .query_map(params![user_id, format_timestamp(now), limit], |row| {
                Self::row_to_card(row)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Review log of a card, oldest first
    pub fn review_history(&self, card_id: &str) -> Result<Vec<ReviewRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let mut stmt = reader.prepare(
            "SELECT * FROM review_log WHERE card_id = ?1 ORDER BY reviewed_at ASC, id ASC",
        )?;

        let records = stmt
            .query_map(params![card_id], |row| Self::row_to_record(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Delete a card and its review log. Returns false if it did not exist.
    pub fn delete_card(&self, id: &str) -> Result<bool> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let deleted = writer.execute("DELETE FROM flashcards WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Convert a row to Flashcard
    fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<Flashcard> {
        let created_at: String = row.get("created_at")?;
        let next_review_at: String = row.get("next_review_at")?;
        let last_reviewed_at: Option<String> = row.get("last_reviewed_at")?;
        let status: String = row.get("status")?;
        let memory_model: Option<String> = row.get("memory_model")?;
        let id: String = row.get("id")?;

        let memory_model = match memory_model {
            Some(json) => Some(serde_json::from_str::<MemoryModel>(&json).map_err(|e| {
                tracing::warn!("Failed to decode memory model for {}: {}", id, e);
                conversion_error(format!("Invalid memory model '{}': {}", json, e))
            })?),
            None => None,
        };

        Ok(Flashcard {
            user_id: row.get("user_id")?,
            word_id: row.get("word_id")?,
            topic_id: row.get("topic_id")?,
            created_at: parse_timestamp(&created_at, "created_at")?,
            status: status.parse::<CardStatus>().map_err(conversion_error)?,
            next_review_at: parse_timestamp(&next_review_at, "next_review_at")?,
            last_reviewed_at: last_reviewed_at
                .map(|s| parse_timestamp(&s, "last_reviewed_at"))
                .transpose()?,
            ease_factor: row.get("ease_factor")?,
            interval_days: row.get("interval_days")?,
            repetitions: row.get("repetitions")?,
            memory_model,
            id,
        })
    }

    /// Convert a row to ReviewRecord
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ReviewRecord> {
        let rating: String = row.get("rating")?;
        let status_after: String = row.get("status_after")?;
        let occurred_at: String = row.get("occurred_at")?;
        let reviewed_at: String = row.get("reviewed_at")?;
        let response_time_ms: i64 = row.get("response_time_ms")?;

        Ok(ReviewRecord {
            id: row.get("id")?,
            card_id: row.get("card_id")?,
            rating: rating.parse::<Rating>().map_err(conversion_error)?,
            response_time_ms: u64::try_from(response_time_ms).unwrap_or(0),
            occurred_at: parse_timestamp(&occurred_at, "occurred_at")?,
            reviewed_at: parse_timestamp(&reviewed_at, "reviewed_at")?,
            elapsed_days: row.get("elapsed_days")?,
            interval_days: row.get("interval_days")?,
            status_after: status_after.parse::<CardStatus>().map_err(conversion_error)?,
        })
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Fixed-width RFC3339 so timestamps sort lexicographically
fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse RFC3339 timestamp
fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(format!("Invalid {} timestamp '{}': {}", field_name, value, e)))
}

fn conversion_error(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

fn encode_model(model: Option<MemoryModel>) -> Result<Option<String>> {
    Ok(model.map(|m| serde_json::to_string(&m)).transpose()?)
}

// ============================================================================
// TESTS
// ============================================================================
