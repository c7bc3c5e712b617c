//! Flashcard - one word a user is learning, plus its scheduling state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CardStatus;
use crate::model::MemoryModel;

/// Ease factor given to new cards. Carried for schema compatibility only.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// A flashcard owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    /// Unique identifier (UUID v4)
    pub id: String,
    pub user_id: String,
    /// The word this card drills
    pub word_id: String,
    pub topic_id: Option<String>,
    pub created_at: DateTime<Utc>,

    // ========== Scheduling ==========
    pub status: CardStatus,
    pub next_review_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Legacy SM-2 field, never read by the scheduler
    pub ease_factor: f64,
    /// Current interval in days
    pub interval_days: f64,
    /// Consecutive passes since the last forgotten review
    pub repetitions: u32,
    /// Persisted as `[alpha, beta, t]`, absent until the first review
    pub memory_model: Option<MemoryModel>,
}

impl Flashcard {
    /// Create a new, immediately due card
    pub fn new(user_id: impl Into<String>, word_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            word_id: word_id.into(),
            topic_id: None,
            created_at: now,
            status: CardStatus::New,
            next_review_at: now,
            last_reviewed_at: None,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 0.0,
            repetitions: 0,
            memory_model: None,
        }
    }

    /// Attach the card to a topic
    pub fn with_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    /// Check if this card is due for review at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    /// True until the first review has been recorded
    pub fn is_unreviewed(&self) -> bool {
        self.last_reviewed_at.is_none()
    }
}
