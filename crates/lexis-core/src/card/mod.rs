//! Card module - Flashcards and review outcomes
//!
//! Plain values only. The scheduler never mutates a card in place; it
//! returns a new one for the caller to persist.

mod flashcard;

pub use flashcard::Flashcard;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CARD STATUS
// ============================================================================

/// Coarse learning status of a card
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Never passed, or forgotten since the last pass
    #[default]
    New,
    /// Passed at least once, not yet mastered
    Learning,
    /// Passed more times in a row than the mastery threshold
    Mastered,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::New => "new",
            CardStatus::Learning => "learning",
            CardStatus::Mastered => "mastered",
        }
    }
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(CardStatus::New),
            "learning" => Ok(CardStatus::Learning),
            "mastered" => Ok(CardStatus::Mastered),
            _ => Err(format!("Unknown card status: {}", s)),
        }
    }
}

// ============================================================================
// RATING
// ============================================================================

/// Learner's self-reported review result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Could not recall the answer
    Forgot,
    /// Recalled with effort
    Hard,
    /// Recalled without effort
    Easy,
}

impl Rating {
    /// Both `Hard` and `Easy` count as a pass for the memory model
    pub fn is_pass(&self) -> bool {
        !matches!(self, Rating::Forgot)
    }

    /// Numeric form used by clients: 1 = forgot, 2 = hard, 3 = easy
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Rating::Forgot),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Easy),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Rating::Forgot => 1,
            Rating::Hard => 2,
            Rating::Easy => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Forgot => "forgot",
            Rating::Hard => "hard",
            Rating::Easy => "easy",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forgot" | "again" | "1" => Ok(Rating::Forgot),
            "hard" | "2" => Ok(Rating::Hard),
            "easy" | "good" | "3" => Ok(Rating::Easy),
            _ => Err(format!("Unknown rating: {}", s)),
        }
    }
}

// ============================================================================
// REVIEW OUTCOME
// ============================================================================

/// One submitted review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewOutcome {
    pub rating: Rating,
    /// How long the learner took to answer
    #[serde(default)]
    pub response_time_ms: u64,
    pub occurred_at: DateTime<Utc>,
}

impl ReviewOutcome {
    pub fn new(rating: Rating, response_time_ms: u64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            rating,
            response_time_ms,
            occurred_at,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
