//! Review scheduler - pure function from (card, outcome, now) to a new card

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::SchedulerConfig;
use crate::card::{CardStatus, Flashcard, Rating, ReviewOutcome};
use crate::model::{MemoryModel, ModelError, Result};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Fractional days from `from` to `to` (negative if `to` is earlier)
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    to.signed_duration_since(from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Convert an interval in days to a duration, rounding up to whole
/// milliseconds so any positive interval lands strictly in the future
pub fn interval_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * MILLIS_PER_DAY).ceil() as i64)
}

/// Repetitions and status after a review with `rating`
pub fn next_status(repetitions: u32, rating: Rating, mastery_threshold: u32) -> (u32, CardStatus) {
    if !rating.is_pass() {
        return (0, CardStatus::New);
    }

    let repetitions = repetitions.saturating_add(1);
    let status = if repetitions > mastery_threshold {
        CardStatus::Mastered
    } else {
        CardStatus::Learning
    };
    (repetitions, status)
}

/// What each rating would do to a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub forgot: Flashcard,
    pub hard: Flashcard,
    pub easy: Flashcard,
}

/// Half-life based review scheduler
#[derive(Debug, Clone, Default)]
pub struct ReviewScheduler {
    config: SchedulerConfig,
}

impl ReviewScheduler {
    /// Create a scheduler, validating the configuration first
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Days since the card was last reviewed, floored at `min_elapsed_days`.
    ///
    /// Never-reviewed cards count from creation, or from `now` when
    /// `anchor_first_review_at_creation` is off.
    pub fn elapsed_days(&self, card: &Flashcard, now: DateTime<Utc>) -> f64 {
        let anchor = match card.last_reviewed_at {
            Some(last) => last,
            None if self.config.anchor_first_review_at_creation => card.created_at,
            None => now,
        };
        days_between(anchor, now).max(self.config.min_elapsed_days)
    }

    /// Apply one review and return the updated card.
    ///
    /// The input card is untouched; on error nothing has been applied.
    pub fn submit_review(
        &self,
        card: &Flashcard,
        outcome: &ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<Flashcard> {
        let elapsed_days = self.elapsed_days(card, now);

        let base_model = match card.memory_model {
            Some(model) => model,
            None => MemoryModel::with_prior(
                elapsed_days,
                self.config.initial_alpha,
                self.config.initial_alpha,
            )?,
        };

        let successes = u32::from(outcome.rating.is_pass());
        let updated_model = base_model.update(successes, 1, elapsed_days)?;

        let interval_days = updated_model
            .half_life(self.config.target_recall)?
            .min(self.config.max_interval_days);

        let (repetitions, status) =
            next_status(card.repetitions, outcome.rating, self.config.mastery_threshold);

        let next_review_at = now
            .checked_add_signed(interval_to_duration(interval_days))
            .ok_or_else(|| {
                ModelError::Domain(format!(
                    "interval of {} days overflows the review timestamp",
                    interval_days
                ))
            })?;

        tracing::debug!(
            card_id = %card.id,
            rating = %outcome.rating,
            elapsed_days,
            interval_days,
            status = %status,
            "Review scheduled"
        );

        Ok(Flashcard {
            status,
            repetitions,
            interval_days,
            last_reviewed_at: Some(now),
            next_review_at,
            memory_model: Some(updated_model),
            ..card.clone()
        })
    }

    /// Outcome of every rating for `card` reviewed at `now`
    pub fn preview(&self, card: &Flashcard, now: DateTime<Utc>) -> Result<PreviewResults> {
        let review = |rating| self.submit_review(card, &ReviewOutcome::new(rating, 0, now), now);
        Ok(PreviewResults {
            forgot: review(Rating::Forgot)?,
            hard: review(Rating::Hard)?,
            easy: review(Rating::Easy)?,
        })
    }

    /// Predicted recall probability for `card` at `now` (1.0 before the first review)
    pub fn current_recall(&self, card: &Flashcard, now: DateTime<Utc>) -> Result<f64> {
        let (Some(model), Some(last)) = (card.memory_model, card.last_reviewed_at) else {
            return Ok(1.0);
        };
        model.predict_recall(days_between(last, now).max(0.0), true)
    }
}

// ============================================================================
// TESTS
// ============================================================================
