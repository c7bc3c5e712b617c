//! # Lexis Core
//!
//! Spaced-repetition scheduling for vocabulary flashcards.
//!
//! - **Memory Model**: Beta-distributed recall at a reference time, decaying
//!   exponentially; updated by Bayesian moment matching after every review
//! - **Review Scheduler**: pure `(card, outcome, now) -> card` step that sets
//!   the next review at the model's half-life and tracks new/learning/mastered
//! - **Card Store**: SQLite persistence that applies each review in a single
//!   transaction so concurrent reviews of one card cannot lose updates
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use lexis_core::{Flashcard, Rating, ReviewOutcome, ReviewScheduler};
//!
//! let created = Utc::now() - Duration::days(2);
//! let card = Flashcard::new("user-1", "word-42", created);
//!
//! let now = Utc::now();
//! let scheduler = ReviewScheduler::default();
//! let outcome = ReviewOutcome::new(Rating::Easy, 1800, now);
//! let reviewed = scheduler.submit_review(&card, &outcome, now)?;
//!
//! assert!(reviewed.next_review_at > now);
//! assert_eq!(reviewed.repetitions, 1);
//! # Ok::<(), lexis_core::ModelError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod card;
pub mod model;
pub mod scheduler;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Card types
pub use card::{CardStatus, Flashcard, Rating, ReviewOutcome};

// Memory model
pub use model::{MemoryModel, ModelError, UpdateOptions, DEFAULT_ALPHA, DEFAULT_PERCENTILE};

// Scheduler
pub use scheduler::{PreviewResults, ReviewScheduler, SchedulerConfig};

// Storage layer
pub use storage::{CardStore, Result, ReviewRecord, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        CardStatus, CardStore, Flashcard, MemoryModel, ModelError, Rating, Result,
        ReviewOutcome, ReviewScheduler, SchedulerConfig, StorageError,
    };
}
