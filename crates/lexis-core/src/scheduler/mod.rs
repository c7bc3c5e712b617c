//! Review Scheduler Module
//!
//! Turns one review into an updated card:
//! 1. elapsed days since the last review (floored at a tiny epsilon)
//! 2. memory model update with a binary pass/fail signal
//! 3. next interval = half-life of the updated model
//! 4. status/repetition bookkeeping
//!
//! ## Status transitions:
//! - new --pass--> learning --pass, reps > threshold--> mastered
//! - any --forgot--> new (repetitions reset to 0)

mod config;
mod review;

pub use config::{
    SchedulerConfig, DEFAULT_MASTERY_THRESHOLD, MAX_INTERVAL_DAYS, MIN_ELAPSED_DAYS,
};
pub use review::{days_between, interval_to_duration, next_status, PreviewResults, ReviewScheduler};
