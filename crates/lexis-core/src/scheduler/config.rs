//! Scheduler configuration

use serde::{Deserialize, Serialize};

use crate::model::{ModelError, DEFAULT_ALPHA, DEFAULT_PERCENTILE, MAX_SHAPE, MIN_SHAPE};

/// Smallest elapsed time fed to the memory model, in days
pub const MIN_ELAPSED_DAYS: f64 = 1e-6;

/// Longest interval the scheduler will hand out (100 years)
pub const MAX_INTERVAL_DAYS: f64 = 36_500.0;

/// Repetitions a card must exceed to count as mastered
pub const DEFAULT_MASTERY_THRESHOLD: u32 = 5;

/// Tunable scheduler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    /// Recall probability at which the next review is scheduled
    pub target_recall: f64,
    /// `mastered` once repetitions exceed this
    pub mastery_threshold: u32,
    /// Floor for elapsed time (the model needs elapsed > 0)
    pub min_elapsed_days: f64,
    /// Ceiling for the scheduled interval
    pub max_interval_days: f64,
    /// Beta shape used for a card's first model
    pub initial_alpha: f64,
    /// Measure a card's first review from its creation time instead of
    /// treating it as zero elapsed
    pub anchor_first_review_at_creation: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_recall: DEFAULT_PERCENTILE,
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
            min_elapsed_days: MIN_ELAPSED_DAYS,
            max_interval_days: MAX_INTERVAL_DAYS,
            initial_alpha: DEFAULT_ALPHA,
            anchor_first_review_at_creation: true,
        }
    }
}

impl SchedulerConfig {
    /// Defaults overlaid with `LEXIS_TARGET_RECALL`, `LEXIS_MASTERY_THRESHOLD`
    /// and `LEXIS_MAX_INTERVAL_DAYS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SchedulerConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = parse_var(&lookup, "LEXIS_TARGET_RECALL") {
            config.target_recall = value;
        }
        if let Some(value) = parse_var(&lookup, "LEXIS_MASTERY_THRESHOLD") {
            config.mastery_threshold = value;
        }
        if let Some(value) = parse_var(&lookup, "LEXIS_MAX_INTERVAL_DAYS") {
            config.max_interval_days = value;
        }

        if let Err(e) = config.validate() {
            tracing::warn!("Ignoring scheduler overrides from environment: {}", e);
            return Self::default();
        }
        config
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.target_recall > 0.0 && self.target_recall < 1.0) {
            return Err(ModelError::Domain(format!(
                "target_recall must lie in (0, 1), got {}",
                self.target_recall
            )));
        }
        if !(self.min_elapsed_days.is_finite() && self.min_elapsed_days > 0.0) {
            return Err(ModelError::Domain(format!(
                "min_elapsed_days must be positive, got {}",
                self.min_elapsed_days
            )));
        }
        if !(self.max_interval_days.is_finite() && self.max_interval_days > 0.0) {
            return Err(ModelError::Domain(format!(
                "max_interval_days must be positive, got {}",
                self.max_interval_days
            )));
        }
        if !(MIN_SHAPE..=MAX_SHAPE).contains(&self.initial_alpha) {
            return Err(ModelError::Domain(format!(
                "initial_alpha must lie in [{}, {}], got {}",
                MIN_SHAPE, MAX_SHAPE, self.initial_alpha
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
