//! Memory Model Module
//!
//! Bayesian model of how quickly a single fact is forgotten.
//!
//! Recall probability at a reference time `t` is Beta(alpha, beta)
//! distributed. The forgetting curve is exponential, so recall after
//! `elapsed` is `p^(elapsed / t)`. Reviews are binomial observations; the
//! exact posterior is refit to a Beta by moment matching.
//!
//! ## Core Formulas:
//! - Recall: E[p^δ] = B(alpha + δ, beta) / B(alpha, beta), δ = elapsed / t
//! - Half-life: the elapsed time where E[p^δ] = 0.5 (found numerically)
//! - Refit: alpha' = μ·(μ(1-μ)/σ² - 1), beta' = (1-μ)·(μ(1-μ)/σ² - 1)

mod math;
mod recall;

pub use math::{ln_beta, ROOT_TOLERANCE};
pub use recall::{
    MemoryModel, UpdateOptions, DEFAULT_ALPHA, DEFAULT_PERCENTILE, MAX_SHAPE, MIN_SHAPE,
};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Memory model error type
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// A caller broke a precondition (negative elapsed time, bad counts, ...)
    #[error("Domain error: {0}")]
    Domain(String),
    /// A numeric search failed to bracket or converge
    #[error("Convergence error: {0}")]
    Convergence(String),
}

/// Memory model result type
pub type Result<T> = std::result::Result<T, ModelError>;
