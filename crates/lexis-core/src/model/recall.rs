//! Recall model: Beta prior propagated through exponential forgetting

use serde::{Deserialize, Serialize};
use statrs::function::factorial::ln_binomial;
use statrs::function::gamma::digamma;

use super::math::{bisect, find_bracket, ln_beta, log_sum_exp_signed};
use super::{ModelError, Result};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default Beta shape for a brand-new model (symmetric, mildly informative)
pub const DEFAULT_ALPHA: f64 = 4.0;

/// Recall probability that defines the half-life
pub const DEFAULT_PERCENTILE: f64 = 0.5;

/// Smallest alpha or beta a model may have.
///
/// Below this a lopsided model puts its half-life past 2^(1/beta) reference
/// times and the root searches run out of range.
pub const MIN_SHAPE: f64 = 0.1;

/// Largest alpha or beta a model may have
pub const MAX_SHAPE: f64 = 1e4;

// ============================================================================
// UPDATE OPTIONS
// ============================================================================

/// Knobs for [`MemoryModel::update_with`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateOptions {
    /// Re-pin the reference time to the posterior half-life (keeps alpha ≈ beta)
    pub rebalance: bool,
    /// Probability of a pass even though the fact was forgotten.
    /// Only used for single-review updates (`total == 1`).
    pub q0: Option<f64>,
    /// Reference time for the posterior when not rebalancing.
    /// Defaults to the prior's reference time.
    pub tback: Option<f64>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            rebalance: true,
            q0: None,
            tback: None,
        }
    }
}

// ============================================================================
// MEMORY MODEL
// ============================================================================

/// Belief about how fast one fact is forgotten.
///
/// Recall probability at time `t` is Beta(alpha, beta). The triple is the
/// whole persisted state and serializes as `[alpha, beta, t]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 3]", try_from = "[f64; 3]")]
pub struct MemoryModel {
    alpha: f64,
    beta: f64,
    t: f64,
}

impl MemoryModel {
    /// Build a model from raw parameters.
    ///
    /// `alpha` and `beta` must lie in `[MIN_SHAPE, MAX_SHAPE]`; `t` must be
    /// finite and positive.
    pub fn new(alpha: f64, beta: f64, t: f64) -> Result<Self> {
        for (name, value) in [("alpha", alpha), ("beta", beta)] {
            if !(MIN_SHAPE..=MAX_SHAPE).contains(&value) {
                return Err(ModelError::Domain(format!(
                    "{} must lie in [{}, {}], got {}",
                    name, MIN_SHAPE, MAX_SHAPE, value
                )));
            }
        }
        if !(t.is_finite() && t > 0.0) {
            return Err(ModelError::Domain(format!(
                "t must be finite and positive, got {}",
                t
            )));
        }
        Ok(Self { alpha, beta, t })
    }

    /// Default prior: Beta(4, 4), i.e. 50% recall at `initial_half_life`
    pub fn initialize(initial_half_life: f64) -> Result<Self> {
        Self::with_prior(initial_half_life, DEFAULT_ALPHA, DEFAULT_ALPHA)
    }

    /// Prior with explicit shape parameters
    pub fn with_prior(initial_half_life: f64, alpha: f64, beta: f64) -> Result<Self> {
        Self::new(alpha, beta, initial_half_life)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Reference time at which Beta(alpha, beta) describes recall
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Persisted `[alpha, beta, t]` form
    pub fn to_array(&self) -> [f64; 3] {
        [self.alpha, self.beta, self.t]
    }

    /// Decode the persisted `[alpha, beta, t]` form
    pub fn from_array(values: [f64; 3]) -> Result<Self> {
        Self::new(values[0], values[1], values[2])
    }

    /// Expected recall probability after `elapsed` time units.
    ///
    /// `exact = true` evaluates E[p^δ] through the Beta function.
    /// `exact = false` uses exp(δ·E[ln p]), a cheaper lower bound that shares
    /// the same ordering over elapsed time.
    pub fn predict_recall(&self, elapsed: f64, exact: bool) -> Result<f64> {
        if elapsed.is_nan() || elapsed < 0.0 {
            return Err(ModelError::Domain(format!(
                "elapsed time must be non-negative, got {}",
                elapsed
            )));
        }

        let delta = elapsed / self.t;
        if delta == 0.0 {
            return Ok(1.0);
        }
        if !delta.is_finite() {
            return Ok(0.0);
        }

        let log_recall = if exact {
            ln_beta(self.alpha + delta, self.beta) - ln_beta(self.alpha, self.beta)
        } else {
            delta * (digamma(self.alpha) - digamma(self.alpha + self.beta))
        };

        let recall = log_recall.exp();
        if recall.is_nan() {
            Ok(0.0)
        } else {
            Ok(recall.clamp(0.0, 1.0))
        }
    }

    /// Posterior after `successes` passes out of `total` reviews at `elapsed`,
    /// with rebalancing enabled.
    pub fn update(&self, successes: u32, total: u32, elapsed: f64) -> Result<Self> {
        self.update_with(successes, total, elapsed, &UpdateOptions::default())
    }

    /// Bayesian update with explicit options.
    ///
    /// The exact posterior is not Beta, so its first two moments at the new
    /// reference time are computed in closed form and a Beta is refit to them.
    pub fn update_with(
        &self,
        successes: u32,
        total: u32,
        elapsed: f64,
        options: &UpdateOptions,
    ) -> Result<Self> {
        if total < 1 {
            return Err(ModelError::Domain("total must be at least 1".to_string()));
        }
        if successes > total {
            return Err(ModelError::Domain(format!(
                "successes ({}) cannot exceed total ({})",
                successes, total
            )));
        }
        if !(elapsed.is_finite() && elapsed > 0.0) {
            return Err(ModelError::Domain(format!(
                "elapsed time must be positive, got {}",
                elapsed
            )));
        }
        if let Some(q0) = options.q0 {
            if !(0.0..=1.0).contains(&q0) {
                return Err(ModelError::Domain(format!("q0 must lie in [0, 1], got {}", q0)));
            }
        }
        if let Some(tback) = options.tback {
            if !(tback.is_finite() && tback > 0.0) {
                return Err(ModelError::Domain(format!("tback must be positive, got {}", tback)));
            }
        }

        let (alpha, beta) = (self.alpha, self.beta);
        let delta = elapsed / self.t;
        let terms = evidence_terms(successes, total, options.q0);

        // ln ∫ p^(n·δ·et) · likelihood · prior, up to the prior's normalizer
        let unnormalized = |n: f64, et: f64| -> Option<f64> {
            let shifted: Vec<(f64, f64)> = terms
                .iter()
                .map(|term| {
                    let a = alpha + delta * term.exponent + n * delta * et;
                    (term.sign, term.ln_weight + ln_beta(a, beta))
                })
                .collect();
            log_sum_exp_signed(&shifted)
        };

        let log_normalizer = unnormalized(0.0, 0.0).ok_or_else(|| {
            ModelError::Convergence(format!(
                "posterior normalizer vanished ({} of {} at elapsed {})",
                successes, total, elapsed
            ))
        })?;
        let log_moment = |n: f64, et: f64| unnormalized(n, et).map(|l| l - log_normalizer);

        let tback = if options.rebalance {
            let target = DEFAULT_PERCENTILE.ln();
            let objective = |et: f64| log_moment(1.0, et).map_or(f64::NAN, |l| l - target);
            let (low, high) = find_bracket(&objective, 1.0 / delta)?;
            bisect(&objective, low, high)? * elapsed
        } else {
            options.tback.unwrap_or(self.t)
        };
        let et = tback / elapsed;

        let (Some(log_mean), Some(log_second)) = (log_moment(1.0, et), log_moment(2.0, et)) else {
            return Err(ModelError::Convergence(format!(
                "posterior moments are not positive at reference time {}",
                tback
            )));
        };

        let mean = log_mean.exp();
        let variance = log_second.exp() - (2.0 * log_mean).exp();
        let (new_alpha, new_beta) = mean_variance_to_beta(mean, variance)?;

        Self::new(new_alpha, new_beta, tback).map_err(|e| {
            ModelError::Convergence(format!("refit produced an invalid model: {}", e))
        })
    }

    /// Elapsed time at which predicted recall drops to `percentile`
    /// (0.5 gives the half-life).
    pub fn half_life(&self, percentile: f64) -> Result<f64> {
        if !(percentile > 0.0 && percentile < 1.0) {
            return Err(ModelError::Domain(format!(
                "percentile must lie in (0, 1), got {}",
                percentile
            )));
        }

        let ln_prior = ln_beta(self.alpha, self.beta);
        let target = percentile.ln();
        let objective = |delta: f64| ln_beta(self.alpha + delta, self.beta) - ln_prior - target;

        let (low, high) = find_bracket(&objective, 1.0)?;
        let half_life = bisect(&objective, low, high)? * self.t;

        if half_life.is_finite() && half_life > 0.0 {
            Ok(half_life)
        } else {
            Err(ModelError::Convergence(format!(
                "half-life at percentile {} is out of range: {}",
                percentile, half_life
            )))
        }
    }
}

impl From<MemoryModel> for [f64; 3] {
    fn from(model: MemoryModel) -> Self {
        model.to_array()
    }
}

impl TryFrom<[f64; 3]> for MemoryModel {
    type Error = ModelError;

    fn try_from(values: [f64; 3]) -> Result<Self> {
        Self::from_array(values)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// One signed term of the review likelihood, expanded as Σ w·p^(δ·exponent)
struct EvidenceTerm {
    sign: f64,
    ln_weight: f64,
    exponent: f64,
}

fn evidence_terms(successes: u32, total: u32, q0: Option<f64>) -> Vec<EvidenceTerm> {
    if let (1, Some(q0)) = (total, q0) {
        // Noisy single review: remembered -> pass, forgotten -> pass with probability q0.
        // Pass: (1 - q0)·p^δ + q0. Fail: (1 - q0)·(1 - p^δ).
        let (remembered, forgotten) = if successes == 1 {
            (1.0 - q0, q0)
        } else {
            (q0 - 1.0, 1.0 - q0)
        };
        return [(remembered, 1.0), (forgotten, 0.0)]
            .into_iter()
            .filter(|&(weight, _)| weight != 0.0)
            .map(|(weight, exponent)| EvidenceTerm {
                sign: weight.signum(),
                ln_weight: weight.abs().ln(),
                exponent,
            })
            .collect();
    }

    // (1 - p^δ)^failures expanded binomially
    let failures = total - successes;
    (0..=failures)
        .map(|i| EvidenceTerm {
            sign: if i % 2 == 0 { 1.0 } else { -1.0 },
            ln_weight: ln_binomial(u64::from(failures), u64::from(i)),
            exponent: f64::from(successes + i),
        })
        .collect()
}

/// Beta shapes with the given mean and variance, clamped to [MIN_SHAPE, MAX_SHAPE]
fn mean_variance_to_beta(mean: f64, variance: f64) -> Result<(f64, f64)> {
    if !(mean.is_finite() && variance.is_finite()) {
        return Err(ModelError::Convergence(format!(
            "posterior moments are not finite (mean {}, variance {})",
            mean, variance
        )));
    }

    let concentration = if variance > 0.0 {
        mean * (1.0 - mean) / variance - 1.0
    } else {
        f64::INFINITY
    };

    Ok((
        clamp_shape(mean * concentration),
        clamp_shape((1.0 - mean) * concentration),
    ))
}

fn clamp_shape(value: f64) -> f64 {
    if value.is_nan() {
        MIN_SHAPE
    } else {
        value.clamp(MIN_SHAPE, MAX_SHAPE)
    }
}

// ============================================================================
// TESTS
// ============================================================================
