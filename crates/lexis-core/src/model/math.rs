//! Log-space helpers and bracketed root finding
//!
//! The memory model never needs the Beta function itself, only differences of
//! its logarithm, so everything here stays in log-space. Gamma-family
//! functions come from `statrs`.

use statrs::function::beta::checked_ln_beta;

use super::ModelError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Geometric bracket growth factor
const BRACKET_GROWTH: f64 = 2.0;

/// Doubling/halving steps before giving up. 2^1100 spans the whole f64 range.
const MAX_BRACKET_STEPS: usize = 1100;

/// Bisection stops once the bracket is this narrow relative to the midpoint
pub const ROOT_TOLERANCE: f64 = 1e-12;

/// Hard cap on bisection iterations
const MAX_BISECTION_ITERATIONS: usize = 200;

// ============================================================================
// LOG-SPACE
// ============================================================================

/// ln B(a, b), or NaN outside `a, b > 0`
pub fn ln_beta(a: f64, b: f64) -> f64 {
    checked_ln_beta(a, b).unwrap_or(f64::NAN)
}

/// ln(Σ sign·exp(ln_magnitude)) over signed terms.
///
/// Returns `None` when the sum is not strictly positive or not finite.
pub fn log_sum_exp_signed(terms: &[(f64, f64)]) -> Option<f64> {
    let max = terms
        .iter()
        .map(|&(_, l)| l)
        .filter(|l| !l.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return None;
    }

    let sum: f64 = terms.iter().map(|&(sign, l)| sign * (l - max).exp()).sum();
    if sum > 0.0 && sum.is_finite() {
        Some(max + sum.ln())
    } else {
        None
    }
}

// ============================================================================
// ROOT FINDING
// ============================================================================

/// Find `[low, high]` with `f(low) >= 0 >= f(high)` for a decreasing `f` on
/// `(0, ∞)`, growing geometrically outward from `init`.
pub fn find_bracket<F>(f: &F, init: f64) -> Result<(f64, f64), ModelError>
where
    F: Fn(f64) -> f64,
{
    if !(init.is_finite() && init > 0.0) {
        return Err(ModelError::Convergence(format!(
            "invalid starting point for bracket search: {}",
            init
        )));
    }

    let mut low = init / BRACKET_GROWTH;
    let mut high = init * BRACKET_GROWTH;
    let mut f_low = f(low);
    let mut f_high = f(high);
    let mut steps = 0;

    while f_low > 0.0 && f_high > 0.0 {
        low = high;
        f_low = f_high;
        high *= BRACKET_GROWTH;
        f_high = f(high);
        steps += 1;
        if steps > MAX_BRACKET_STEPS || !high.is_finite() {
            return Err(ModelError::Convergence(format!(
                "no sign change below {:e} after {} doublings",
                high, steps
            )));
        }
    }

    while f_low < 0.0 && f_high < 0.0 {
        high = low;
        f_high = f_low;
        low /= BRACKET_GROWTH;
        f_low = f(low);
        steps += 1;
        if steps > MAX_BRACKET_STEPS || low <= 0.0 {
            return Err(ModelError::Convergence(format!(
                "no sign change above {:e} after {} halvings",
                low, steps
            )));
        }
    }

    // NaN lands here too
    if !(f_low >= 0.0 && f_high <= 0.0) {
        return Err(ModelError::Convergence(format!(
            "bracket [{:e}, {:e}] does not straddle a root (f = {}, {})",
            low, high, f_low, f_high
        )));
    }

    Ok((low, high))
}

/// Geometric bisection inside a bracket produced by [`find_bracket`]
pub fn bisect<F>(f: &F, low: f64, high: f64) -> Result<f64, ModelError>
where
    F: Fn(f64) -> f64,
{
    let (mut low, mut high) = (low, high);

    for _ in 0..MAX_BISECTION_ITERATIONS {
        let mid = low * (high / low).sqrt();
        if high - low <= ROOT_TOLERANCE * mid {
            return Ok(mid);
        }

        let f_mid = f(mid);
        if f_mid.is_nan() {
            return Err(ModelError::Convergence(format!(
                "objective is undefined at {:e}",
                mid
            )));
        }
        if f_mid == 0.0 {
            return Ok(mid);
        }
        if f_mid > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }

    Err(ModelError::Convergence(format!(
        "bisection did not converge within {} iterations (bracket [{:e}, {:e}])",
        MAX_BISECTION_ITERATIONS, low, high
    )))
}

// ============================================================================
// TESTS
// ============================================================================
