//! Projection onto a symmetric box intersected with one linear equality
//!
//! Solves the continuous knapsack problem
//!
//! ```text
//! minimise ‖w − v‖²   subject to   −C ≤ wᵢ ≤ C,   Σ wᵢ = s
//! ```
//!
//! The minimiser is `wᵢ = clip(vᵢ − μ*, −C, C)` for a unique multiplier μ*.
//! `h(μ) = Σ clip(vᵢ − μ, −C, C)` is continuous, piecewise linear and
//! non-increasing with breakpoints at `vᵢ − C` and `vᵢ + C`, so μ* is found
//! by discarding breakpoints around successive medians until the bracket
//! holds no breakpoint, then interpolating on the remaining linear piece.

use crate::core::{Result, SVRError};

/// Clip `x` into `[-bound, bound]`
#[inline]
fn clip(x: f64, bound: f64) -> f64 {
    x.clamp(-bound, bound)
}

/// `h(μ) = Σ clip(vᵢ − μ, −C, C)`
pub fn clipped_sum(values: &[f64], bound: f64, mu: f64) -> f64 {
    values.iter().map(|&v| clip(v - mu, bound)).sum()
}

fn shifted_clip(values: &[f64], bound: f64, mu: f64) -> Vec<f64> {
    values.iter().map(|&v| clip(v - mu, bound)).collect()
}

/// Upper median of `candidates` (the element at `len / 2` in sorted order)
///
/// Reorders `candidates` in place; `candidates` must be non-empty.
fn upper_median(candidates: &mut [f64]) -> f64 {
    let mid = candidates.len() / 2;
    let (_, median, _) = candidates.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *median
}

/// Project `values` onto `{w : −C ≤ wᵢ ≤ C, Σ wᵢ = target}`
///
/// # Errors
/// Returns `SVRError::InvalidParameter` when `bound` is not a positive finite
/// number, when an input is not finite, when the constraint set is empty
/// (`|target| > n·C`), or when the final bracket is degenerate.
pub fn project_box_equality(values: &[f64], bound: f64, target: f64) -> Result<Vec<f64>> {
    if !(bound.is_finite() && bound > 0.0) {
        return Err(SVRError::InvalidParameter(format!(
            "Box bound must be positive and finite, got: {bound}"
        )));
    }
    if !target.is_finite() {
        return Err(SVRError::InvalidParameter(format!(
            "Equality target must be finite, got: {target}"
        )));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(SVRError::InvalidParameter(format!(
            "Cannot project a vector with non-finite entry {bad}"
        )));
    }
    let capacity = bound * values.len() as f64;
    if target.abs() > capacity {
        return Err(SVRError::InvalidParameter(format!(
            "Equality target {target} is outside the reachable range [-{capacity}, {capacity}]"
        )));
    }
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<f64> = values
        .iter()
        .flat_map(|&v| [v - bound, v + bound])
        .collect();
    // Largest μ seen with h(μ) > target, smallest μ seen with h(μ) < target
    let mut mu_lower = f64::INFINITY;
    let mut mu_upper = f64::NEG_INFINITY;
    let mut h_lower = f64::NAN;
    let mut h_upper = f64::NAN;

    while !candidates.is_empty() {
        let mu = upper_median(&mut candidates);
        let h = clipped_sum(values, bound, mu);

        if h == target {
            return Ok(shifted_clip(values, bound, mu));
        } else if h > target {
            // Root lies above μ
            mu_lower = mu;
            h_lower = h;
            candidates.retain(|&m| m > mu);
        } else {
            mu_upper = mu;
            h_upper = h;
            candidates.retain(|&m| m < mu);
        }
    }

    // |target| == n·C can miss the extreme breakpoint by rounding; the
    // extreme breakpoint is then the answer.
    if mu_lower.is_infinite() && mu_upper.is_finite() {
        return Ok(shifted_clip(values, bound, mu_upper));
    }
    if mu_upper.is_infinite() && mu_lower.is_finite() {
        return Ok(shifted_clip(values, bound, mu_lower));
    }
    if mu_lower >= mu_upper || h_lower == h_upper {
        return Err(SVRError::InvalidParameter(format!(
            "Degenerate projection bracket [{mu_lower}, {mu_upper}]"
        )));
    }

    // h is affine on [μ_L, μ_U]
    let mu = mu_lower + (target - h_lower) * (mu_upper - mu_lower) / (h_upper - h_lower);
    Ok(shifted_clip(values, bound, mu))
}
