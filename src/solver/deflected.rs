//! Deflected subgradient solver for the SVR dual
//!
//! Minimises the epsilon-insensitive SVR dual in its signed form
//!
//! ```text
//! f(β) = ½ βᵀKβ − yᵀβ + ε Σ|βᵢ|,   −C ≤ βᵢ ≤ C,   Σ βᵢ = s
//! ```
//!
//! Each iteration projects a subgradient onto the feasible directions, blends
//! it with the previous direction, steps along the blend and restores
//! feasibility with [`project_box_equality`]. Every iterate also yields a
//! lower bound on the optimum from the linearised objective; the run stops
//! once the best value is within tolerance of the best bound.

use crate::core::{
    GramMatrix, OptimizationTrace, Result, SVRError, SolverConfig, SolverResult, SolverStatus,
    StepSizeRule, TraceEntry,
};
use crate::solver::projection::project_box_equality;
use log::{debug, info};

/// Deflected subgradient solver
pub struct DeflectedSubgradient {
    config: SolverConfig,
}

/// Mutable state of the step-size rule during one run
enum StepState {
    Polyak {
        alpha: f64,
        f_star: f64,
    },
    TargetLevel {
        alpha: f64,
        /// Relative initial gap until calibrated, then the absolute δ
        delta: f64,
        rho: f64,
        patience: usize,
        growth: f64,
        delta_min: f64,
        /// Best value at the last level update
        reference: Option<f64>,
        /// Iterations since the last level update
        since: usize,
    },
    Diminishing {
        a: f64,
    },
    Constant {
        length: f64,
    },
}

impl StepState {
    fn new(rule: &StepSizeRule) -> Self {
        match *rule {
            StepSizeRule::Polyak { alpha, f_star } => Self::Polyak { alpha, f_star },
            StepSizeRule::TargetLevel {
                alpha,
                delta,
                rho,
                patience,
                growth,
                delta_min,
            } => Self::TargetLevel {
                alpha,
                delta,
                rho,
                patience,
                growth,
                delta_min,
                reference: None,
                since: 0,
            },
            StepSizeRule::Diminishing { a } => Self::Diminishing { a },
            StepSizeRule::Constant { length } => Self::Constant { length },
        }
    }

    /// Turn the relative initial level gap into an absolute one
    fn calibrate(&mut self, gap_bound: f64) {
        if let Self::TargetLevel {
            delta, delta_min, ..
        } = self
        {
            *delta = (*delta * gap_bound.max(1.0)).max(*delta_min);
        }
    }

    /// Keep the target level above the certified lower bound
    fn cap_level(&mut self, certified_gap: f64) {
        if let Self::TargetLevel { delta, .. } = self {
            if certified_gap > 0.0 && certified_gap < *delta {
                *delta = certified_gap;
            }
        }
    }

    fn step_size(&self, iteration: usize, objective: f64, f_best: f64, d_norm_sq: f64) -> f64 {
        match *self {
            Self::Polyak { alpha, f_star } => (alpha * (objective - f_star) / d_norm_sq).max(0.0),
            Self::TargetLevel { alpha, delta, .. } => {
                alpha * (objective - (f_best - delta)) / d_norm_sq
            }
            Self::Diminishing { a } => a / ((iteration + 1) as f64 * d_norm_sq.sqrt()),
            Self::Constant { length } => length / d_norm_sq.sqrt(),
        }
    }

    fn optimum_estimate(&self, f_best: f64) -> f64 {
        match *self {
            Self::Polyak { f_star, .. } => f_star,
            Self::TargetLevel { delta, .. } => f_best - delta,
            Self::Diminishing { .. } | Self::Constant { .. } => f_best,
        }
    }

    /// Rule-specific stopping test on top of the gap certificate
    ///
    /// `None` defers to the stall test. The target level only stops through
    /// the certificate: a small δ says nothing about the true gap.
    fn converged(&self, f_best: f64, tolerance: f64) -> Option<bool> {
        match *self {
            Self::Polyak { f_star, .. } => {
                Some(f_best - f_star <= tolerance * f_star.abs().max(1.0))
            }
            Self::TargetLevel { .. } => Some(false),
            Self::Diminishing { .. } | Self::Constant { .. } => None,
        }
    }

    /// Target-level bookkeeping after an iteration
    fn record_progress(&mut self, f_best: f64) {
        if let Self::TargetLevel {
            delta,
            rho,
            patience,
            growth,
            delta_min,
            reference,
            since,
            ..
        } = self
        {
            match *reference {
                Some(r) if f_best <= r - 0.5 * *delta => {
                    *reference = Some(f_best);
                    *since = 0;
                    *delta *= *growth;
                }
                Some(_) => {
                    *since += 1;
                    if *since >= *patience {
                        *delta = (*delta * *rho).max(*delta_min);
                        *reference = Some(f_best);
                        *since = 0;
                    }
                }
                None => *reference = Some(f_best),
            }
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Dual objective and residual r = Kβ − y at `beta`
fn objective_and_residual(
    beta: &[f64],
    targets: &[f64],
    gram: &GramMatrix,
    epsilon: f64,
) -> (f64, Vec<f64>) {
    let k_beta = gram.mul_vec(beta);
    let objective = beta
        .iter()
        .zip(&k_beta)
        .zip(targets)
        .map(|((&b, &kb), &y)| b * (0.5 * kb - y) + epsilon * b.abs())
        .sum();
    let residual = k_beta.iter().zip(targets).map(|(kb, y)| kb - y).collect();
    (objective, residual)
}

/// Subgradient of f at `beta`
///
/// Where βᵢ = 0 the term ε|βᵢ| contributes any value in [−ε, ε]; the one
/// closest to cancelling rᵢ is used.
fn subgradient(beta: &[f64], residual: &[f64], epsilon: f64) -> Vec<f64> {
    beta.iter()
        .zip(residual)
        .map(|(&b, &r)| {
            if b > 0.0 {
                r + epsilon
            } else if b < 0.0 {
                r - epsilon
            } else if r.abs() <= epsilon {
                0.0
            } else {
                r - epsilon * r.signum()
            }
        })
        .collect()
}

/// Project `g` onto the directions that keep Σβ fixed and do not push
/// bound coordinates further out
///
/// Solves for the shift μ with Σ φᵢ(gᵢ − μ) = 0, where φᵢ clamps at zero
/// from below for βᵢ = C and from above for βᵢ = −C. Moving along −result
/// from `beta` stays on the hyperplane and inside the box.
fn tangent_direction(g: &[f64], beta: &[f64], box_c: f64) -> Vec<f64> {
    let bound_tol = 1e-12 * box_c;
    // Whether coordinate i moves linearly with μ rather than being clamped
    let unclamped = |i: usize, mu: f64| {
        let v = g[i] - mu;
        if beta[i] >= box_c - bound_tol {
            v > 0.0
        } else if beta[i] <= -box_c + bound_tol {
            v < 0.0
        } else {
            true
        }
    };
    let shifted = |mu: f64| -> Vec<f64> {
        (0..g.len())
            .map(|i| if unclamped(i, mu) { g[i] - mu } else { 0.0 })
            .collect()
    };

    // The clamped sum is non-increasing in μ, positive below min g and
    // non-positive above max g
    let mut lo = g.iter().copied().fold(f64::INFINITY, f64::min) - 1.0;
    let mut hi = g.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 1.0;
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        if shifted(mid).iter().sum::<f64>() > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let mu = 0.5 * (lo + hi);

    // On the unclamped set the sum is linear in μ, so its mean is exact
    let (sum, count) = (0..g.len())
        .filter(|&i| unclamped(i, mu))
        .fold((0.0, 0usize), |(sum, count), i| (sum + g[i], count + 1));
    if count == 0 {
        return vec![0.0; g.len()];
    }
    shifted(sum / count as f64)
}

/// min of rᵀβ' + ε‖β'‖₁ over the box with Σβ' = `target`
///
/// Evaluated through its Lagrangian dual
/// D(μ) = −C Σ max(0, |rᵢ + μ| − ε) − μ·target, a concave piecewise linear
/// function whose maximum sits at one of the breakpoints −rᵢ ± ε.
fn linearized_minimum(residual: &[f64], box_c: f64, target: f64, epsilon: f64) -> f64 {
    let dual = |mu: f64| -> f64 {
        -box_c
            * residual
                .iter()
                .map(|r| ((r + mu).abs() - epsilon).max(0.0))
                .sum::<f64>()
            - mu * target
    };

    let mut breakpoints: Vec<f64> = residual
        .iter()
        .flat_map(|r| [-r - epsilon, -r + epsilon])
        .collect();
    breakpoints.sort_by(f64::total_cmp);
    breakpoints.dedup();

    let (mut lo, mut hi) = (0, breakpoints.len() - 1);
    while lo < hi {
        let mid = (lo + hi) / 2;
        if dual(breakpoints[mid]) < dual(breakpoints[mid + 1]) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    dual(breakpoints[lo])
}

/// Certified lower bound on the optimal value from the iterate `beta`
///
/// The quadratic part lies above its tangent at `beta`, so minimising the
/// linearised objective over the feasible set bounds f* from below.
fn lower_bound(
    beta: &[f64],
    residual: &[f64],
    objective: f64,
    box_c: f64,
    target: f64,
    epsilon: f64,
) -> f64 {
    let l1: f64 = beta.iter().map(|b| b.abs()).sum();
    objective - epsilon * l1 - dot(residual, beta)
        + linearized_minimum(residual, box_c, target, epsilon)
}

/// Evaluate the dual objective at a given β
pub fn dual_objective(beta: &[f64], targets: &[f64], gram: &GramMatrix, epsilon: f64) -> f64 {
    objective_and_residual(beta, targets, gram, epsilon).0
}

impl DeflectedSubgradient {
    /// Create a new solver with the given configuration
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Get the solver configuration
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn validate_config(&self) -> Result<()> {
        let c = &self.config;
        let invalid = |msg: String| Err(SVRError::InvalidParameter(msg));

        if c.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".to_string());
        }
        if !(c.tolerance.is_finite() && c.tolerance > 0.0) {
            return invalid(format!("tolerance must be positive, got: {}", c.tolerance));
        }
        if !(c.deflection > 0.0 && c.deflection <= 1.0) {
            return invalid(format!(
                "deflection must be in (0, 1], got: {}",
                c.deflection
            ));
        }
        if let Some(eps) = c.epsilon {
            if !(eps.is_finite() && eps >= 0.0) {
                return invalid(format!("epsilon must be non-negative, got: {eps}"));
            }
        }
        if !c.equality_target.is_finite() {
            return invalid(format!(
                "equality target must be finite, got: {}",
                c.equality_target
            ));
        }
        if c.stall_window == 0 {
            return invalid("stall_window must be at least 1".to_string());
        }

        match c.step_size {
            StepSizeRule::Polyak { alpha, f_star } => {
                if !(alpha > 0.0 && alpha <= 2.0) {
                    return invalid(format!("Polyak alpha must be in (0, 2], got: {alpha}"));
                }
                if !f_star.is_finite() {
                    return invalid(format!("Polyak f_star must be finite, got: {f_star}"));
                }
            }
            StepSizeRule::TargetLevel {
                alpha,
                delta,
                rho,
                patience,
                growth,
                delta_min,
            } => {
                if !(alpha > 0.0 && alpha <= 2.0) {
                    return invalid(format!(
                        "target-level alpha must be in (0, 2], got: {alpha}"
                    ));
                }
                if !(delta.is_finite() && delta > 0.0) {
                    return invalid(format!("target-level delta must be positive, got: {delta}"));
                }
                if !(rho > 0.0 && rho < 1.0) {
                    return invalid(format!("target-level rho must be in (0, 1), got: {rho}"));
                }
                if patience == 0 {
                    return invalid("target-level patience must be at least 1".to_string());
                }
                if !(growth.is_finite() && growth >= 1.0) {
                    return invalid(format!(
                        "target-level growth must be at least 1, got: {growth}"
                    ));
                }
                if !(delta_min.is_finite() && delta_min >= 0.0) {
                    return invalid(format!(
                        "target-level delta_min must be non-negative, got: {delta_min}"
                    ));
                }
            }
            StepSizeRule::Diminishing { a } => {
                if !(a.is_finite() && a > 0.0) {
                    return invalid(format!("diminishing step a must be positive, got: {a}"));
                }
            }
            StepSizeRule::Constant { length } => {
                if !(length.is_finite() && length > 0.0) {
                    return invalid(format!("constant step must be positive, got: {length}"));
                }
            }
        }
        Ok(())
    }

    fn initial_point(&self, n: usize, box_c: f64) -> Result<Vec<f64>> {
        match &self.config.warm_start {
            Some(start) => {
                if start.len() != n {
                    return Err(SVRError::DimensionMismatch {
                        expected: n,
                        actual: start.len(),
                    });
                }
                project_box_equality(start, box_c, self.config.equality_target)
            }
            None if self.config.equality_target == 0.0 => Ok(vec![0.0; n]),
            None => project_box_equality(&vec![0.0; n], box_c, self.config.equality_target),
        }
    }

    /// Solve the dual problem for the given targets and Gram matrix
    ///
    /// Running out of iterations is reported through
    /// [`SolverStatus::MaxIterations`], not as an error; the best feasible β
    /// seen is returned either way.
    pub fn solve(&self, targets: &[f64], gram: &GramMatrix, box_c: f64) -> Result<SolverResult> {
        self.validate_config()?;

        if targets.is_empty() {
            return Err(SVRError::EmptyDataset);
        }
        if !(box_c.is_finite() && box_c > 0.0) {
            return Err(SVRError::InvalidParameter(format!(
                "Box constraint C must be positive, got: {box_c}"
            )));
        }
        if gram.size() != targets.len() {
            return Err(SVRError::DimensionMismatch {
                expected: targets.len(),
                actual: gram.size(),
            });
        }
        if !gram.is_finite() || targets.iter().any(|y| !y.is_finite()) {
            return Err(SVRError::InvalidParameter(
                "Gram matrix and targets must be finite".to_string(),
            ));
        }

        let n = targets.len();
        let epsilon = self.config.epsilon.unwrap_or(0.0);
        let gamma = self.config.deflection;
        let tolerance = self.config.tolerance;
        let window = self.config.stall_window;
        let target = self.config.equality_target;

        let mut beta = self.initial_point(n, box_c)?;
        let mut best_beta = beta.clone();
        let mut f_best = f64::INFINITY;
        let mut lb_best = f64::NEG_INFINITY;
        let mut direction: Option<Vec<f64>> = None;
        let mut step_state = StepState::new(&self.config.step_size);
        let mut trace = OptimizationTrace::new();
        let mut status = SolverStatus::MaxIterations;
        let mut iterations = 0;

        for k in 0..self.config.max_iterations {
            iterations = k + 1;

            let (objective, residual) = objective_and_residual(&beta, targets, gram, epsilon);
            if objective < f_best {
                f_best = objective;
                best_beta.clone_from(&beta);
            }
            lb_best = lb_best.max(lower_bound(
                &beta, &residual, objective, box_c, target, epsilon,
            ));

            let g = tangent_direction(&subgradient(&beta, &residual, epsilon), &beta, box_c);
            let g_norm_sq = dot(&g, &g);
            if k == 0 {
                // ‖g₀‖ times a bound on ‖β₀ − β*‖ bounds f(β₀) − f*
                step_state.calibrate(2.0 * box_c * g_norm_sq.sqrt() * (n as f64).sqrt());
            }
            step_state.cap_level(f_best - lb_best);

            let (d, d_norm_sq) = match direction.take() {
                _ if g_norm_sq == 0.0 => (g, 0.0),
                None => (g, g_norm_sq),
                Some(previous) => {
                    let d: Vec<f64> = g
                        .iter()
                        .zip(&previous)
                        .map(|(gi, di)| gamma * gi + (1.0 - gamma) * di)
                        .collect();
                    let d_norm_sq = dot(&d, &d);
                    if d_norm_sq == 0.0 {
                        // Deflection cancelled the subgradient: restart from it
                        (g, g_norm_sq)
                    } else {
                        (d, d_norm_sq)
                    }
                }
            };

            let step = if d_norm_sq == 0.0 {
                0.0
            } else {
                step_state.step_size(k, objective, f_best, d_norm_sq)
            };

            trace.push(TraceEntry {
                iteration: k,
                objective,
                best_objective: f_best,
                optimum_estimate: step_state.optimum_estimate(f_best),
                lower_bound: lb_best,
                step_size: step,
                iterate: self.config.record_iterates.then(|| beta.clone()),
            });

            if self.config.log_every > 0 && k % self.config.log_every == 0 {
                debug!(
                    "iter {k}: f = {objective:.8e}, f_best = {f_best:.8e}, lb = {lb_best:.8e}, step = {step:.3e}, |d| = {:.3e}",
                    d_norm_sq.sqrt()
                );
            }

            // No feasible descent direction: β is optimal
            if g_norm_sq == 0.0 {
                status = SolverStatus::Converged;
                break;
            }

            let certified = f_best - lb_best <= tolerance * f_best.abs().max(1.0);
            let converged = certified
                || match step_state.converged(f_best, tolerance) {
                    Some(done) => done,
                    None => {
                        k >= window
                            && trace.entries()[k - window].best_objective - f_best
                                < tolerance * f_best.abs().max(1.0)
                    }
                };
            if converged {
                status = SolverStatus::Converged;
                break;
            }

            let candidate: Vec<f64> = beta
                .iter()
                .zip(&d)
                .map(|(b, di)| b - step * di)
                .collect();
            beta = project_box_equality(&candidate, box_c, target)?;

            step_state.record_progress(f_best);
            direction = Some(d);
        }

        // The final projected iterate has not been scored yet
        if status == SolverStatus::MaxIterations {
            let objective = dual_objective(&beta, targets, gram, epsilon);
            if objective < f_best {
                f_best = objective;
                best_beta = beta;
            }
        }

        info!(
            "Deflected subgradient finished: status={status}, iterations={iterations}, f_best={f_best:.8e}, gap<={:.3e}",
            f_best - lb_best
        );

        Ok(SolverResult {
            beta: best_beta,
            status,
            iterations,
            objective: f_best,
            trace,
        })
    }
}
