//! Integration tests for the rsvr library
//!
//! These tests verify end-to-end functionality across multiple modules
//! and validate real-world usage scenarios.

use approx::assert_abs_diff_eq;
use rsvr::api::{quick, SVR};
use rsvr::core::SVRError;
use rsvr::kernel::kind::gram_matrix;
use rsvr::optimizer::SupportSet;
use rsvr::{
    project_box_equality, CSVDataset, Dataset, Gamma, GramMatrix, KernelKind, PrecomputedKernel,
    RegressionModel, Sample, SolverStatus, StepSizeRule,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Five 1-d points on y = 10x; with C = 1 the optimum is the vertex
/// β = (-1, -1, 0, 1, 1)
fn vertex_samples() -> Vec<Sample> {
    (0..5)
        .map(|i| Sample::new(vec![i as f64], 10.0 * i as f64))
        .collect()
}

fn dual_objective(beta: &[f64], targets: &[f64], gram: &GramMatrix, epsilon: f64) -> f64 {
    0.5 * gram.quadratic_form(beta)
        - targets.iter().zip(beta).map(|(y, b)| y * b).sum::<f64>()
        + epsilon * beta.iter().map(|b| b.abs()).sum::<f64>()
}

/// Reference optimum by FISTA on the split form β = a⁺ − a⁻ with
/// a⁺, a⁻ ∈ [0, C] and Σa⁺ = Σa⁻, where the objective is smooth
fn reference_optimum(targets: &[f64], gram: &GramMatrix, box_c: f64, epsilon: f64) -> f64 {
    let n = targets.len();
    let lipschitz = 2.0 * (0..n).map(|i| gram.get(i, i)).sum::<f64>();

    let project = |p: &[f64], q: &[f64]| -> (Vec<f64>, Vec<f64>) {
        let clip = |v: f64| v.clamp(0.0, box_c);
        let balance = |mu: f64| {
            p.iter().map(|&v| clip(v - mu)).sum::<f64>()
                - q.iter().map(|&v| clip(v + mu)).sum::<f64>()
        };
        let radius = p.iter().chain(q).fold(0.0f64, |m, v| m.max(v.abs())) + box_c + 1.0;
        let (mut lo, mut hi) = (-radius, radius);
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if balance(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let mu = 0.5 * (lo + hi);
        (
            p.iter().map(|&v| clip(v - mu)).collect(),
            q.iter().map(|&v| clip(v + mu)).collect(),
        )
    };

    let mut plus = vec![0.0; n];
    let mut minus = vec![0.0; n];
    let mut y_plus = plus.clone();
    let mut y_minus = minus.clone();
    let mut t = 1.0f64;

    for _ in 0..20_000 {
        let beta: Vec<f64> = y_plus.iter().zip(&y_minus).map(|(a, b)| a - b).collect();
        let residual: Vec<f64> = gram
            .mul_vec(&beta)
            .iter()
            .zip(targets)
            .map(|(kb, y)| kb - y)
            .collect();
        let p: Vec<f64> = (0..n)
            .map(|i| y_plus[i] - (residual[i] + epsilon) / lipschitz)
            .collect();
        let q: Vec<f64> = (0..n)
            .map(|i| y_minus[i] - (-residual[i] + epsilon) / lipschitz)
            .collect();
        let (next_plus, next_minus) = project(&p, &q);

        let t_next = 0.5 * (1.0 + (1.0 + 4.0 * t * t).sqrt());
        let momentum = (t - 1.0) / t_next;
        for i in 0..n {
            y_plus[i] = next_plus[i] + momentum * (next_plus[i] - plus[i]);
            y_minus[i] = next_minus[i] + momentum * (next_minus[i] - minus[i]);
        }
        plus = next_plus;
        minus = next_minus;
        t = t_next;
    }

    let beta: Vec<f64> = plus.iter().zip(&minus).map(|(a, b)| a - b).collect();
    dual_objective(&beta, targets, gram, epsilon)
}

fn vertex_reference() -> f64 {
    let samples = vertex_samples();
    let features: Vec<Vec<f64>> = samples.iter().map(|s| s.features.clone()).collect();
    let targets: Vec<f64> = samples.iter().map(|s| s.target).collect();
    let gram = gram_matrix(&rsvr::kernel::LinearKernel::new(), &features);
    reference_optimum(&targets, &gram, 1.0, 0.1)
}

#[test]
fn test_reference_optimum_matches_vertex() {
    assert_abs_diff_eq!(vertex_reference(), -41.6, epsilon = 1e-4);
}

#[test]
fn test_polyak_fit_reaches_reference_optimum() {
    let f_ref = vertex_reference();
    let model = SVR::with_kernel(KernelKind::Linear)
        .with_box(1.0)
        .with_epsilon(0.1)
        .with_step_size(StepSizeRule::Polyak {
            alpha: 0.7,
            f_star: f_ref,
        })
        .with_max_iterations(5000)
        .fit_samples(&vertex_samples())
        .expect("Training should succeed");

    let info = model.info();
    assert!(
        (info.objective - f_ref).abs() <= 1e-4 * f_ref.abs().max(1.0),
        "objective {} too far from reference {}",
        info.objective,
        f_ref
    );

    let beta = model.inner().beta();
    assert_abs_diff_eq!(beta.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
    assert!(beta.iter().all(|b| b.abs() <= 1.0 + 1e-12));

    // W = Σ βᵢ xᵢ = 6 at the vertex
    let weights = info.weights.expect("linear model exposes weights");
    assert_abs_diff_eq!(weights[0], 6.0, epsilon = 0.1);
}

#[test]
fn test_default_rule_certifies_vertex_reference() {
    let f_ref = vertex_reference();
    let model = SVR::new()
        .with_box(1.0)
        .with_epsilon(0.1)
        .fit_samples(&vertex_samples())
        .expect("Training should succeed");

    let info = model.info();
    assert_eq!(info.status, SolverStatus::Converged);
    assert!(
        (info.objective - f_ref).abs() <= 1e-4 * f_ref.abs().max(1.0),
        "objective {} too far from reference {f_ref}",
        info.objective
    );
}

/// Five points whose fit leaves the optimum off the box vertices
fn interior_samples() -> Vec<Sample> {
    [0.1, 0.9, 2.2, 2.8, 4.1]
        .into_iter()
        .enumerate()
        .map(|(i, y)| Sample::new(vec![i as f64], y))
        .collect()
}

/// n points of sin on [0, 6)
fn sine_samples(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let x = i as f64 * 6.0 / n as f64;
            Sample::new(vec![x], x.sin())
        })
        .collect()
}

/// FISTA optimum of the dual for `samples` under a resolved kernel
fn samples_reference(
    samples: &[Sample],
    kernel: &KernelKind,
    box_c: f64,
    epsilon: f64,
) -> f64 {
    let features: Vec<Vec<f64>> = samples.iter().map(|s| s.features.clone()).collect();
    let targets: Vec<f64> = samples.iter().map(|s| s.target).collect();
    let resolved = kernel.resolve(&features).expect("kernel resolves");
    let gram = gram_matrix(&resolved, &features);
    reference_optimum(&targets, &gram, box_c, epsilon)
}

#[test]
fn test_default_rule_reaches_interior_reference() {
    let samples = interior_samples();
    let f_ref = samples_reference(&samples, &KernelKind::Linear, 1.0, 0.1);

    // No f* is supplied: the default rule finds the level on its own
    let model = SVR::new()
        .with_box(1.0)
        .with_epsilon(0.1)
        .fit_samples(&samples)
        .expect("Training should succeed");

    let info = model.info();
    assert_eq!(info.status, SolverStatus::Converged);
    assert!(
        (info.objective - f_ref).abs() <= 1e-4 * f_ref.abs().max(1.0),
        "objective {} too far from reference {f_ref}",
        info.objective
    );
    // Neither a vertex nor the origin
    let beta = model.inner().beta();
    assert!(beta.iter().any(|b| b.abs() > 1e-3 && b.abs() < 1.0 - 1e-3));
}

/// A converged status must mean the objective is within tolerance
fn assert_converged_within_tolerance(samples: &[Sample], kernel: KernelKind) {
    let (box_c, epsilon, tolerance) = (1.0, 0.05, 1e-6);
    let f_ref = samples_reference(samples, &kernel, box_c, epsilon);

    let model = SVR::with_kernel(kernel)
        .with_box(box_c)
        .with_epsilon(epsilon)
        .with_tolerance(tolerance)
        .fit_samples(samples)
        .expect("Training should succeed");

    let info = model.info();
    assert_eq!(info.status, SolverStatus::Converged);
    // The reference is itself a feasible value, so it can only sit above f*
    assert!(
        info.objective - f_ref <= tolerance * f_ref.abs().max(1.0),
        "converged at {} but reference is {f_ref}",
        info.objective
    );
    let gap = model.trace().certified_gap().expect("trace is not empty");
    assert!(gap <= tolerance * info.objective.abs().max(1.0));
    let lower_bound = model.trace().entries()[model.trace().len() - 1].lower_bound;
    assert!(lower_bound <= f_ref + 1e-9);
}

#[test]
fn test_converged_linear_fit_matches_reference() {
    assert_converged_within_tolerance(&sine_samples(20), KernelKind::Linear);
}

#[test]
fn test_converged_polynomial_fit_matches_reference() {
    assert_converged_within_tolerance(
        &sine_samples(20),
        KernelKind::Polynomial {
            gamma: Gamma::Value(1.0),
            degree: 2,
            coef0: 0.0,
        },
    );
}

#[test]
fn test_best_objective_is_monotone() {
    let model = SVR::new()
        .with_max_iterations(300)
        .fit_samples(&vertex_samples())
        .unwrap();
    let entries = model.trace().entries();
    assert!(!entries.is_empty());
    for pair in entries.windows(2) {
        assert!(pair[1].best_objective <= pair[0].best_objective);
        assert!(pair[1].lower_bound >= pair[0].lower_bound);
    }
    for entry in entries {
        assert!(entry.lower_bound <= entry.best_objective);
    }
    // A run cut short also scores its final projected iterate
    assert!(model.info().objective <= entries[entries.len() - 1].best_objective);
}

#[test]
fn test_linear_primal_matches_dual_prediction() {
    let model = SVR::new()
        .with_max_iterations(500)
        .fit_samples(&vertex_samples())
        .unwrap();
    let inner = model.inner();
    for x in [-2.0, 0.5, 3.0, 7.25] {
        let primal = inner.predict(&[x]).unwrap();
        let dual = inner.predict_dual(&[x]).unwrap();
        assert_abs_diff_eq!(primal, dual, epsilon = 1e-9);
    }
}

#[test]
fn test_projection_breakpoint_hit() {
    let w = project_box_equality(&[2.0, -2.0], 1.0, 0.0).unwrap();
    assert_eq!(w, vec![1.0, -1.0]);
}

#[test]
fn test_projection_interpolation_path() {
    let w = project_box_equality(&[1.0; 5], 1.0, 0.0).unwrap();
    for value in w {
        assert_abs_diff_eq!(value, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_projection_rejects_bad_input() {
    assert!(matches!(
        project_box_equality(&[0.5, 0.5], 0.0, 0.0),
        Err(SVRError::InvalidParameter(_))
    ));
    // Σβ = 3 is out of reach of two components bounded by 1
    assert!(project_box_equality(&[0.5, 0.5], 1.0, 3.0).is_err());
}

#[test]
fn test_complete_workflow_csv() {
    let mut train = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    writeln!(train, "x1,x2,y").unwrap();
    for i in 0..12 {
        let x1 = i as f64 * 0.5;
        let x2 = (i % 3) as f64;
        writeln!(train, "{x1},{x2},{}", 2.0 * x1 - x2 + 1.0).unwrap();
    }
    train.flush().unwrap();

    let mut test = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    writeln!(test, "1.25,1,2.5").unwrap();
    writeln!(test, "3.75,0,8.5").unwrap();
    test.flush().unwrap();

    let model = SVR::new()
        .with_box(10.0)
        .with_epsilon(0.05)
        .with_max_iterations(3000)
        .fit_from_csv(train.path())
        .expect("Training should succeed");

    let info = model.info();
    assert_eq!(info.kernel, "linear");
    assert!(info.n_support_vectors > 0);
    assert!(info.n_support_vectors <= 12);
    assert_eq!(info.support_vector_indices.len(), info.n_support_vectors);

    let train_metrics = model.evaluate_from_csv(train.path()).unwrap();
    assert_eq!(train_metrics.n_samples, 12);
    assert!(train_metrics.mse.is_finite());

    let predictions = model.predict_from_csv(test.path()).unwrap();
    assert_eq!(predictions.len(), 2);

    let metrics = quick::evaluate_split(train.path(), test.path()).unwrap();
    assert_eq!(metrics.n_samples, 2);
    assert!(metrics.rmse() >= 0.0);
}

#[test]
fn test_rbf_fit_on_sine() {
    let samples: Vec<Sample> = (0..30)
        .map(|i| {
            let x = i as f64 * 0.2;
            Sample::new(vec![x], x.sin())
        })
        .collect();
    let model = SVR::with_kernel(KernelKind::Rbf { gamma: Gamma::Scale })
        .with_box(5.0)
        .with_epsilon(0.05)
        .with_max_iterations(2000)
        .fit_samples(&samples)
        .unwrap();

    let info = model.info();
    assert!(info.weights.is_none());
    assert!(info.gamma.is_some_and(|g| g > 0.0));

    // Predictions match the dual formula through the high-level API
    let inner = model.inner();
    assert_abs_diff_eq!(
        model.predict(&[1.1]).unwrap(),
        inner.predict_dual(&[1.1]).unwrap(),
        epsilon = 1e-12
    );
    assert!(model.predict(&[1.1, 2.0]).is_err());
}

#[test]
fn test_precomputed_gram_workflow() {
    let samples = vertex_samples();
    let features: Vec<Vec<f64>> = samples.iter().map(|s| s.features.clone()).collect();
    let gram = gram_matrix(&rsvr::kernel::RBFKernel::new(0.5), &features);

    let svr = SVR::with_kernel(KernelKind::Rbf {
        gamma: Gamma::Value(0.5),
    })
    .with_max_iterations(200);
    let direct = svr.clone().fit_samples(&samples).unwrap();
    let precomputed = svr
        .fit_precomputed(&samples, PrecomputedKernel { gram, gamma: 0.5 })
        .unwrap();

    assert_eq!(direct.inner().beta(), precomputed.inner().beta());
    assert_eq!(
        direct.predict(&[2.5]).unwrap(),
        precomputed.predict(&[2.5]).unwrap()
    );
}

#[test]
fn test_support_fallback_to_extremal_pair() {
    let gram = GramMatrix::from_fn(3, |i, j| (i + j) as f64);
    let support = SupportSet::compute(&[1e-8, -1e-8, 0.0], &[1.0, 2.0, 3.0], &gram, 0.1);
    assert_eq!(support.indices, vec![0, 1]);
    assert!(SupportSet::compute_strict(&[1e-8, -1e-8, 0.0], &[1.0, 2.0, 3.0], &gram, 0.1).is_none());
}

#[test]
fn test_validation_errors() {
    let samples = vertex_samples();
    assert!(matches!(
        SVR::new().with_box(0.0).fit_samples(&samples),
        Err(SVRError::InvalidParameter(_))
    ));
    assert!(matches!(
        SVR::new().with_epsilon(-0.1).fit_samples(&samples),
        Err(SVRError::InvalidParameter(_))
    ));
    assert!(matches!(
        SVR::new().fit_samples(&[]),
        Err(SVRError::EmptyDataset)
    ));

    let ragged = vec![Sample::new(vec![1.0], 1.0), Sample::new(vec![1.0, 2.0], 2.0)];
    assert!(matches!(
        SVR::new().fit_samples(&ragged),
        Err(SVRError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        "quadratic".parse::<KernelKind>(),
        Err(SVRError::UnknownKernel(_))
    ));
}

#[test]
fn test_budget_exhaustion_is_a_status() {
    let model = SVR::new()
        .with_max_iterations(3)
        .fit_samples(&vertex_samples())
        .expect("running out of iterations is not an error");
    assert_eq!(model.info().status, SolverStatus::MaxIterations);
    assert_eq!(model.info().iterations, 3);
}

#[test]
fn test_holdout_validation() {
    let samples: Vec<Sample> = (0..20)
        .map(|i| Sample::new(vec![i as f64 * 0.1], 3.0 * i as f64 * 0.1))
        .collect();
    let dataset = CSVDataset::from_samples(samples).unwrap();
    assert_eq!(dataset.len(), 20);

    let metrics =
        quick::holdout_validation(&dataset, 0.75, SVR::new().with_max_iterations(500)).unwrap();
    assert_eq!(metrics.n_samples, 5);
    assert!(quick::holdout_validation(&dataset, 1.0, SVR::new()).is_err());
}
