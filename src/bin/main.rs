//! RSVR Command Line Interface
//!
//! Trains and evaluates epsilon-insensitive SVR models on CSV data, runs the
//! box-equality projection on its own, and inspects exported solver traces.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use rsvr::api::{RegressionMetrics, SVR};
use rsvr::core::{Result, SVRError, SolverConfig, StepSizeRule};
use rsvr::kernel::{Gamma, KernelKind};
use rsvr::solver::project_box_equality;
use rsvr::utils::diagnostics::{convergence_rates, log_residual_errors, TraceReport};
use rsvr::utils::scaling::{ScalingMethod, ScalingParams};
use rsvr::{CSVDataset, Dataset};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "rsvr")]
#[command(about = "Epsilon-insensitive Support Vector Regression in Rust")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "RSVR Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit an SVR model and report train (and test) metrics
    Train(TrainArgs),
    /// Project a vector onto the box-equality feasible set
    Project(ProjectArgs),
    /// Print convergence diagnostics of an exported trace
    Diagnose(DiagnoseArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (CSV, last column is the target)
    #[arg(long)]
    data: PathBuf,

    /// Optional test data file in the same format
    #[arg(long)]
    test: Option<PathBuf>,

    /// Kernel function
    #[arg(short, long, default_value = "linear")]
    kernel: CliKernel,

    /// Kernel gamma: scale, auto or a positive number
    #[arg(short, long, default_value = "scale")]
    gamma: Gamma,

    /// Polynomial degree
    #[arg(long, default_value = "1")]
    degree: u32,

    /// Independent term of the poly and sigmoid kernels
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    coef0: f64,

    /// Box constraint C
    #[arg(short = 'C', long = "box", default_value = "1.0")]
    box_c: f64,

    /// Epsilon-tube half-width
    #[arg(short, long, default_value = "0.1")]
    epsilon: f64,

    /// Maximum solver iterations
    #[arg(short, long)]
    max_iterations: Option<usize>,

    /// Convergence tolerance
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Deflection coefficient in (0, 1]
    #[arg(long)]
    deflection: Option<f64>,

    /// Step-size rule
    #[arg(long)]
    step_rule: Option<CliStepRule>,

    /// Step parameter: alpha for target-level, a for diminishing, length for constant
    #[arg(long, requires = "step_rule")]
    step_param: Option<f64>,

    /// Solver configuration file (JSON); command-line flags override it
    #[arg(long)]
    solver_config: Option<PathBuf>,

    /// Feature scaling fitted on the training data
    #[arg(long)]
    scale: Option<CliScalingMethod>,

    /// Write the solver trace as JSON
    #[arg(long)]
    trace_out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    Linear,
    Rbf,
    Poly,
    Sigmoid,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliStepRule {
    /// Polyak step against an adaptive target level (default)
    #[value(name = "target-level")]
    TargetLevel,
    /// a / ((k + 1) |d|)
    #[value(name = "diminishing")]
    Diminishing,
    /// Fixed step length
    #[value(name = "constant")]
    Constant,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliScalingMethod {
    /// Min-Max scaling to [-1, 1] range
    #[value(name = "minmax")]
    MinMax,
    /// Standard score (Z-score) normalization
    #[value(name = "standard")]
    StandardScore,
}

impl From<CliScalingMethod> for ScalingMethod {
    fn from(cli_method: CliScalingMethod) -> Self {
        match cli_method {
            CliScalingMethod::MinMax => ScalingMethod::MinMax {
                min_val: -1.0,
                max_val: 1.0,
            },
            CliScalingMethod::StandardScore => ScalingMethod::StandardScore,
        }
    }
}

impl CliStepRule {
    fn into_rule(self, param: Option<f64>) -> StepSizeRule {
        match self {
            CliStepRule::TargetLevel => {
                let mut rule = StepSizeRule::default();
                if let (StepSizeRule::TargetLevel { alpha, .. }, Some(value)) = (&mut rule, param) {
                    *alpha = value;
                }
                rule
            }
            CliStepRule::Diminishing => StepSizeRule::Diminishing {
                a: param.unwrap_or(1.0),
            },
            CliStepRule::Constant => StepSizeRule::Constant {
                length: param.unwrap_or(0.1),
            },
        }
    }
}

#[derive(Args)]
struct ProjectArgs {
    /// Comma-separated input vector
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    values: Vec<f64>,

    /// Box bound C
    #[arg(long = "box")]
    box_c: f64,

    /// Required sum of the projected vector
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    target: f64,
}

#[derive(Args)]
struct DiagnoseArgs {
    /// Trace file written by `train --trace-out`
    #[arg(long)]
    trace: PathBuf,

    /// Reference optimal value (defaults to the best objective in the trace)
    #[arg(long, allow_hyphen_values = true)]
    f_star: Option<f64>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Project(args) => project_command(args),
        Commands::Diagnose(args) => diagnose_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn kernel_from_args(args: &TrainArgs) -> KernelKind {
    match args.kernel {
        CliKernel::Linear => KernelKind::Linear,
        CliKernel::Rbf => KernelKind::Rbf { gamma: args.gamma },
        CliKernel::Poly => KernelKind::Polynomial {
            gamma: args.gamma,
            degree: args.degree,
            coef0: args.coef0,
        },
        CliKernel::Sigmoid => KernelKind::Sigmoid {
            gamma: args.gamma,
            coef0: args.coef0,
        },
    }
}

fn solver_config_from_args(args: &TrainArgs) -> Result<SolverConfig> {
    let mut config = match &args.solver_config {
        Some(path) => {
            info!("Loading solver configuration from: {path:?}");
            let file = File::open(path)?;
            serde_json::from_reader(BufReader::new(file))?
        }
        None => SolverConfig::default(),
    };

    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(deflection) = args.deflection {
        config.deflection = deflection;
    }
    if let Some(rule) = args.step_rule {
        config.step_size = rule.into_rule(args.step_param);
    }
    Ok(config)
}

fn print_metrics(title: &str, metrics: &RegressionMetrics) {
    println!("\n{title} ({} samples):", metrics.n_samples);
    println!("  Epsilon loss: {:.6}", metrics.epsilon_loss);
    println!("  MSE:          {:.6}", metrics.mse);
    println!("  RMSE:         {:.6}", metrics.rmse());
    println!("  MAE:          {:.6}", metrics.mae);
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training SVR model...");
    info!("Data file: {:?}", args.data);

    let dataset = CSVDataset::from_file(&args.data)?;
    info!(
        "Loaded {} samples with {} dimensions",
        dataset.len(),
        dataset.dim()
    );

    let test_samples = match &args.test {
        Some(path) => {
            let test = CSVDataset::from_file(path)?;
            if test.dim() != dataset.dim() {
                return Err(SVRError::DimensionMismatch {
                    expected: dataset.dim(),
                    actual: test.dim(),
                });
            }
            Some(test.samples())
        }
        None => None,
    };

    let (train_samples, test_samples) = match args.scale {
        Some(method) => {
            info!("Using feature scaling: {method:?}");
            let params = ScalingParams::fit(&dataset.samples(), method.into())?;
            (
                params.transform_samples(&dataset.samples()),
                test_samples.map(|s| params.transform_samples(&s)),
            )
        }
        None => (dataset.samples(), test_samples),
    };

    let kernel = kernel_from_args(&args);
    let config = solver_config_from_args(&args)?;
    info!(
        "Parameters: kernel={kernel}, C={}, epsilon={}, max_iter={}",
        args.box_c, args.epsilon, config.max_iterations
    );

    let model = SVR::with_kernel(kernel)
        .with_box(args.box_c)
        .with_epsilon(args.epsilon)
        .with_solver_config(config)
        .fit_samples(&train_samples)?;

    info!("Training completed successfully");

    println!("=== Model Summary ===");
    println!("{}", model.inner());

    print_metrics("Training metrics", &model.evaluate_samples(&train_samples)?);
    if let Some(test) = test_samples.as_deref() {
        print_metrics("Test metrics", &model.evaluate_samples(test)?);
    }

    if let Some(path) = &args.trace_out {
        TraceReport::from_model(model.inner()).save_to_file(path)?;
        info!("Trace saved to: {path:?}");
    }

    Ok(())
}

fn project_command(args: ProjectArgs) -> Result<()> {
    info!(
        "Projecting {} values onto box [-{}, {}] with sum {}",
        args.values.len(),
        args.box_c,
        args.box_c,
        args.target
    );
    let projected = project_box_equality(&args.values, args.box_c, args.target)?;
    let line: Vec<String> = projected.iter().map(f64::to_string).collect();
    println!("{}", line.join(","));
    Ok(())
}

fn diagnose_command(args: DiagnoseArgs) -> Result<()> {
    info!("Loading trace from: {:?}", args.trace);
    let report = TraceReport::load_from_file(&args.trace)?;

    let f_star = args
        .f_star
        .or_else(|| report.trace.best_objective())
        .unwrap_or(report.objective);

    println!("=== Trace Diagnostics ===");
    println!("Library version: {}", report.library_version);
    println!("Created at:      {}", report.created_at);
    println!("Kernel:          {}", report.kernel);
    println!("Status:          {}", report.status);
    println!("Iterations:      {}", report.iterations);
    println!("Objective:       {:.8e}", report.objective);
    println!("Reference f*:    {f_star:.8e}");
    if let Some(gap) = report.trace.certified_gap() {
        println!("Certified gap:   {gap:.3e}");
    }

    println!("\nConvergence rates:");
    for (i, rate) in convergence_rates(&report.trace, f_star).iter().enumerate() {
        println!("  {i} {rate:.6e}");
    }

    println!("\nLog residual errors:");
    for (i, err) in log_residual_errors(&report.trace, f_star).iter().enumerate() {
        println!("  {i} {err:.6}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_rule_conversion() {
        assert_eq!(
            CliStepRule::Constant.into_rule(Some(0.5)),
            StepSizeRule::Constant { length: 0.5 }
        );
        assert_eq!(
            CliStepRule::Diminishing.into_rule(None),
            StepSizeRule::Diminishing { a: 1.0 }
        );
        match CliStepRule::TargetLevel.into_rule(Some(1.5)) {
            StepSizeRule::TargetLevel { alpha, .. } => assert_eq!(alpha, 1.5),
            other => panic!("unexpected rule {other:?}"),
        }
        assert_eq!(CliStepRule::TargetLevel.into_rule(None), StepSizeRule::default());
    }

    #[test]
    fn test_cli_parses_train_flags() {
        let cli = Cli::parse_from([
            "rsvr", "train", "--data", "train.csv", "--kernel", "rbf", "--gamma", "0.5", "-C",
            "10", "--step-rule", "constant", "--step-param", "0.2",
        ]);
        match cli.command {
            Commands::Train(args) => {
                assert_eq!(
                    kernel_from_args(&args),
                    KernelKind::Rbf {
                        gamma: Gamma::Value(0.5)
                    }
                );
                assert_eq!(args.box_c, 10.0);
                let config = solver_config_from_args(&args).unwrap();
                assert_eq!(config.step_size, StepSizeRule::Constant { length: 0.2 });
            }
            _ => panic!("expected train command"),
        }
    }

    #[test]
    fn test_cli_poly_defaults_to_degree_one() {
        let cli = Cli::parse_from(["rsvr", "train", "--data", "train.csv", "--kernel", "poly"]);
        match cli.command {
            Commands::Train(args) => assert_eq!(
                kernel_from_args(&args),
                KernelKind::Polynomial {
                    gamma: Gamma::Scale,
                    degree: 1,
                    coef0: 0.0
                }
            ),
            _ => panic!("expected train command"),
        }
    }
}
