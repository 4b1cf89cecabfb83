//! svmkit Command Line Interface
//!
//! A command-line interface for training, tuning, evaluating, and using SVM
//! models on CSV data (last column is the label or target).

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use svmkit::persistence::SerializableModel;
use svmkit::{
    CSVDataset, Hyperparameters, KernelType, OptimizerConfig, ProblemType, Result, SVMError,
    SampleMatrix, SearchConfig, TrainReport, TrainingData, SVM,
};

#[derive(Parser)]
#[command(name = "svmkit")]
#[command(about = "Support Vector Machine training, tuning and inference")]
#[command(version = env!("CARGO_PKG_VERSION"))]
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
    /// Train a new SVM model with fixed hyperparameters
    Train(TrainArgs),
    /// Search hyperparameters with cross-validation, then train
    AutoTrain(AutoTrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on labeled data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (CSV)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    solver: SolverArgs,
}

#[derive(Args)]
struct AutoTrainArgs {
    #[command(flatten)]
    train: TrainArgs,

    /// Number of cross-validation folds
    #[arg(short = 'k', long, default_value = "10")]
    folds: usize,
}

/// Problem formulation and kernel hyperparameters
#[derive(Args)]
struct ModelArgs {
    /// Problem type
    #[arg(long, value_enum, default_value = "c-svc")]
    problem: CliProblemType,

    /// Kernel function
    #[arg(long, value_enum, default_value = "rbf")]
    kernel: CliKernelType,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Kernel coefficient gamma
    #[arg(short, long, default_value = "1.0")]
    gamma: f64,

    /// nu for nu-SVC, one-class and nu-SVR
    #[arg(long, default_value = "0.5")]
    nu: f64,

    /// Tube width p for epsilon-SVR
    #[arg(short, long, default_value = "0.1")]
    p: f64,

    /// Polynomial degree
    #[arg(long, default_value = "3")]
    degree: f64,

    /// Independent kernel term for polynomial and sigmoid kernels
    #[arg(long, default_value = "0")]
    coef0: f64,
}

/// Solver settings
#[derive(Args)]
struct SolverArgs {
    /// Convergence tolerance
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Maximum iterations
    #[arg(short, long, default_value = "100000")]
    max_iterations: usize,

    /// Kernel cache size in MB
    #[arg(long, default_value = "100")]
    cache_size: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliProblemType {
    #[value(name = "c-svc")]
    CSvc,
    #[value(name = "nu-svc")]
    NuSvc,
    #[value(name = "one-class")]
    OneClass,
    #[value(name = "eps-svr")]
    EpsSvr,
    #[value(name = "nu-svr")]
    NuSvr,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernelType {
    Linear,
    Polynomial,
    Rbf,
    Sigmoid,
    Chi2,
    Intersection,
}

impl From<CliProblemType> for ProblemType {
    fn from(cli_problem: CliProblemType) -> Self {
        match cli_problem {
            CliProblemType::CSvc => ProblemType::CSvc,
            CliProblemType::NuSvc => ProblemType::NuSvc,
            CliProblemType::OneClass => ProblemType::OneClass,
            CliProblemType::EpsSvr => ProblemType::EpsSvr,
            CliProblemType::NuSvr => ProblemType::NuSvr,
        }
    }
}

impl From<CliKernelType> for KernelType {
    fn from(cli_kernel: CliKernelType) -> Self {
        match cli_kernel {
            CliKernelType::Linear => KernelType::Linear,
            CliKernelType::Polynomial => KernelType::Polynomial,
            CliKernelType::Rbf => KernelType::Rbf,
            CliKernelType::Sigmoid => KernelType::Sigmoid,
            CliKernelType::Chi2 => KernelType::Chi2,
            CliKernelType::Intersection => KernelType::Intersection,
        }
    }
}

impl ModelArgs {
    fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            gamma: self.gamma,
            p: self.p,
            nu: self.nu,
            c: self.c,
            degree: self.degree,
            coef0: self.coef0,
            kernel_type: self.kernel.into(),
            problem_type: self.problem.into(),
        }
    }
}

impl SolverArgs {
    fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
            cache_size: self.cache_size * 1024 * 1024, // Convert MB to bytes
        }
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file (CSV, the last column is ignored)
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show decision values
    #[arg(long)]
    confidence: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file (CSV)
    #[arg(long)]
    data: PathBuf,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
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
        Commands::AutoTrain(args) => auto_train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn load_data(path: &Path) -> Result<SampleMatrix> {
    info!("Loading data from: {path:?}");
    let data = CSVDataset::from_file(path)?;
    info!(
        "Loaded {} samples with {} features",
        data.n_samples(),
        data.n_features()
    );
    Ok(data)
}

fn build_svm(args: &TrainArgs) -> SVM {
    let params = args.model.hyperparameters();
    info!(
        "Parameters: {} with {} kernel, C={}, gamma={}, nu={}, p={}",
        params.problem_type, params.kernel_type, params.c, params.gamma, params.nu, params.p
    );
    SVM::with_hyperparameters(params).with_optimizer_config(args.solver.optimizer_config())
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training SVM model...");
    let data = TrainingData::from_matrix(load_data(&args.data)?);
    let svm = build_svm(&args);

    let report = svm.train(&data)?;
    finish_training(&svm, &report, &args.output)
}

fn auto_train_command(args: AutoTrainArgs) -> Result<()> {
    info!("Searching hyperparameters with {}-fold cross-validation...", args.folds);
    let data = TrainingData::from_matrix(load_data(&args.train.data)?);
    let svm = build_svm(&args.train)
        .with_search_config(SearchConfig::default().with_k_fold(args.folds));

    let report = svm.auto_train(&data)?;
    if let Some(score) = report.cv_score {
        println!("Cross-validation score: {score:.6}");
    }
    let best = &report.hyperparameters;
    println!(
        "Selected: C={} gamma={} nu={} p={} degree={} coef0={}",
        best.c, best.gamma, best.nu, best.p, best.degree, best.coef0
    );
    finish_training(&svm, &report, &args.train.output)
}

fn finish_training(svm: &SVM, report: &TrainReport, output: &Path) -> Result<()> {
    info!("Training completed successfully");
    info!("Support vectors: {}", report.n_support_vectors);
    info!("Solver iterations: {}", report.iterations);
    if let Some(warning) = report.warning() {
        warn!("{warning}");
    }

    svm.write_to_file(output)?;
    info!("Model saved to: {output:?}");
    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let svm = SVM::init_from_file(&args.model)?;
    let data = load_data(&args.data)?;

    let predictions = data
        .rows()
        .map(|row| svm.predict_detailed(row))
        .collect::<Result<Vec<_>>>()?;

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    writeln!(writer, "# Predictions for {} samples", predictions.len())?;
    writeln!(
        writer,
        "# Format: sample_index prediction{}",
        if args.confidence { " decision_value" } else { "" }
    )?;
    for (i, pred) in predictions.iter().enumerate() {
        if args.confidence {
            writeln!(writer, "{i} {} {:.6}", pred.label, pred.decision_value)?;
        } else {
            writeln!(writer, "{i} {}", pred.label)?;
        }
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        info!("Predictions saved to: {path:?}");
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let document = SerializableModel::load_from_file(&args.model)?;
    let svm = SVM::init_from_file(&args.model)?;
    let data = load_data(&args.data)?;
    let rows: Vec<&[f64]> = data.rows().collect();

    println!("=== Model Evaluation ===");
    document.print_summary();

    println!("\nTest Results:");
    match svm.info().map(|info| info.problem_type) {
        Some(problem) if problem.is_classifier() => {
            let accuracy = svm.compute_class_accuracy(&rows, data.labels())?;
            println!("  Accuracy: {:.2}%", accuracy * 100.0);
        }
        Some(_) => {
            let mse = svm.compute_mse(&rows, data.labels())?;
            println!("  MSE: {mse:.6}");
        }
        None => return Err(SVMError::ModelNotTrained),
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let document = SerializableModel::load_from_file(&args.model)?;
    document.validate()?;

    document.print_summary();

    println!("\nDecision Functions:");
    let n_show = document.decision_functions.len().min(10);
    for df in document.decision_functions.iter().take(n_show) {
        let pair = match df
            .class_pair
            .and_then(|(a, b)| Some((document.classes.get(a)?, document.classes.get(b)?)))
        {
            Some((a, b)) => format!("{a} vs {b}"),
            None => "-".to_string(),
        };
        println!(
            "  {pair}: {} support vectors, rho {:.6}",
            df.sv_indices.len(),
            df.rho
        );
    }
    if document.decision_functions.len() > n_show {
        println!("  ... ({} more)", document.decision_functions.len() - n_show);
    }

    Ok(())
}
