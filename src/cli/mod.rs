//! Command-line interface
//!
//! With no subcommand the full training pipeline runs; `predict` scores a
//! CSV with a saved model.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::data::{class_value_counts, load_transactions};
use crate::export::SerializationFormat;
use crate::pipeline::{score_transactions, FraudPipeline, PipelineReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "creditcard-fraud")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Credit-card fraud detection with SMOTE and a random forest")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub train: TrainArgs,
}

/// Overrides for the training run; unset flags fall back to the config
/// file, then to the defaults
#[derive(Args, Debug, Default, Clone)]
pub struct TrainArgs {
    /// Input CSV with Time, V1..V28, Amount and Class columns
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Where to write the trained model
    #[arg(long)]
    pub model_out: Option<PathBuf>,

    /// Model file encoding (binary, json)
    #[arg(long)]
    pub format: Option<SerializationFormat>,

    /// Directory for the PNG plots
    #[arg(long)]
    pub plots_dir: Option<PathBuf>,

    /// Skip plot rendering
    #[arg(long)]
    pub no_plots: bool,

    /// Seed for oversampling, splitting and the forest
    #[arg(long)]
    pub seed: Option<u64>,

    /// Holdout fraction in (0, 1)
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Number of trees
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score transactions with a saved model
    Predict {
        /// Saved model file
        #[arg(short, long)]
        model: PathBuf,

        /// Input CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Model file encoding (binary, json)
        #[arg(long, default_value = "binary")]
        format: SerializationFormat,
    },
}

/// Layer CLI flags over the config file over the defaults
pub fn build_config(args: &TrainArgs) -> crate::error::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(data) = &args.data {
        config = config.with_data_path(data);
    }
    if let Some(model) = &args.model_out {
        config = config.with_model_path(model);
    }
    if let Some(format) = args.format {
        config = config.with_model_format(format);
    }
    if let Some(dir) = &args.plots_dir {
        config = config.with_plots_dir(dir);
    }
    if args.no_plots {
        config = config.with_render_plots(false);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(test_size) = args.test_size {
        config = config.with_test_size(test_size);
    }
    if let Some(n) = args.n_estimators {
        config = config.with_n_estimators(n);
    }

    config.validate()?;
    Ok(config)
}

// ─── Output ────────────────────────────────────────────────────────────────────

/// Value counts in the `label  count` layout, largest class first
pub fn format_class_counts(label: &str, counts: &BTreeMap<i64, usize>) -> String {
    let mut rows: Vec<(&i64, &usize)> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

    let mut out = format!("{}\n", label);
    for (class, count) in rows {
        out.push_str(&format!("{:<5} {:>8}\n", class, count));
    }
    out
}

fn print_report(report: &PipelineReport) {
    println!();
    println!("Classification Report:");
    println!("{}", report.evaluation.report);
    match report.auc_roc() {
        Some(auc) => println!("AUC-ROC Score: {}", auc),
        None => println!("AUC-ROC Score: {}", "undefined (single-class holdout)".yellow()),
    }

    section("Summary");
    kv("Balanced", &format!("{:?}", report.balanced_counts));
    kv("Train / test", &format!("{} / {}", report.n_train, report.n_test));
    let cm = &report.evaluation.confusion;
    kv(
        "TN FP FN TP",
        &format!("{} {} {} {}", cm.tn(), cm.fp(), cm.fn_(), cm.tp()),
    );
    kv("Fit time", &format!("{:.3}s", report.training_time_secs));
    kv("Model", &report.model_path.display().to_string());
    for plot in &report.plots {
        kv("Plot", &plot.display().to_string());
    }
    println!();
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    let config = build_config(args)?;
    section("Train");

    step_run(&format!("Loading {}", config.data_path.display()));
    let start = Instant::now();
    let df = load_transactions(&config.data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    let counts = class_value_counts(&df, &config.label_column)?;
    println!();
    print!("{}", format_class_counts(&config.label_column, &counts));

    step_run(&format!("Training {} trees", config.n_estimators.to_string().cyan()));
    let start = Instant::now();
    let report = FraudPipeline::new(config).run_on_frame(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&report);
    Ok(())
}

pub fn cmd_predict(model: &Path, data: &Path, format: SerializationFormat) -> anyhow::Result<()> {
    section("Predict");

    step_run(&format!("Scoring {}", data.display()));
    let start = Instant::now();
    let scored = score_transactions(model, format, data)?;
    step_done(&format!("{:?}", start.elapsed()));

    let total = scored.predictions.len();
    let flagged = scored.predictions.iter().filter(|&&p| p == 1).count();
    let mut counts = BTreeMap::new();
    for &p in scored.predictions.iter() {
        *counts.entry(p).or_insert(0usize) += 1;
    }

    println!();
    print!("{}", format_class_counts("Predicted", &counts));
    println!();
    kv("Model", &format!("{} v{}", scored.metadata.name, scored.metadata.version));
    kv("Trained at", &scored.metadata.trained_at);
    kv(
        "Fraud rate",
        &format!("{:.4}%", 100.0 * flagged as f64 / total.max(1) as f64),
    );

    if let Some(eval) = &scored.evaluation {
        println!();
        println!("Classification Report:");
        println!("{}", eval.report);
        if let Some(auc) = eval.auc_roc {
            println!("AUC-ROC Score: {}", auc);
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_uses_defaults() {
        let cli = Cli::try_parse_from(["creditcard-fraud"]).unwrap();
        assert!(cli.command.is_none());
        let config = build_config(&cli.train).unwrap();
        assert_eq!(config.data_path, PathBuf::from("creditcard.csv"));
        assert_eq!(config.seed, 42);
        assert!(config.render_plots);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "creditcard-fraud",
            "--data",
            "tx.csv",
            "--format",
            "json",
            "--no-plots",
            "--seed",
            "7",
            "--n-estimators",
            "25",
        ])
        .unwrap();
        let config = build_config(&cli.train).unwrap();
        assert_eq!(config.data_path, PathBuf::from("tx.csv"));
        assert_eq!(config.model_format, SerializationFormat::Json);
        assert!(!config.render_plots);
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_estimators, 25);
    }

    #[test]
    fn test_invalid_test_size_rejected() {
        let cli = Cli::try_parse_from(["creditcard-fraud", "--test-size", "1.5"]).unwrap();
        assert!(build_config(&cli.train).is_err());
    }

    #[test]
    fn test_predict_subcommand() {
        let cli = Cli::try_parse_from([
            "creditcard-fraud",
            "predict",
            "--model",
            "m.bin",
            "--data",
            "tx.csv",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Predict { model, format, .. }) => {
                assert_eq!(model, PathBuf::from("m.bin"));
                assert_eq!(format, SerializationFormat::Binary);
            }
            None => panic!("expected predict"),
        }
    }

    #[test]
    fn test_class_counts_layout() {
        let mut counts = BTreeMap::new();
        counts.insert(0, 284315);
        counts.insert(1, 492);
        assert_eq!(
            format_class_counts("Class", &counts),
            "Class\n0       284315\n1          492\n"
        );
    }
}
