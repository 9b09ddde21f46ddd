//! End-to-end fraud detection run
//!
//! Stages run strictly in order: load, prepare, balance, split, train,
//! evaluate, plot, persist. Any stage error ends the run.

use crate::config::PipelineConfig;
use crate::data::{class_value_counts, columns_to_array2, label_vector, load_transactions};
use crate::error::{FraudError, Result};
use crate::evaluation::{evaluate, Evaluation};
use crate::export::{load_model, save_model, ModelMetadata, SerializationFormat};
use crate::preprocessing::prepare_features;
use crate::synthetic::{Sampler, SMOTE};
use crate::training::{forest_from_config, train_test_split, RandomForest};
use crate::visualization::{plot_confusion_matrix, plot_path, render_exploratory_plots, CONFUSION_MATRIX_FILE};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Summary of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Label counts of the raw table
    pub class_counts: BTreeMap<i64, usize>,
    /// Label counts after oversampling
    pub balanced_counts: BTreeMap<i64, usize>,
    /// Synthetic rows added per class
    pub n_synthetic: BTreeMap<i64, usize>,
    pub n_train: usize,
    pub n_test: usize,
    pub feature_names: Vec<String>,
    pub evaluation: Evaluation,
    /// PNG files written, confusion matrix first
    pub plots: Vec<PathBuf>,
    pub model_path: PathBuf,
    /// The fitted forest, as saved
    pub model: RandomForest,
    pub training_time_secs: f64,
}

impl PipelineReport {
    pub fn auc_roc(&self) -> Option<f64> {
        self.evaluation.auc_roc
    }
}

/// Fraud detection pipeline
pub struct FraudPipeline {
    config: PipelineConfig,
}

impl FraudPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured CSV and run every stage
    pub fn run(&self) -> Result<PipelineReport> {
        self.config.validate()?;
        let df = load_transactions(&self.config.data_path)?;
        self.run_on_frame(&df)
    }

    /// Run every stage on an already loaded table
    pub fn run_on_frame(&self, df: &DataFrame) -> Result<PipelineReport> {
        let config = &self.config;
        config.validate()?;
        let start = Instant::now();

        let class_counts = class_value_counts(df, &config.label_column)?;
        info!(
            rows = df.height(),
            legit = class_counts.get(&0).copied().unwrap_or(0),
            fraud = class_counts.get(&1).copied().unwrap_or(0),
            "Class distribution"
        );

        let prepared = prepare_features(df, config)?;

        let mut smote = SMOTE::new()
            .with_k_neighbors(config.k_neighbors)
            .with_seed(config.seed);
        let balanced = smote.fit_resample(&prepared.features, &prepared.labels)?;
        let balanced_counts = balanced.class_counts();
        info!(
            counts = ?balanced_counts,
            synthetic = ?balanced.n_synthetic,
            "Balanced classes"
        );

        let split = train_test_split(&balanced.x, &balanced.y, config.test_size, config.seed)?;
        info!(n_train = split.n_train(), n_test = split.n_test(), "Split dataset");

        let mut model = forest_from_config(config);
        let fit_start = Instant::now();
        model.fit(&split.x_train, &split.y_train)?;
        let training_time_secs = fit_start.elapsed().as_secs_f64();
        info!(
            trees = model.n_trees(),
            secs = training_time_secs,
            "Trained random forest"
        );

        let evaluation = evaluate(&model, &split.x_test, &split.y_test)?;

        let mut plots = Vec::new();
        if config.render_plots {
            let path = plot_path(&config.plots_dir, CONFUSION_MATRIX_FILE)?;
            plot_confusion_matrix(&evaluation.confusion, &path)?;
            debug!(path = %path.display(), "Wrote confusion matrix");
            plots.push(path);
            plots.extend(render_exploratory_plots(&prepared.scaled_frame, config)?);
        }

        let metadata = self.metadata(&model, &prepared.feature_names, &evaluation)
            .with_scaler(prepared.scaler.clone());
        save_model(&model, &config.model_path, metadata, config.model_format)?;
        let (reloaded, _): (RandomForest, ModelMetadata) =
            load_model(&config.model_path, config.model_format)?;
        verify_round_trip(&model, &reloaded, &split.x_test)?;

        info!(
            model = %config.model_path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        Ok(PipelineReport {
            class_counts,
            balanced_counts,
            n_synthetic: balanced.n_synthetic,
            n_train: split.n_train(),
            n_test: split.n_test(),
            feature_names: prepared.feature_names,
            evaluation,
            plots,
            model_path: config.model_path.clone(),
            model,
            training_time_secs,
        })
    }

    fn metadata(&self, model: &RandomForest, features: &[String], evaluation: &Evaluation) -> ModelMetadata {
        let config = &self.config;
        let mut metadata = ModelMetadata::new("random_forest")
            .with_features(features.to_vec())
            .with_target(config.label_column.as_str())
            .add_hyperparameter("n_estimators", model.n_estimators)
            .add_hyperparameter("random_state", model.random_state)
            .add_hyperparameter("max_features", format!("{:?}", model.max_features).to_lowercase())
            .add_hyperparameter("min_samples_split", model.min_samples_split)
            .add_hyperparameter("min_samples_leaf", model.min_samples_leaf)
            .add_hyperparameter("k_neighbors", config.k_neighbors)
            .add_hyperparameter("test_size", config.test_size)
            .add_metric("accuracy", evaluation.report.accuracy);
        if let Some(depth) = model.max_depth {
            metadata = metadata.add_hyperparameter("max_depth", depth);
        }
        if let Some(auc) = evaluation.auc_roc {
            metadata = metadata.add_metric("auc_roc", auc);
        }
        metadata
    }
}

/// Reloaded model must score the holdout identically, bit for bit
fn verify_round_trip(original: &RandomForest, reloaded: &RandomForest, x: &Array2<f64>) -> Result<()> {
    let before = original.predict_proba(x)?;
    let after = reloaded.predict_proba(x)?;
    if before.dim() != after.dim() {
        return Err(FraudError::Shape {
            expected: format!("{:?}", before.dim()),
            actual: format!("{:?}", after.dim()),
        });
    }

    let mismatches = before
        .rows()
        .into_iter()
        .zip(after.rows())
        .filter(|(a, b)| a.iter().zip(b.iter()).any(|(p, q)| p.to_bits() != q.to_bits()))
        .count();
    if mismatches > 0 {
        return Err(FraudError::RoundTripMismatch {
            mismatches,
            total: x.nrows(),
        });
    }
    debug!(rows = x.nrows(), "Reloaded model matches");
    Ok(())
}

/// Predictions for a table scored by a saved model
#[derive(Debug, Clone)]
pub struct ScoredTransactions {
    pub predictions: Array1<i64>,
    pub fraud_proba: Array1<f64>,
    /// Present when the table carries the label column
    pub evaluation: Option<Evaluation>,
    pub metadata: ModelMetadata,
}

/// Score a CSV with a saved model, applying the scaler stored alongside it
pub fn score_transactions(
    model_path: &Path,
    format: SerializationFormat,
    data_path: &Path,
) -> Result<ScoredTransactions> {
    let (model, metadata): (RandomForest, ModelMetadata) = load_model(model_path, format)?;
    let mut df = load_transactions(data_path)?;
    if let Some(scaler) = &metadata.scaler {
        df = scaler.transform(&df)?;
    }

    let x = columns_to_array2(&df, &metadata.feature_names)?;
    let predictions = model.predict(&x)?;
    let fraud_proba = model.predict_class_proba(&x, 1)?;

    let label = metadata.target_name.as_str();
    let evaluation = if df.get_column_names().iter().any(|c| c.as_str() == label) {
        let y = label_vector(&df, label)?;
        Some(evaluate(&model, &x, &y)?)
    } else {
        None
    };
    info!(
        rows = x.nrows(),
        flagged = predictions.iter().filter(|&&p| p == 1).count(),
        "Scored transactions"
    );

    Ok(ScoredTransactions {
        predictions,
        fraud_proba,
        evaluation,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use polars::prelude::{CsvWriter, SerWriter};

    fn small_frame() -> DataFrame {
        df! {
            "Time" => [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0],
            "V1" => [-1.2, -0.8, -1.0, -0.9, -1.1, -0.7, -1.3, -0.95, 2.1, 2.4, 1.9, 2.2],
            "V2" => [0.3, 0.1, 0.2, 0.4, 0.0, 0.25, 0.35, 0.15, -1.5, -1.8, -1.6, -1.7],
            "Amount" => [12.0, 50.0, 3.5, 80.0, 20.0, 9.99, 45.0, 60.0, 500.0, 720.0, 610.0, 880.0],
            "Class" => [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        }
        .unwrap()
    }

    #[test]
    fn test_run_on_frame_without_plots() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default()
            .with_model_path(dir.path().join("model.bin"))
            .with_render_plots(false)
            .with_n_estimators(10);

        let report = FraudPipeline::new(config).run_on_frame(&small_frame()).unwrap();
        assert_eq!(report.class_counts.get(&1), Some(&4));
        assert_eq!(report.balanced_counts.get(&0), Some(&8));
        assert_eq!(report.balanced_counts.get(&1), Some(&8));
        assert_eq!(report.n_train + report.n_test, 16);
        assert_eq!(report.feature_names, vec!["V1", "V2", "Amount"]);
        assert!(report.plots.is_empty());
        assert!(report.model_path.exists());
    }

    #[test]
    fn test_score_saved_model() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("tx.csv");
        let mut frame = small_frame();
        let mut file = std::fs::File::create(&csv).unwrap();
        CsvWriter::new(&mut file)
            .finish(&mut frame)
            .unwrap();

        let config = PipelineConfig::default()
            .with_model_path(dir.path().join("model.json"))
            .with_model_format(SerializationFormat::Json)
            .with_render_plots(false)
            .with_n_estimators(10);
        FraudPipeline::new(config.clone()).run_on_frame(&frame).unwrap();

        let scored = score_transactions(&config.model_path, SerializationFormat::Json, &csv).unwrap();
        assert_eq!(scored.predictions.len(), 12);
        assert!(scored.metadata.scaler.is_some());
        assert!(scored.evaluation.is_some());
    }
}
