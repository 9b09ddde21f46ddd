//! Pipeline configuration
//!
//! Defaults describe the standard run: `creditcard.csv` in the working
//! directory, `Amount` min-max scaled, `Class`/`Time` dropped,
//! seed 42 everywhere, an 80/20 split and a 100-tree forest.

use crate::error::{FraudError, Result};
use crate::export::SerializationFormat;
use crate::training::MaxFeatures;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a single pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input CSV file
    pub data_path: PathBuf,

    /// Where the fitted model is written
    pub model_path: PathBuf,

    /// Model file encoding
    pub model_format: SerializationFormat,

    /// Directory for rendered plots
    pub plots_dir: PathBuf,

    /// Whether to render plots at all
    pub render_plots: bool,

    /// Column rescaled into [0, 1]
    pub scaled_column: String,

    /// Columns removed from the feature matrix
    pub dropped_columns: Vec<String>,

    /// Binary label column
    pub label_column: String,

    /// Seed shared by the balancer, the splitter and the forest
    pub seed: u64,

    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Neighbors considered when interpolating synthetic samples
    pub k_neighbors: usize,

    /// Number of trees in the forest
    pub n_estimators: usize,

    /// Maximum tree depth (unbounded when absent)
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node
    pub min_samples_split: usize,

    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,

    /// Features considered at each split
    pub max_features: MaxFeatures,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("creditcard.csv"),
            model_path: PathBuf::from("fraud_detection_model.bin"),
            model_format: SerializationFormat::Binary,
            plots_dir: PathBuf::from("plots"),
            render_plots: true,
            scaled_column: "Amount".to_string(),
            dropped_columns: vec!["Class".to_string(), "Time".to_string()],
            label_column: "Class".to_string(),
            seed: 42,
            test_size: 0.2,
            k_neighbors: 5,
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML file; absent keys keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the input file
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Builder method to set the model output file
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Builder method to set the model file encoding
    pub fn with_model_format(mut self, format: SerializationFormat) -> Self {
        self.model_format = format;
        self
    }

    /// Builder method to set the plot directory
    pub fn with_plots_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plots_dir = dir.into();
        self
    }

    /// Builder method to enable or disable plot rendering
    pub fn with_render_plots(mut self, render: bool) -> Self {
        self.render_plots = render;
        self
    }

    /// Builder method to set the shared seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the holdout fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set the SMOTE neighbor count
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    /// Builder method to set the number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Builder method to cap tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Reject values that would make a stage meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(FraudError::invalid_parameter(
                "test_size",
                self.test_size,
                "must lie strictly between 0 and 1",
            ));
        }
        if self.n_estimators == 0 {
            return Err(FraudError::invalid_parameter(
                "n_estimators",
                self.n_estimators,
                "need at least one tree",
            ));
        }
        if self.k_neighbors == 0 {
            return Err(FraudError::invalid_parameter(
                "k_neighbors",
                self.k_neighbors,
                "need at least one neighbor",
            ));
        }
        if self.min_samples_split < 2 {
            return Err(FraudError::invalid_parameter(
                "min_samples_split",
                self.min_samples_split,
                "must be at least 2",
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(FraudError::invalid_parameter(
                "min_samples_leaf",
                self.min_samples_leaf,
                "must be at least 1",
            ));
        }
        if self.label_column == self.scaled_column {
            return Err(FraudError::Config(format!(
                "label column {} cannot also be the scaled column",
                self.label_column
            )));
        }
        Ok(())
    }

    /// Every column the input file must carry
    pub fn required_columns(&self) -> Vec<String> {
        let mut cols = vec![self.scaled_column.clone(), self.label_column.clone()];
        for col in &self.dropped_columns {
            if !cols.contains(col) {
                cols.push(col.clone());
            }
        }
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.data_path, PathBuf::from("creditcard.csv"));
        assert_eq!(config.seed, 42);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.k_neighbors, 5);
        assert_eq!(config.scaled_column, "Amount");
        assert_eq!(config.dropped_columns, vec!["Class", "Time"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides() {
        let config = PipelineConfig::from_toml_str(
            r#"
            seed = 7
            n_estimators = 10
            model_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_estimators, 10);
        assert_eq!(config.model_format, SerializationFormat::Json);
        // untouched keys keep defaults
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.label_column, "Class");
    }

    #[test]
    fn test_invalid_test_size() {
        let config = PipelineConfig::default().with_test_size(1.5);
        assert!(matches!(
            config.validate(),
            Err(FraudError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_required_columns() {
        let config = PipelineConfig::default();
        assert_eq!(config.required_columns(), vec!["Amount", "Class", "Time"]);
    }
}
