//! Credit-card fraud detection
//!
//! Trains a binary classifier on labeled card transactions and persists it:
//! - Load the transaction CSV and min-max scale the amount column
//! - Balance the classes with SMOTE
//! - Seeded 80/20 train/test split
//! - Random forest of 100 CART trees
//! - Classification report, ROC AUC and confusion matrix on the holdout
//! - PNG plots of class balance, feature correlations and amounts
//! - Save the model, reload it and check the reload scores identically
//!
//! # Modules
//!
//! ## Pipeline stages
//! - [`data`] - CSV loading and typed column views
//! - [`preprocessing`] - Amount scaling and feature extraction
//! - [`synthetic`] - SMOTE oversampling
//! - [`training`] - Train/test split, decision trees, random forest
//! - [`evaluation`] - Classification report, AUC, confusion matrix
//! - [`visualization`] - Headless PNG charts
//! - [`export`] - Model serialization with integrity checks
//!
//! ## Orchestration
//! - [`pipeline`] - The end-to-end run
//! - [`config`] - Pipeline settings (defaults, TOML, builders)
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Pipeline stages
pub mod data;
pub mod preprocessing;
pub mod synthetic;
pub mod training;
pub mod evaluation;
pub mod visualization;
pub mod export;

// Orchestration
pub mod pipeline;
pub mod cli;

pub use error::{FraudError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{FraudError, Result};
    pub use crate::config::PipelineConfig;

    pub use crate::data::{class_value_counts, load_transactions};
    pub use crate::preprocessing::{prepare_features, MinMaxScaler, PreparedData};
    pub use crate::synthetic::{ResampleResult, Sampler, SMOTE};
    pub use crate::training::{
        train_test_split, Criterion, DecisionTree, MaxFeatures, RandomForest, TrainTestSplit,
    };
    pub use crate::evaluation::{
        evaluate, roc_auc_score, ClassificationReport, ConfusionMatrix, Evaluation,
    };
    pub use crate::export::{load_model, save_model, ModelMetadata, SerializationFormat};
    pub use crate::pipeline::{score_transactions, FraudPipeline, PipelineReport};
}
