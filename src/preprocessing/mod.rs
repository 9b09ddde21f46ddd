//! Feature preparation
//!
//! Rescales the transaction amount into [0, 1], separates the label and
//! drops the columns that are not model inputs.
//!
//! The scaler is fit on the whole table, before the train/test split, so
//! the holdout rows influence the learned min and max. That leaks holdout
//! information into preprocessing. Reported metrics are computed against
//! this leaky scaling.

mod scaler;

pub use scaler::{ColumnRange, MinMaxScaler};

use crate::config::PipelineConfig;
use crate::data::{column_names, columns_to_array2, label_vector, validate_schema};
use crate::error::Result;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use tracing::info;

/// Model inputs derived from the transaction table
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Feature matrix (rows aligned with `labels`)
    pub features: Array2<f64>,
    /// Binary label per row
    pub labels: Array1<i64>,
    /// Column name of each feature
    pub feature_names: Vec<String>,
    /// The full table with the scaled column overwritten
    pub scaled_frame: DataFrame,
    /// Fitted amount scaler
    pub scaler: MinMaxScaler,
}

/// Scale, drop and split the table into features and labels
pub fn prepare_features(df: &DataFrame, config: &PipelineConfig) -> Result<PreparedData> {
    validate_schema(df, &config.required_columns())?;

    let mut scaler = MinMaxScaler::new();
    let scaled_frame = scaler.fit_transform(df, &[config.scaled_column.as_str()])?;

    let feature_names: Vec<String> = column_names(&scaled_frame)
        .into_iter()
        .filter(|name| name != &config.label_column && !config.dropped_columns.contains(name))
        .collect();

    let features = columns_to_array2(&scaled_frame, &feature_names)?;
    let labels = label_vector(&scaled_frame, &config.label_column)?;

    info!(
        rows = features.nrows(),
        features = features.ncols(),
        scaled = %config.scaled_column,
        "Prepared feature matrix"
    );

    Ok(PreparedData {
        features,
        labels,
        feature_names,
        scaled_frame,
        scaler,
    })
}
