//! Plot rendering
//!
//! Charts are written as PNG files so the pipeline runs headless. Drawing
//! goes through a small raster [`canvas`] on top of the `image` crate.

mod canvas;
mod charts;
pub mod stats;

pub use charts::{
    plot_amount_distribution, plot_class_distribution, plot_confusion_matrix,
    plot_correlation_heatmap,
};
pub use stats::{correlation_matrix, gaussian_kde, histogram, pearson};

use crate::config::PipelineConfig;
use crate::data::{class_value_counts, column_names, column_values, label_vector};
use crate::error::Result;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFUSION_MATRIX_FILE: &str = "confusion_matrix.png";
pub const CLASS_DISTRIBUTION_FILE: &str = "class_distribution.png";
pub const CORRELATION_HEATMAP_FILE: &str = "correlation_heatmap.png";
pub const AMOUNT_DISTRIBUTION_FILE: &str = "amount_distribution.png";

/// Create the plot directory if needed and return `dir/file`
pub(crate) fn plot_path(dir: &Path, file: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(file))
}

/// Render the class-balance, correlation and amount plots over the full
/// (scaled) table. Returns the written paths in that order.
pub fn render_exploratory_plots(frame: &DataFrame, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let dir = config.plots_dir.as_path();
    let mut written = Vec::with_capacity(3);

    let counts = class_value_counts(frame, &config.label_column)?;
    let path = plot_path(dir, CLASS_DISTRIBUTION_FILE)?;
    plot_class_distribution(&counts, &path)?;
    debug!(path = %path.display(), "Wrote class distribution");
    written.push(path);

    let names = column_names(frame);
    let columns = names
        .iter()
        .map(|name| column_values(frame, name))
        .collect::<Result<Vec<_>>>()?;
    let corr = correlation_matrix(&columns);
    let path = plot_path(dir, CORRELATION_HEATMAP_FILE)?;
    plot_correlation_heatmap(&names, &corr, &path)?;
    debug!(path = %path.display(), "Wrote correlation heatmap");
    written.push(path);

    let amounts = column_values(frame, &config.scaled_column)?;
    let labels = label_vector(frame, &config.label_column)?;
    let (mut fraud, mut legit) = (Vec::new(), Vec::new());
    for (amount, label) in amounts.into_iter().zip(labels.iter()) {
        if *label == 1 {
            fraud.push(amount);
        } else {
            legit.push(amount);
        }
    }
    let path = plot_path(dir, AMOUNT_DISTRIBUTION_FILE)?;
    plot_amount_distribution(&fraud, &legit, &path)?;
    debug!(path = %path.display(), "Wrote amount distribution");
    written.push(path);

    info!(dir = %dir.display(), count = written.len(), "Rendered exploratory plots");
    Ok(written)
}
