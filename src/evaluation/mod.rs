//! Holdout evaluation
//!
//! Scores the fitted forest on the holdout partition: hard predictions feed
//! the classification report and the confusion matrix, class-1
//! probabilities feed the ROC AUC.

pub mod metrics;

pub use metrics::{accuracy, roc_auc_score, ClassMetrics, ClassificationReport, ConfusionMatrix};

use crate::error::{FraudError, Result};
use crate::training::RandomForest;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Labels reported for the binary fraud task: legitimate, fraud
pub const BINARY_LABELS: [i64; 2] = [0, 1];

/// Everything computed from one holdout pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Hard label per holdout row
    pub predictions: Array1<i64>,
    /// Probability of fraud per holdout row
    pub fraud_proba: Array1<f64>,
    pub report: ClassificationReport,
    /// ROC AUC; `None` when the holdout holds a single class
    pub auc_roc: Option<f64>,
    pub confusion: ConfusionMatrix,
}

/// Evaluate a fitted model on holdout rows
pub fn evaluate(model: &RandomForest, x_test: &Array2<f64>, y_test: &Array1<i64>) -> Result<Evaluation> {
    let predictions = model.predict(x_test)?;
    let fraud_proba = model.predict_class_proba(x_test, 1)?;

    let report = ClassificationReport::compute(y_test, &predictions, &BINARY_LABELS)?;
    let confusion = ConfusionMatrix::compute(y_test, &predictions, &BINARY_LABELS)?;

    let auc_roc = match roc_auc_score(y_test, &fraud_proba) {
        Ok(auc) => Some(auc),
        Err(FraudError::DegenerateClasses(reason)) => {
            warn!(%reason, rows = y_test.len(), "AUC-ROC undefined for this holdout");
            None
        }
        Err(e) => return Err(e),
    };

    info!(
        accuracy = report.accuracy,
        auc_roc = ?auc_roc,
        tp = confusion.tp(),
        fp = confusion.fp(),
        fn_ = confusion.fn_(),
        tn = confusion.tn(),
        "Evaluated holdout"
    );

    Ok(Evaluation {
        predictions,
        fraud_proba,
        report,
        auc_roc,
        confusion,
    })
}
