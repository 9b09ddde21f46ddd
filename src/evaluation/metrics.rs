//! Classification metrics

use crate::error::{FraudError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Precision, recall and F1 for one class (or one average)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class report with accuracy and macro/weighted averages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// (label, metrics) in label order
    pub classes: Vec<(i64, ClassMetrics)>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn check_lengths(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(FraudError::Shape {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    Ok(())
}

impl ClassificationReport {
    /// Compute the report for the given label set. Labels with no true or
    /// predicted rows still get a row; undefined ratios are reported as 0.
    pub fn compute(y_true: &Array1<i64>, y_pred: &Array1<i64>, labels: &[i64]) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let cm = ConfusionMatrix::compute(y_true, y_pred, labels)?;

        let classes: Vec<(i64, ClassMetrics)> = labels
            .iter()
            .enumerate()
            .map(|(k, &label)| {
                let tp = cm.matrix[[k, k]];
                let predicted = cm.matrix.column(k).sum();
                let support = cm.matrix.row(k).sum();
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1_score = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                (
                    label,
                    ClassMetrics {
                        precision,
                        recall,
                        f1_score,
                        support,
                    },
                )
            })
            .collect();

        let total: usize = classes.iter().map(|(_, m)| m.support).sum();
        let n = classes.len().max(1) as f64;
        let macro_avg = ClassMetrics {
            precision: classes.iter().map(|(_, m)| m.precision).sum::<f64>() / n,
            recall: classes.iter().map(|(_, m)| m.recall).sum::<f64>() / n,
            f1_score: classes.iter().map(|(_, m)| m.f1_score).sum::<f64>() / n,
            support: total,
        };

        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                classes
                    .iter()
                    .map(|(_, m)| f(m) * m.support as f64)
                    .sum::<f64>()
                    / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|m| m.precision),
            recall: weight(|m| m.recall),
            f1_score: weight(|m| m.f1_score),
            support: total,
        };

        Ok(Self {
            classes,
            accuracy: accuracy(y_true, y_pred),
            macro_avg,
            weighted_avg,
        })
    }

    /// Metrics for one label
    pub fn class(&self, label: i64) -> Option<&ClassMetrics> {
        self.classes.iter().find(|(l, _)| *l == label).map(|(_, m)| m)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self
            .classes
            .iter()
            .map(|(label, _)| label.to_string().len())
            .max()
            .unwrap_or(0)
            .max("weighted avg".len());

        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, m) in &self.classes {
            writeln!(
                f,
                "{:>w$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>w$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1_score, m.support
            )?;
        }
        Ok(())
    }
}

/// Fraction of exact label matches
pub fn accuracy(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> f64 {
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    ratio(correct, y_true.len())
}

/// Counts of actual (rows) against predicted (columns) labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<i64>,
    pub matrix: Array2<usize>,
}

impl ConfusionMatrix {
    /// Build the matrix; rows whose true or predicted label is not in
    /// `labels` are ignored.
    pub fn compute(y_true: &Array1<i64>, y_pred: &Array1<i64>, labels: &[i64]) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let k = labels.len();
        let mut matrix = Array2::zeros((k, k));
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            let row = labels.iter().position(|l| l == t);
            let col = labels.iter().position(|l| l == p);
            if let (Some(r), Some(c)) = (row, col) {
                matrix[[r, c]] += 1;
            }
        }
        Ok(Self {
            labels: labels.to_vec(),
            matrix,
        })
    }

    fn binary_cell(&self, actual: i64, predicted: i64) -> usize {
        let row = self.labels.iter().position(|&l| l == actual);
        let col = self.labels.iter().position(|&l| l == predicted);
        match (row, col) {
            (Some(r), Some(c)) => self.matrix[[r, c]],
            _ => 0,
        }
    }

    /// Legitimate rows predicted legitimate
    pub fn tn(&self) -> usize {
        self.binary_cell(0, 0)
    }

    /// Legitimate rows flagged as fraud
    pub fn fp(&self) -> usize {
        self.binary_cell(0, 1)
    }

    /// Fraud rows missed
    pub fn fn_(&self) -> usize {
        self.binary_cell(1, 0)
    }

    /// Fraud rows caught
    pub fn tp(&self) -> usize {
        self.binary_cell(1, 1)
    }

    pub fn total(&self) -> usize {
        self.matrix.sum()
    }
}

/// Area under the ROC curve for binary labels (positive class = 1).
///
/// Computed from the Mann-Whitney rank statistic; tied scores share their
/// average rank. Undefined, and an error, when `y_true` holds one class.
pub fn roc_auc_score(y_true: &Array1<i64>, scores: &Array1<f64>) -> Result<f64> {
    if y_true.len() != scores.len() {
        return Err(FraudError::Shape {
            expected: format!("{} scores", y_true.len()),
            actual: format!("{} scores", scores.len()),
        });
    }

    let n_pos = y_true.iter().filter(|&&y| y == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(FraudError::DegenerateClasses(
            "ROC AUC needs both classes in y_true".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; a tie group shares the mean of its positions
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&y, _)| y == 1)
        .map(|(_, &r)| r)
        .sum();

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Ok((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_matrix_layout() {
        let y_true = array![0, 0, 1, 1, 1];
        let y_pred = array![0, 1, 1, 1, 0];
        let cm = ConfusionMatrix::compute(&y_true, &y_pred, &[0, 1]).unwrap();
        assert_eq!(cm.matrix, array![[1, 1], [1, 2]]);
        assert_eq!((cm.tn(), cm.fp(), cm.fn_(), cm.tp()), (1, 1, 1, 2));
        assert_eq!(cm.total(), 5);
    }

    #[test]
    fn test_report_values() {
        let y_true = array![0, 1, 1];
        let y_pred = array![0, 0, 1];
        let report = ClassificationReport::compute(&y_true, &y_pred, &[0, 1]).unwrap();

        let zero = report.class(0).unwrap();
        assert_eq!(zero.precision, 0.5);
        assert_eq!(zero.recall, 1.0);
        assert_eq!(zero.support, 1);

        let one = report.class(1).unwrap();
        assert_eq!(one.precision, 1.0);
        assert_eq!(one.recall, 0.5);
        assert_eq!(one.support, 2);

        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.macro_avg.precision - 0.75).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_keeps_absent_label() {
        let y_true = array![0, 0];
        let y_pred = array![0, 0];
        let report = ClassificationReport::compute(&y_true, &y_pred, &[0, 1]).unwrap();
        let one = report.class(1).unwrap();
        assert_eq!(one.support, 0);
        assert_eq!(one.f1_score, 0.0);
    }

    #[test]
    fn test_report_display() {
        let y_true = array![0, 1, 1];
        let y_pred = array![0, 0, 1];
        let text = ClassificationReport::compute(&y_true, &y_pred, &[0, 1])
            .unwrap()
            .to_string();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "              precision    recall  f1-score   support");
        assert_eq!(lines[2], "           0       0.50      1.00      0.67         1");
        assert_eq!(lines[3], "           1       1.00      0.50      0.67         2");
        assert_eq!(lines[5], "    accuracy                           0.67         3");
        assert!(lines[6].starts_with("   macro avg"));
        assert!(lines[7].starts_with("weighted avg"));
    }

    #[test]
    fn test_auc_perfect_and_reversed() {
        let y = array![0, 0, 1, 1];
        let perfect = array![0.1, 0.2, 0.8, 0.9];
        let reversed = array![0.9, 0.8, 0.2, 0.1];
        assert_eq!(roc_auc_score(&y, &perfect).unwrap(), 1.0);
        assert_eq!(roc_auc_score(&y, &reversed).unwrap(), 0.0);
    }

    #[test]
    fn test_auc_with_ties() {
        let y = array![0, 1, 0, 1];
        let scores = array![0.5, 0.5, 0.5, 0.5];
        assert_eq!(roc_auc_score(&y, &scores).unwrap(), 0.5);

        // one positive above every negative, one tied with a negative
        let y = array![0, 0, 1, 1];
        let scores = array![0.1, 0.4, 0.4, 0.9];
        assert_eq!(roc_auc_score(&y, &scores).unwrap(), 0.875);
    }

    #[test]
    fn test_auc_single_class_rejected() {
        let y = array![1, 1];
        let scores = array![0.3, 0.7];
        assert!(matches!(
            roc_auc_score(&y, &scores),
            Err(FraudError::DegenerateClasses(_))
        ));
    }
}
