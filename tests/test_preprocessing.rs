//! Integration tests for loading, scaling and class balancing

use creditcard_fraud::config::PipelineConfig;
use creditcard_fraud::data::{class_value_counts, column_names, column_values, load_transactions};
use creditcard_fraud::preprocessing::{prepare_features, MinMaxScaler};
use creditcard_fraud::synthetic::{Sampler, SMOTE};
use creditcard_fraud::training::train_test_split;
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Write;

fn transactions(n: usize, n_fraud: usize) -> DataFrame {
    let time: Vec<f64> = (0..n).map(|i| i as f64 * 10.0).collect();
    let v1: Vec<f64> = (0..n).map(|i| ((i * 37) % 11) as f64 - 5.0).collect();
    let v2: Vec<f64> = (0..n).map(|i| ((i * 13) % 7) as f64 * 0.5).collect();
    let amount: Vec<f64> = (0..n).map(|i| 1.0 + ((i * 53) % 97) as f64 * 4.25).collect();
    let class: Vec<f64> = (0..n).map(|i| if i % (n / n_fraud) == 0 { 1.0 } else { 0.0 }).collect();
    df!(
        "Time" => &time,
        "V1" => &v1,
        "V2" => &v2,
        "Amount" => &amount,
        "Class" => &class
    )
    .unwrap()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_keeps_rows_and_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("creditcard.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "Time,V1,V2,Amount,Class").unwrap();
    for i in 0..25 {
        writeln!(file, "{},{},{},{},{}", i, i as f64 * 0.1, i as f64 * -0.5 - 1.0, 10 + i, (i % 5 == 0) as u8).unwrap();
    }
    drop(file);

    let df = load_transactions(&path).unwrap();
    assert_eq!(df.height(), 25);
    assert_eq!(column_names(&df), vec!["Time", "V1", "V2", "Amount", "Class"]);
    assert!(df.dtypes().iter().all(|dt| dt == &DataType::Float64));

    let counts = class_value_counts(&df, "Class").unwrap();
    assert_eq!(counts.get(&1), Some(&5));
    assert_eq!(counts.get(&0), Some(&20));
}

// ============================================================================
// Scaling
// ============================================================================

#[test]
fn test_amount_scaled_to_unit_interval() {
    let df = transactions(60, 6);
    let prepared = prepare_features(&df, &PipelineConfig::default()).unwrap();

    let amount_idx = prepared.feature_names.iter().position(|n| n == "Amount").unwrap();
    let amounts = prepared.features.column(amount_idx);
    assert!(amounts.iter().all(|v| (0.0..=1.0).contains(v)));
    assert_eq!(amounts.iter().cloned().fold(f64::INFINITY, f64::min), 0.0);
    assert_eq!(amounts.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 1.0);

    // Other features are left untouched
    let v1_idx = prepared.feature_names.iter().position(|n| n == "V1").unwrap();
    assert_eq!(prepared.features[[1, v1_idx]], ((37 % 11) as f64) - 5.0);
}

#[test]
fn test_scaler_inverse_restores_amounts() {
    let df = transactions(30, 3);
    let mut scaler = MinMaxScaler::new();
    let scaled = scaler.fit_transform(&df, &["Amount"]).unwrap();
    let restored = scaler.inverse_transform(&scaled).unwrap();

    let original = column_values(&df, "Amount").unwrap();
    let roundtrip = column_values(&restored, "Amount").unwrap();
    for (a, b) in original.iter().zip(roundtrip.iter()) {
        assert!((a - b).abs() < 1e-9);
    }
}

// ============================================================================
// Balancing and splitting
// ============================================================================

#[test]
fn test_smote_balances_and_keeps_majority() {
    let df = transactions(100, 10);
    let prepared = prepare_features(&df, &PipelineConfig::default()).unwrap();

    let mut smote = SMOTE::new().with_seed(42);
    let result = smote.fit_resample(&prepared.features, &prepared.labels).unwrap();
    let counts = result.class_counts();
    assert_eq!(counts.get(&0), Some(&90));
    assert_eq!(counts.get(&1), Some(&90));

    // Originals come first, unchanged
    for i in 0..prepared.features.nrows() {
        assert_eq!(result.x.row(i), prepared.features.row(i));
    }
}

#[test]
fn test_synthetic_rows_lie_within_minority_bounds() {
    let df = transactions(100, 10);
    let prepared = prepare_features(&df, &PipelineConfig::default()).unwrap();
    let mut smote = SMOTE::new().with_seed(7);
    let result = smote.fit_resample(&prepared.features, &prepared.labels).unwrap();

    let minority: Vec<usize> = (0..prepared.labels.len()).filter(|&i| prepared.labels[i] == 1).collect();
    for col in 0..prepared.features.ncols() {
        let lo = minority.iter().map(|&i| prepared.features[[i, col]]).fold(f64::INFINITY, f64::min);
        let hi = minority.iter().map(|&i| prepared.features[[i, col]]).fold(f64::NEG_INFINITY, f64::max);
        for row in prepared.features.nrows()..result.x.nrows() {
            let v = result.x[[row, col]];
            assert!(v >= lo - 1e-12 && v <= hi + 1e-12);
        }
    }
}

#[test]
fn test_split_is_80_20_and_disjoint() {
    let df = transactions(100, 10);
    let prepared = prepare_features(&df, &PipelineConfig::default()).unwrap();
    let mut smote = SMOTE::new();
    let balanced = smote.fit_resample(&prepared.features, &prepared.labels).unwrap();

    let split = train_test_split(&balanced.x, &balanced.y, 0.2, 42).unwrap();
    assert_eq!(split.n_test(), 36);
    assert_eq!(split.n_train(), 144);

    let train: HashSet<usize> = split.train_indices.iter().copied().collect();
    assert!(split.test_indices.iter().all(|i| !train.contains(i)));
    assert_eq!(train.len() + split.test_indices.len(), balanced.x.nrows());
}
