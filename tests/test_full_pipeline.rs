//! Integration test: Full pipeline (load → scale → balance → split → train → evaluate → persist)

use creditcard_fraud::config::PipelineConfig;
use creditcard_fraud::export::{load_model, SerializationFormat};
use creditcard_fraud::pipeline::FraudPipeline;
use creditcard_fraud::training::RandomForest;
use creditcard_fraud::FraudError;
use polars::prelude::*;

fn ten_row_dataset() -> DataFrame {
    df!(
        "Time" => &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        "V1" => &[-1.36, 1.19, -1.35, -0.97, -1.16, -0.43, 1.23, -0.64, 3.10, 2.85],
        "Amount" => &[149.62, 2.69, 378.66, 123.50, 69.99, 3.67, 4.99, 40.80, 529.00, 1.00],
        "Class" => &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0]
    )
    .unwrap()
}

fn config_in(dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_model_path(dir.join("fraud_detection_model.bin"))
        .with_plots_dir(dir.join("plots"))
}

#[test]
fn test_ten_row_pipeline_with_seed_42() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let report = FraudPipeline::new(config).run_on_frame(&ten_row_dataset()).unwrap();

    assert_eq!(report.class_counts.get(&0), Some(&8));
    assert_eq!(report.class_counts.get(&1), Some(&2));
    assert_eq!(report.balanced_counts.get(&0), Some(&8));
    assert_eq!(report.balanced_counts.get(&1), Some(&8));
    assert_eq!(report.n_synthetic.get(&1), Some(&6));
    assert_eq!((report.n_train, report.n_test), (12, 4));

    let labels: Vec<i64> = report.evaluation.report.classes.iter().map(|(l, _)| *l).collect();
    assert_eq!(labels, vec![0, 1]);
    let text = report.evaluation.report.to_string();
    assert!(text.contains("accuracy"));
    assert!(text.contains("macro avg"));

    assert_eq!(report.feature_names, vec!["V1", "Amount"]);
    assert_eq!(report.plots.len(), 4);
    assert!(report.plots.iter().all(|p| p.exists()));
    assert!(report.model_path.exists());
}

#[test]
fn test_saved_model_reloads_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path()).with_render_plots(false);
    let report = FraudPipeline::new(config.clone()).run_on_frame(&ten_row_dataset()).unwrap();

    let (reloaded, metadata): (RandomForest, _) =
        load_model(&config.model_path, SerializationFormat::Binary).unwrap();
    assert_eq!(metadata.feature_names, report.feature_names);
    assert_eq!(metadata.target_name, "Class");
    assert_eq!(metadata.hyperparameters.get("n_estimators"), Some(&"100".to_string()));

    let x = ndarray::array![[0.1, 0.2], [2.9, 0.9], [-1.0, 0.05]];
    let before = report.model.predict_proba(&x).unwrap();
    let after = reloaded.predict_proba(&x).unwrap();
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_json_model_format() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path())
        .with_model_path(dir.path().join("model.json"))
        .with_model_format(SerializationFormat::Json)
        .with_render_plots(false)
        .with_n_estimators(20);

    FraudPipeline::new(config.clone()).run_on_frame(&ten_row_dataset()).unwrap();

    let raw = std::fs::read_to_string(&config.model_path).unwrap();
    assert!(raw.contains("\"feature_names\""));
    let (forest, _): (RandomForest, _) = load_model(&config.model_path, SerializationFormat::Json).unwrap();
    assert_eq!(forest.n_trees(), 20);
}

#[test]
fn test_runs_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let run = |name: &str| {
        let config = config_in(dir.path())
            .with_model_path(dir.path().join(name))
            .with_render_plots(false)
            .with_n_estimators(25);
        FraudPipeline::new(config).run_on_frame(&ten_row_dataset()).unwrap()
    };

    let first = run("a.bin");
    let second = run("b.bin");
    assert_eq!(first.evaluation.predictions, second.evaluation.predictions);
    assert_eq!(first.evaluation.fraud_proba, second.evaluation.fraud_proba);
    assert_eq!(
        std::fs::read(dir.path().join("a.bin")).unwrap().len(),
        std::fs::read(dir.path().join("b.bin")).unwrap().len()
    );
}

#[test]
fn test_run_from_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("creditcard.csv");
    let mut df = ten_row_dataset();
    let mut file = std::fs::File::create(&csv).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();

    let config = config_in(dir.path())
        .with_data_path(&csv)
        .with_render_plots(false)
        .with_n_estimators(10);
    let report = FraudPipeline::new(config).run().unwrap();
    assert_eq!(report.class_counts.values().sum::<usize>(), 10);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path()).with_data_path(dir.path().join("absent.csv"));
    let err = FraudPipeline::new(config).run().unwrap_err();
    assert!(matches!(err, FraudError::Io(_)));
}

#[test]
fn test_missing_amount_column_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let df = ten_row_dataset().drop("Amount").unwrap();
    let err = FraudPipeline::new(config_in(dir.path()))
        .run_on_frame(&df)
        .unwrap_err();
    assert!(matches!(err, FraudError::MissingColumn(col) if col == "Amount"));
}

#[test]
fn test_single_fraud_row_is_degenerate() {
    let dir = tempfile::tempdir().unwrap();
    let df = df!(
        "Time" => &[0.0, 1.0, 2.0, 3.0, 4.0],
        "V1" => &[0.1, 0.2, 0.3, 0.4, 5.0],
        "Amount" => &[10.0, 20.0, 30.0, 40.0, 50.0],
        "Class" => &[0.0, 0.0, 0.0, 0.0, 1.0]
    )
    .unwrap();
    let err = FraudPipeline::new(config_in(dir.path()))
        .run_on_frame(&df)
        .unwrap_err();
    assert!(matches!(err, FraudError::DegenerateClasses(_)));
}

#[test]
fn test_non_binary_label_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let df = df!(
        "Time" => &[0.0, 1.0, 2.0],
        "V1" => &[0.1, 0.2, 0.3],
        "Amount" => &[10.0, 20.0, 30.0],
        "Class" => &[0.0, 2.0, 1.0]
    )
    .unwrap();
    let err = FraudPipeline::new(config_in(dir.path()))
        .run_on_frame(&df)
        .unwrap_err();
    assert!(matches!(err, FraudError::InvalidLabel { .. }));
}
