use std::path::{Path, PathBuf};

use levy_core::cancel::CancelFlag;
use levy_core::dataset::Dataset;
use levy_core::metrics::{ModelMetrics, ReferenceMetrics};
use levy_core::model_kind::ModelKind;
use levy_model::ModelArtifact;
use levy_retrain::{LedgerRow, RetrainError, RetrainPipeline};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// `rows` chronological observations. `year` doubles as the row index.
fn levy_dataset(rows: usize) -> Dataset {
    let mut region = Vec::with_capacity(rows);
    let mut year = Vec::with_capacity(rows);
    let mut previous = Vec::with_capacity(rows);
    let mut growth = Vec::with_capacity(rows);
    let mut forecast = Vec::with_capacity(rows);
    for i in 0..rows {
        let t = i as f64;
        let r = (i % 4) as f64;
        let g = 0.02 + 0.01 * (t * 0.7).sin();
        let p = 100.0 + 2.0 * t + 5.0 * r + 3.0 * (t * 0.37).sin();
        region.push(r);
        year.push(2000.0 + t);
        previous.push(p);
        growth.push(g);
        forecast.push(p * (1.0 + g) + 0.3 * (t * 1.3).cos());
    }
    Dataset::new(
        ["region_encoded", "year", "previous_value", "growth_rate", "forecast"]
            .map(String::from)
            .to_vec(),
        vec![region, year, previous, growth, forecast],
    )
    .unwrap()
}

fn setup(rows: usize) -> (tempfile::TempDir, PathBuf, RetrainPipeline) {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("data/levy.csv");
    levy_dataset(rows).write_csv(&data_path).unwrap();
    let pipeline = RetrainPipeline::new(&data_path, dir.path().join("models/model.json"));
    (dir, data_path, pipeline)
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

#[test]
fn split_keeps_the_last_twenty_rows_for_testing() {
    let (_dir, _, pipeline) = setup(100);
    let split = pipeline.load_data().unwrap();

    assert_eq!(split.train_target.len(), 80);
    assert_eq!(split.test_target.len(), 20);

    let year_idx = split
        .test_features
        .names()
        .iter()
        .position(|n| n == "year")
        .unwrap();
    let test_years: Vec<f64> = split.test_features.values().column(year_idx).to_vec();
    let expected: Vec<f64> = (80..100_u32).map(|i| 2000.0 + f64::from(i)).collect();
    assert_eq!(test_years, expected);
    assert!(!split.train_features.names().contains(&"forecast".to_string()));
}

#[rstest]
#[case(10, 8, 2)]
#[case(11, 8, 3)]
#[case(2, 1, 1)]
fn test_set_size_rounds_up(#[case] rows: usize, #[case] train: usize, #[case] test: usize) {
    let (_dir, _, pipeline) = setup(rows);
    let split = pipeline.load_data().unwrap();
    assert_eq!(split.train_target.len(), train);
    assert_eq!(split.test_target.len(), test);
}

#[test]
fn single_row_dataset_is_rejected() {
    let (_dir, _, pipeline) = setup(1);
    assert!(matches!(
        pipeline.load_data(),
        Err(RetrainError::InsufficientRows { rows: 1, min: 2 })
    ));
}

#[test]
fn evaluation_uses_the_test_split() {
    let (_dir, _, pipeline) = setup(100);
    let split = pipeline.load_data().unwrap();
    let model =
        RetrainPipeline::train_model(&split.train_features, &split.train_target, ModelKind::Linear)
            .unwrap();

    let eval = RetrainPipeline::evaluate_model(&model, &split.test_features, &split.test_target);
    assert!((eval.rmse - eval.mse.sqrt()).abs() < 1e-12);
    assert!(eval.r_squared > 0.8, "r2 = {}", eval.r_squared);

    let metrics = pipeline.run(None, ModelKind::Linear).unwrap();
    assert!((metrics.mse - eval.mse).abs() < 1e-9);
    assert_eq!(metrics.test_rows, 20);
    assert_eq!(metrics.train_rows, 80);
}

#[rstest]
#[case(ModelKind::Linear)]
#[case(ModelKind::Forest)]
fn repeated_runs_are_reproducible_and_ledgered(#[case] kind: ModelKind) {
    let (_dir, _, pipeline) = setup(60);

    let first = pipeline.run(None, kind).unwrap();
    let second = pipeline.run(None, kind).unwrap();

    let rows = pipeline.history().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].mse, rows[1].mse);
    assert_eq!(rows[0].r_squared, rows[1].r_squared);
    assert!(rows[0].timestamp < rows[1].timestamp);
    assert_eq!((rows[0].model_version, rows[1].model_version), (1, 2));

    assert_eq!(first.mse, second.mse);
    assert_eq!(second.model_version, 2);
}

#[test]
fn commit_writes_artifact_snapshot_and_ledger() {
    let (_dir, data_path, pipeline) = setup(50);
    let metrics = pipeline.run(None, ModelKind::Forest).unwrap();

    let artifact = ModelArtifact::load(pipeline.model_path()).unwrap();
    assert_eq!(artifact.kind(), ModelKind::Forest);
    assert_eq!(artifact.model_version, 1);
    assert_eq!(artifact.target_column, "forecast");

    let reference: ReferenceMetrics =
        levy_core::fs::read_json(pipeline.metrics_path()).unwrap();
    assert_eq!(reference.mse, Some(metrics.mse));
    assert_eq!(reference.mae, Some(metrics.mae));
    assert!(reference.baseline_mean.is_some());

    let predictions = artifact
        .predict_dataset(&Dataset::from_csv_path(&data_path).unwrap())
        .unwrap();
    assert_eq!(predictions.len(), 50);
}

#[test]
fn failed_run_leaves_previous_artifact_untouched() {
    let (dir, _, pipeline) = setup(40);
    pipeline.run(None, ModelKind::Linear).unwrap();
    let artifact_before = read(pipeline.model_path());
    let metrics_before = read(pipeline.metrics_path());

    let broken = dir.path().join("broken.csv");
    std::fs::write(&broken, "year,forecast\n2000,1\n2001,oops\n").unwrap();
    let err = pipeline.run(Some(&broken), ModelKind::Linear).unwrap_err();
    assert!(matches!(err, RetrainError::Data { .. }));
    assert!(!err.is_persistence());

    let no_target = dir.path().join("no_target.csv");
    std::fs::write(&no_target, "year,other\n2000,1\n2001,2\n2002,3\n").unwrap();
    assert!(pipeline.run(Some(&no_target), ModelKind::Linear).is_err());

    assert_eq!(read(pipeline.model_path()), artifact_before);
    assert_eq!(read(pipeline.metrics_path()), metrics_before);
    assert_eq!(pipeline.history().unwrap().len(), 1);
}

#[test]
fn cancelled_run_persists_nothing() {
    let (_dir, _, pipeline) = setup(40);
    let cancel = CancelFlag::new();
    cancel.cancel();

    let err = pipeline
        .run_with_cancel(None, ModelKind::Forest, &cancel)
        .unwrap_err();
    assert!(matches!(err, RetrainError::Cancelled));
    assert!(!pipeline.model_path().exists());
    assert!(!pipeline.metrics_path().exists());
    assert!(pipeline.history().unwrap().is_empty());
}

#[test]
fn unwritable_ledger_is_a_persistence_failure() {
    let (dir, _, pipeline) = setup(30);
    let ledger_dir = dir.path().join("ledger-is-a-dir");
    std::fs::create_dir_all(&ledger_dir).unwrap();
    let pipeline = pipeline.with_history_path(&ledger_dir);

    let err = pipeline.run(None, ModelKind::Linear).unwrap_err();
    assert!(err.is_persistence(), "unexpected error: {err}");
}

#[test]
fn snapshot_and_artifact_carry_the_ledger_timestamp() {
    let (_dir, _, pipeline) = setup(40);
    let ahead = chrono::Utc::now() + chrono::Duration::days(1);
    pipeline
        .ledger()
        .append(LedgerRow {
            timestamp: ahead,
            mse: 1.0,
            mae: 1.0,
            r_squared: 0.5,
            model_version: 1,
        })
        .unwrap();

    let metrics = pipeline.run(None, ModelKind::Linear).unwrap();

    let rows = pipeline.history().unwrap();
    let stored = rows.last().unwrap();
    assert_eq!(stored.model_version, 2);
    assert!(stored.timestamp > ahead);
    assert_eq!(metrics.timestamp, stored.timestamp);

    let snapshot: ModelMetrics = levy_core::fs::read_json(pipeline.metrics_path()).unwrap();
    assert_eq!(snapshot.timestamp, stored.timestamp);
    let artifact = ModelArtifact::load(pipeline.model_path()).unwrap();
    assert_eq!(artifact.trained_at, stored.timestamp);
}
