use std::cell::Cell;
use std::path::Path;

use chrono::{Duration, Utc};
use levy_core::dataset::Dataset;
use levy_core::drift::{MonitorOutcome, ValueDrift};
use levy_drift::DriftDetector;
use levy_model::linear::LinearRegression;
use levy_model::{ModelArtifact, RegressionModel};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

fn detector_in(dir: &Path) -> DriftDetector {
    DriftDetector::new(dir.join("model.json"), dir.join("model_metrics.json"))
        .with_reference_data_path(dir.join("reference.csv"))
}

fn dataset(columns: &[&str], data: Vec<Vec<f64>>) -> Dataset {
    Dataset::new(columns.iter().map(|c| (*c).to_string()).collect(), data).unwrap()
}

/// `forecast = x` model, so residuals are exactly `forecast - x`.
fn identity_model() -> ModelArtifact {
    ModelArtifact {
        model_version: 1,
        trained_at: Utc::now(),
        feature_names: vec!["x".into()],
        target_column: "forecast".into(),
        model: RegressionModel::Linear(LinearRegression {
            intercept: 0.0,
            coefficients: vec![1.0],
        }),
    }
}

/// Rows whose residuals alternate `+r` / `-r`, giving MSE = r² and MAE = r.
fn residual_dataset(r: f64, n: usize) -> Dataset {
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let y: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, v)| if i % 2 == 0 { v + r } else { v - r })
        .collect();
    dataset(&["x", "forecast"], vec![x, y])
}

fn write_metrics(path: &Path, json: &serde_json::Value) {
    std::fs::write(path, serde_json::to_vec(json).unwrap()).unwrap();
}

fn normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[rstest]
#[case(16.0, true, 6.0)]
#[case(15.0, false, 5.0)]
#[case(5.0, false, 5.0)]
#[case(4.9, true, 5.1)]
#[case(10.0, false, 0.0)]
fn value_drift_uses_strict_threshold(
    #[case] value: f64,
    #[case] expect_drift: bool,
    #[case] magnitude: f64,
) {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path())
        .with_baseline_mean(10.0)
        .with_threshold(5.0);

    let (drift, got) = detector.check_value_drift(value).as_tuple();
    assert_eq!(drift, expect_drift);
    assert!((got - magnitude).abs() < 1e-9);
}

#[test]
fn value_drift_without_baseline_is_undetermined() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());

    let result = detector.check_value_drift(1_000.0);
    assert_eq!(result, ValueDrift::Undetermined);
    assert!(!result.is_drift());
    assert_eq!(result.as_tuple(), (false, 0.0));
}

#[test]
fn baseline_mean_loads_from_metrics_unless_explicit() {
    let dir = tempfile::tempdir().unwrap();
    write_metrics(
        &dir.path().join("model_metrics.json"),
        &serde_json::json!({"mse": 1.0, "mae": 0.8, "baseline_mean": 12.0}),
    );

    let loaded = detector_in(dir.path());
    assert_eq!(loaded.baseline_mean(), Some(12.0));
    assert!(loaded.check_value_drift(17.5).is_drift());

    let explicit = detector_in(dir.path()).with_baseline_mean(20.0);
    assert_eq!(explicit.baseline_mean(), Some(20.0));
}

#[test]
fn unreadable_metrics_leave_baseline_unset() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("model_metrics.json"), "not json").unwrap();
    assert_eq!(detector_in(dir.path()).baseline_mean(), None);
}

#[test]
fn shifted_feature_mean_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());
    let reference = dataset(
        &["year", "growth_rate"],
        vec![vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![0.1, 0.2, 0.1, 0.2, 0.1]],
    );
    let current = dataset(
        &["year", "growth_rate"],
        vec![vec![11.0, 12.0, 13.0, 14.0, 15.0], vec![0.1, 0.2, 0.1, 0.2, 0.1]],
    );

    let result = detector.check_distribution_drift(&current, Some(&reference), None);
    assert!(result.drift_detected);
    assert!(result.features["year"].drift_detected);
    assert!(!result.features["growth_rate"].drift_detected);
    assert!(result.error.is_none());
    assert!(!result.features.contains_key("region_encoded"));
}

#[test]
fn zero_reference_std_is_treated_as_one() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());
    let reference = dataset(&["year"], vec![vec![5.0, 5.0, 5.0]]);

    let small = dataset(&["year"], vec![vec![6.5, 6.5]]);
    let result = detector.check_distribution_drift(&small, Some(&reference), None);
    assert!((result.features["year"].z_score - 1.5).abs() < 1e-12);
    assert!(!result.drift_detected);

    let large = dataset(&["year"], vec![vec![7.5, 7.5]]);
    assert!(detector.check_distribution_drift(&large, Some(&reference), None).drift_detected);
}

#[test]
fn explicit_feature_columns_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());
    let reference = dataset(&["custom"], vec![vec![0.0, 1.0, 0.0, 1.0]]);
    let current = dataset(&["custom"], vec![vec![10.0, 11.0]]);

    let cols = vec!["custom".to_string()];
    let result = detector.check_distribution_drift(&current, Some(&reference), Some(&cols));
    assert!(result.features["custom"].drift_detected);
}

#[test]
fn missing_reference_file_reports_error_without_drift() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());
    let current = dataset(&["year"], vec![vec![1.0, 2.0]]);

    let result = detector.check_distribution_drift(&current, None, None);
    assert!(!result.drift_detected);
    assert!(result.error.is_some());
}

#[test]
fn reference_file_is_loaded_when_not_supplied() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("reference.csv"), "year\n1\n2\n3\n").unwrap();
    let detector = detector_in(dir.path());
    let current = dataset(&["year"], vec![vec![50.0, 51.0]]);

    let result = detector.check_distribution_drift(&current, None, None);
    assert!(result.error.is_none());
    assert!(result.drift_detected);
}

#[test]
fn identical_distributions_have_bounded_false_positive_rate() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());
    let mut rng = StdRng::seed_from_u64(7);
    let trials: u32 = 2_000;

    // Single-row windows: the z-score is one standard normal draw, so the
    // 2.0 cutoff fires about 4.6% of the time.
    let mut single_row_hits: u32 = 0;
    // 30-row windows: the mean's spread shrinks by sqrt(30), so hits are rare.
    let mut window_hits: u32 = 0;

    for _ in 0..trials {
        let reference: Vec<f64> = (0..500).map(|_| normal(&mut rng)).collect();
        let reference = dataset(&["year"], vec![reference]);

        let single = dataset(&["year"], vec![vec![normal(&mut rng)]]);
        if detector
            .check_distribution_drift(&single, Some(&reference), None)
            .drift_detected
        {
            single_row_hits += 1;
        }

        let window: Vec<f64> = (0..30).map(|_| normal(&mut rng)).collect();
        let window = dataset(&["year"], vec![window]);
        if detector
            .check_distribution_drift(&window, Some(&reference), None)
            .drift_detected
        {
            window_hits += 1;
        }
    }

    let single_rate = f64::from(single_row_hits) / f64::from(trials);
    let window_rate = f64::from(window_hits) / f64::from(trials);
    assert!(
        (0.025..=0.07).contains(&single_rate),
        "single-row false positive rate {single_rate}"
    );
    assert!(window_rate < 0.005, "window false positive rate {window_rate}");
}

#[rstest]
#[case(1.3_f64.sqrt(), true)]
#[case(1.1_f64.sqrt(), false)]
fn prediction_drift_compares_relative_mse(#[case] residual: f64, #[case] expect_drift: bool) {
    let dir = tempfile::tempdir().unwrap();
    write_metrics(
        &dir.path().join("model_metrics.json"),
        &serde_json::json!({"mse": 1.0, "mae": residual}),
    );
    let detector = detector_in(dir.path());

    let result =
        detector.check_prediction_drift(&identity_model(), &residual_dataset(residual, 20), None);
    let expected_change = residual * residual - 1.0;
    assert!((result.mse_change.unwrap() - expected_change).abs() < 1e-9);
    assert!(result.mae_change.unwrap().abs() < 1e-9);
    assert_eq!(result.drift_detected, expect_drift);
}

#[test]
fn unchanged_errors_are_not_drift() {
    let dir = tempfile::tempdir().unwrap();
    write_metrics(
        &dir.path().join("model_metrics.json"),
        &serde_json::json!({"mse": 0.25, "mae": 0.5}),
    );
    let detector = detector_in(dir.path());

    let result = detector.check_prediction_drift(&identity_model(), &residual_dataset(0.5, 10), None);
    assert!(!result.drift_detected);
    assert!(result.mse_change.unwrap().abs() < 1e-9);
}

#[test]
fn no_reference_metrics_reports_current_errors_only() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());

    let result = detector.check_prediction_drift(&identity_model(), &residual_dataset(2.0, 10), None);
    assert!(!result.drift_detected);
    assert!(!result.has_reference());
    assert!((result.current_mse.unwrap() - 4.0).abs() < 1e-9);
    assert!((result.current_mae.unwrap() - 2.0).abs() < 1e-9);
}

#[test]
fn missing_target_column_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());
    let data = dataset(&["x"], vec![vec![1.0]]);

    let result = detector.check_prediction_drift(&identity_model(), &data, None);
    assert!(!result.drift_detected);
    assert!(result.error.unwrap().contains("forecast"));
}

#[test]
fn monitor_with_missing_inputs_returns_error_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let detector = detector_in(dir.path());

    let outcome =
        detector.monitor_and_alert(&dir.path().join("absent.csv"), None, Duration::days(7));
    match outcome {
        MonitorOutcome::Error(failure) => assert!(failure.message.contains("Model file not found")),
        other => panic!("expected error outcome, got {other:?}"),
    }
}

#[test]
fn monitor_with_missing_dataset_names_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    identity_model().save(&dir.path().join("model.json")).unwrap();
    let detector = detector_in(dir.path());

    let outcome =
        detector.monitor_and_alert(&dir.path().join("absent.csv"), None, Duration::days(7));
    let serialized = serde_json::to_value(&outcome).unwrap();
    assert_eq!(serialized["status"], "error");
    assert!(serialized["message"].as_str().unwrap().contains("Data file not found"));
}

#[test]
fn monitor_alerts_synchronously_on_drift() {
    let dir = tempfile::tempdir().unwrap();
    identity_model().save(&dir.path().join("model.json")).unwrap();
    write_metrics(
        &dir.path().join("model_metrics.json"),
        &serde_json::json!({"mse": 0.01, "mae": 0.1}),
    );
    let data_path = dir.path().join("data.csv");
    residual_dataset(3.0, 20).write_csv(&data_path).unwrap();
    std::fs::copy(&data_path, dir.path().join("reference.csv")).unwrap();

    let calls = Cell::new(0);
    let alert = |check: &levy_core::drift::DriftCheckResult| {
        assert!(check.drift_detected);
        calls.set(calls.get() + 1);
    };

    let detector = detector_in(dir.path());
    let outcome = detector.monitor_and_alert(&data_path, Some(&alert), Duration::hours(24));

    assert_eq!(calls.get(), 1);
    assert!(outcome.drift_detected());
    let check = outcome.check().unwrap();
    assert!(check.prediction_drift.drift_detected);
    assert!(!check.distribution_drift.drift_detected);
    assert_eq!(check.next_check_time - check.timestamp, Duration::hours(24));
}

#[test]
fn monitor_without_drift_skips_alert() {
    let dir = tempfile::tempdir().unwrap();
    identity_model().save(&dir.path().join("model.json")).unwrap();
    write_metrics(
        &dir.path().join("model_metrics.json"),
        &serde_json::json!({"mse": 1.0, "mae": 1.0}),
    );
    let data_path = dir.path().join("data.csv");
    residual_dataset(1.0, 20).write_csv(&data_path).unwrap();
    std::fs::copy(&data_path, dir.path().join("reference.csv")).unwrap();

    let calls = Cell::new(0);
    let alert = |_: &levy_core::drift::DriftCheckResult| calls.set(calls.get() + 1);

    let outcome = detector_in(dir.path()).monitor_and_alert(&data_path, Some(&alert), Duration::days(7));
    assert_eq!(calls.get(), 0);
    assert_eq!(outcome.status(), "ok");
}
