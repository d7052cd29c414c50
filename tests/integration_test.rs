//! End-to-end scenario: collect, forecast, evaluate against ground truth

use assert_approx_eq::assert_approx_eq;
use chrono::{DateTime, Duration, TimeZone, Utc};
use cpu_forecast::forecaster::ForecasterSettings;
use cpu_forecast::store::{TimeSeriesStore, ACTUALS_COLUMN, FORECAST_COLUMN};
use cpu_forecast::{
    Evaluator, ForecastClient, Forecaster, ModelMetrics, Result, Sample, SaveMode, ScalerFit,
};
use tempfile::tempdir;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn minute(t: i64) -> DateTime<Utc> {
    base() + Duration::minutes(t)
}

/// Stands in for the model endpoint: predicts that the next hour repeats
/// the input window.
struct RepeatWindowClient;

impl ForecastClient for RepeatWindowClient {
    fn predict(&self, window: &[f64]) -> Result<Vec<f64>> {
        Ok(window.to_vec())
    }
}

#[test]
fn test_collect_forecast_evaluate_round_trip() {
    let dir = tempdir().unwrap();
    let actuals_path = dir.path().join("metrics.csv");
    let forecast_path = dir.path().join("predictions.csv");

    // One collected sample per minute for the first hour, values sin(t)
    let mut actuals = TimeSeriesStore::open(&actuals_path, ACTUALS_COLUMN).unwrap();
    for t in 1..=60i64 {
        actuals
            .append(Sample::new(minute(t), (t as f64).sin()))
            .unwrap();
    }

    // The forecaster now has a full window and produces a 60-minute horizon
    let forecast_store = TimeSeriesStore::open(&forecast_path, FORECAST_COLUMN).unwrap();
    let mut forecaster = Forecaster::new(
        &actuals_path,
        forecast_store,
        RepeatWindowClient,
        ForecasterSettings {
            window_len: 60,
            horizon: 60,
            scaler_fit: ScalerFit::History,
            save_mode: SaveMode::Merge,
        },
    );
    assert!(forecaster.tick().unwrap());

    let horizon = forecaster.store().series();
    assert_eq!(horizon.len(), 60);
    assert_eq!(horizon.samples()[0].timestamp, minute(61));
    assert_eq!(horizon.last().unwrap().timestamp, minute(120));

    // Five more actual ticks arrive
    for t in 61..=65i64 {
        actuals
            .append(Sample::new(minute(t), (t as f64).sin()))
            .unwrap();
    }

    let metrics = ModelMetrics::new().unwrap();
    let evaluator = Evaluator::new(
        &actuals_path,
        &forecast_path,
        Duration::minutes(60),
        metrics.clone(),
    );
    let report = evaluator.tick().unwrap();

    // Only minutes 61..=65 exist in both stores
    assert_eq!(report.aligned, 5);

    // Reference metrics computed directly from the five pairs: the forecast
    // for minute 60+i is the window value sin(i)
    let actual: Vec<f64> = (61..=65).map(|t| (t as f64).sin()).collect();
    let predicted: Vec<f64> = (1..=5).map(|t| (t as f64).sin()).collect();

    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    assert_approx_eq!(report.mse, ss_res / n, 1e-9);
    assert_approx_eq!(report.rmse, (ss_res / n).sqrt(), 1e-9);
    assert_approx_eq!(report.r2, 1.0 - ss_res / ss_tot, 1e-9);

    // Latest aligned pair: actual sin(65) against forecast sin(5)
    assert_approx_eq!(report.actual, 65.0_f64.sin(), 1e-9);
    assert_approx_eq!(report.predicted, 5.0_f64.sin(), 1e-9);

    // And the gauges are exposed for scraping
    let exposition = metrics.encode();
    for gauge in [
        "model_r2_score",
        "model_rmse",
        "model_mse",
        "predicted_value",
        "actual_value",
    ] {
        assert!(exposition.contains(gauge), "missing gauge {gauge}");
    }
}

#[test]
fn test_forecast_store_survives_restart_between_components() {
    let dir = tempdir().unwrap();
    let actuals_path = dir.path().join("metrics.csv");
    let forecast_path = dir.path().join("predictions.csv");

    let mut actuals = TimeSeriesStore::open(&actuals_path, ACTUALS_COLUMN).unwrap();
    for t in 1..=10i64 {
        actuals.append(Sample::new(minute(t), t as f64)).unwrap();
    }

    {
        let forecast_store = TimeSeriesStore::open(&forecast_path, FORECAST_COLUMN).unwrap();
        let mut forecaster = Forecaster::new(
            &actuals_path,
            forecast_store,
            RepeatWindowClient,
            ForecasterSettings {
                window_len: 10,
                horizon: 10,
                scaler_fit: ScalerFit::Window,
                save_mode: SaveMode::Merge,
            },
        );
        assert!(forecaster.tick().unwrap());
    }

    // A fresh process sees the same horizon
    let reopened = TimeSeriesStore::open(&forecast_path, FORECAST_COLUMN).unwrap();
    assert_eq!(reopened.len(), 10);
    assert_eq!(reopened.latest_timestamp(), Some(minute(20)));
    assert_eq!(reopened.series().values(), (1..=10).map(|t| t as f64).collect::<Vec<_>>());
}
