//! Forecast accuracy evaluation over the trailing window

use chrono::Duration;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tracing::{debug, error, info};

use crate::error::{PipelineError, Result};
use crate::exporter::ModelMetrics;
use crate::metrics;
use crate::series::TimeSeries;
use crate::store::{TimeSeriesStore, ACTUALS_COLUMN, FORECAST_COLUMN};

/// One evaluation tick's output: aggregate accuracy over the aligned pairs
/// plus the latest aligned pair for dashboarding.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationReport {
    pub r2: f64,
    pub rmse: f64,
    pub mse: f64,
    /// Latest aligned actual value
    pub actual: f64,
    /// Forecast previously emitted for the same instant
    pub predicted: f64,
    /// Number of aligned pairs the aggregates were computed over
    pub aligned: usize,
}

/// Reads both stores on a fixed cadence, aligns them over the trailing
/// window and publishes accuracy gauges. Never mutates either store.
pub struct Evaluator {
    actuals_path: PathBuf,
    forecast_path: PathBuf,
    window: Duration,
    metrics: ModelMetrics,
}

impl Evaluator {
    pub fn new<P: AsRef<Path>>(
        actuals_path: P,
        forecast_path: P,
        window: Duration,
        metrics: ModelMetrics,
    ) -> Self {
        Self {
            actuals_path: actuals_path.as_ref().to_path_buf(),
            forecast_path: forecast_path.as_ref().to_path_buf(),
            window,
            metrics,
        }
    }

    /// Align two series over `(latest_actual - window, latest_actual]` and
    /// compute accuracy over the timestamps present in both. Instants
    /// present in only one series are excluded, not an error; an empty
    /// intersection (or zero actual variance) is `InsufficientOverlap`.
    pub fn evaluate(
        actuals: &TimeSeries,
        forecast: &TimeSeries,
        window: Duration,
    ) -> Result<EvaluationReport> {
        let latest = match actuals.last() {
            Some(sample) => sample.timestamp,
            None => {
                return Err(PipelineError::InsufficientOverlap(
                    "actuals store is empty".to_string(),
                ))
            }
        };
        let cutoff = latest - window;

        let forecast_by_ts: BTreeMap<_, _> = forecast
            .window_between(cutoff, latest)
            .samples()
            .iter()
            .map(|s| (s.timestamp, s.value))
            .collect();

        let pairs: Vec<(f64, f64)> = actuals
            .window_between(cutoff, latest)
            .samples()
            .iter()
            .filter_map(|s| forecast_by_ts.get(&s.timestamp).map(|&p| (s.value, p)))
            .collect();

        if pairs.is_empty() {
            return Err(PipelineError::InsufficientOverlap(
                "no aligned actual/forecast pairs in the evaluation window".to_string(),
            ));
        }

        let (actual_values, predicted_values): (Vec<f64>, Vec<f64>) =
            pairs.iter().copied().unzip();
        let report = metrics::evaluate_forecast(&actual_values, &predicted_values)?;
        let (actual, predicted) = pairs[pairs.len() - 1];

        Ok(EvaluationReport {
            r2: report.r2,
            rmse: report.rmse,
            mse: report.mse,
            actual,
            predicted,
            aligned: pairs.len(),
        })
    }

    /// One evaluation cycle: re-read both stores, evaluate, publish gauges.
    pub fn tick(&self) -> Result<EvaluationReport> {
        let actuals = TimeSeriesStore::open(&self.actuals_path, ACTUALS_COLUMN)?;
        let forecast = TimeSeriesStore::open(&self.forecast_path, FORECAST_COLUMN)?;

        let resampled = actuals.resample(Duration::minutes(1));
        let report = Self::evaluate(&resampled, &forecast.series(), self.window)?;
        self.metrics.publish(&report);
        Ok(report)
    }

    /// Loop forever with a fixed sleep after each tick. Missing overlap
    /// leaves the previous gauge values untouched for that tick.
    pub fn run(self, interval: StdDuration) {
        info!("starting evaluation loop");
        loop {
            match self.tick() {
                Ok(report) => info!(
                    r2 = report.r2,
                    rmse = report.rmse,
                    mse = report.mse,
                    aligned = report.aligned,
                    "metrics updated"
                ),
                Err(PipelineError::InsufficientOverlap(reason)) => {
                    debug!(reason = %reason, "metrics not updated")
                }
                Err(err) => error!(error = %err, "evaluation tick failed"),
            }
            std::thread::sleep(interval);
        }
    }
}
