//! Windowed forecasting: build a scaled input window, call the prediction
//! endpoint, merge the returned horizon into the forecast store

use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tracing::{debug, error, info};

use crate::error::{PipelineError, Result};
use crate::scaler::{MinMaxScaler, ScalerFit};
use crate::series::{Sample, TimeSeries};
use crate::store::{TimeSeriesStore, ACTUALS_COLUMN};

/// A fixed-length slice of minute-resampled, forward-filled actuals used as
/// model input. Exists only at exactly the requested length.
#[derive(Debug, Clone)]
pub struct Window {
    values: Vec<f64>,
    last_timestamp: DateTime<Utc>,
}

impl Window {
    /// Take the last `len` samples of a resampled series. Fails with
    /// `InsufficientData` during warm-up; a partial window is never
    /// returned.
    pub fn from_series(series: &TimeSeries, len: usize) -> Result<Self> {
        if len == 0 || series.len() < len {
            return Err(PipelineError::InsufficientData {
                required: len,
                available: series.len(),
            });
        }
        let tail = &series.samples()[series.len() - len..];
        Ok(Self {
            values: tail.iter().map(|s| s.value).collect(),
            last_timestamp: tail[tail.len() - 1].timestamp,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.last_timestamp
    }
}

/// Abstract interface to the prediction endpoint.
pub trait ForecastClient {
    /// Send one normalized window, receive exactly the configured number of
    /// normalized predictions.
    fn predict(&self, window: &[f64]) -> Result<Vec<f64>>;
}

/// TF-Serving-style HTTP prediction client. The request body carries the
/// window as a `[1][N][1]` array under `instances`; the response must
/// flatten to exactly `horizon` numbers under `predictions`.
pub struct HttpForecastClient {
    client: reqwest::blocking::Client,
    url: String,
    horizon: usize,
}

impl HttpForecastClient {
    pub fn new(url: &str, horizon: usize, timeout: StdDuration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Endpoint(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
            horizon,
        })
    }
}

impl ForecastClient for HttpForecastClient {
    fn predict(&self, window: &[f64]) -> Result<Vec<f64>> {
        let instances: Vec<Vec<[f64; 1]>> = vec![window.iter().map(|&v| [v]).collect()];
        let payload = json!({ "instances": instances });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::Endpoint(e.to_string()))?;

        let body: Value = response
            .json()
            .map_err(|e| PipelineError::Endpoint(e.to_string()))?;
        parse_predictions(&body, self.horizon)
    }
}

/// Extract and validate the prediction values from an endpoint response.
/// Any schema deviation is a hard failure for the tick.
pub fn parse_predictions(body: &Value, horizon: usize) -> Result<Vec<f64>> {
    let predictions = body
        .get("predictions")
        .ok_or_else(|| PipelineError::Endpoint("response has no predictions field".to_string()))?;

    let mut values = Vec::with_capacity(horizon);
    flatten_numbers(predictions, &mut values)?;

    if values.len() != horizon {
        return Err(PipelineError::Endpoint(format!(
            "expected {} predictions, got {}",
            horizon,
            values.len()
        )));
    }
    Ok(values)
}

fn flatten_numbers(value: &Value, out: &mut Vec<f64>) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_numbers(item, out)?;
            }
            Ok(())
        }
        Value::Number(number) => {
            let parsed = number.as_f64().ok_or_else(|| {
                PipelineError::Endpoint(format!("non-finite prediction value {number}"))
            })?;
            out.push(parsed);
            Ok(())
        }
        other => Err(PipelineError::Endpoint(format!(
            "non-numeric prediction value {other}"
        ))),
    }
}

/// How a new horizon is saved into the forecast store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SaveMode {
    /// Keep stored samples before the horizon's first timestamp, replace
    /// everything at or after it.
    Merge,
    /// Replace the whole store with the new horizon.
    Overwrite,
}

/// Forecaster tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct ForecasterSettings {
    /// Input window length in resample units
    pub window_len: usize,
    /// Number of predicted samples per call
    pub horizon: usize,
    pub scaler_fit: ScalerFit,
    pub save_mode: SaveMode,
}

impl Default for ForecasterSettings {
    fn default() -> Self {
        Self {
            window_len: 60,
            horizon: 60,
            scaler_fit: ScalerFit::History,
            save_mode: SaveMode::Merge,
        }
    }
}

/// Reads the actuals store on a fixed cadence, predicts the next horizon
/// from the trailing window, and merges the result into the forecast store.
///
/// A tick is a no-op unless the actuals store's latest timestamp has
/// advanced past the one consumed by the previous successful run; the
/// marker is advanced only on success, so a failed tick retries the same
/// new data next time.
pub struct Forecaster<C: ForecastClient> {
    actuals_path: PathBuf,
    store: TimeSeriesStore,
    client: C,
    settings: ForecasterSettings,
    scaler: Option<MinMaxScaler>,
    last_run: Option<DateTime<Utc>>,
}

impl<C: ForecastClient> Forecaster<C> {
    pub fn new<P: AsRef<Path>>(
        actuals_path: P,
        store: TimeSeriesStore,
        client: C,
        settings: ForecasterSettings,
    ) -> Self {
        Self {
            actuals_path: actuals_path.as_ref().to_path_buf(),
            store,
            client,
            settings,
            scaler: None,
            last_run: None,
        }
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    /// One forecast cycle. `Ok(false)` means no new actuals since the last
    /// successful run.
    pub fn tick(&mut self) -> Result<bool> {
        let actuals = TimeSeriesStore::open(&self.actuals_path, ACTUALS_COLUMN)?;
        let latest = match actuals.latest_timestamp() {
            Some(latest) => latest,
            None => {
                return Err(PipelineError::InsufficientData {
                    required: self.settings.window_len,
                    available: 0,
                })
            }
        };
        if let Some(marker) = self.last_run {
            if latest <= marker {
                return Ok(false);
            }
        }

        let resampled = actuals.resample(Duration::minutes(1));
        let window = Window::from_series(&resampled, self.settings.window_len)?;

        let scaler = self.scaler_for(&actuals, &window)?;
        let scaled = scaler.transform(window.values());
        let predictions = self.client.predict(&scaled)?;
        let horizon = build_horizon(
            window.last_timestamp(),
            &scaler.inverse_transform(&predictions),
        );

        match self.settings.save_mode {
            SaveMode::Merge => self.store.merge_horizon(&horizon)?,
            SaveMode::Overwrite => self.store.replace_all(&horizon)?,
        }

        self.last_run = Some(latest);
        Ok(true)
    }

    fn scaler_for(&mut self, actuals: &TimeSeriesStore, window: &Window) -> Result<MinMaxScaler> {
        match self.settings.scaler_fit {
            ScalerFit::Window => MinMaxScaler::fit(window.values()),
            ScalerFit::History => {
                if let Some(scaler) = self.scaler {
                    return Ok(scaler);
                }
                let scaler = MinMaxScaler::fit(&actuals.series().values())?;
                self.scaler = Some(scaler);
                Ok(scaler)
            }
        }
    }

    /// Loop forever with a fixed sleep after each tick. All failures are
    /// logged and skipped; warm-up is reported quietly.
    pub fn run(mut self, interval: StdDuration) {
        info!("starting prediction loop");
        loop {
            match self.tick() {
                Ok(true) => info!("forecast horizon saved"),
                Ok(false) => debug!("no new data to process"),
                Err(err @ PipelineError::InsufficientData { .. }) => {
                    info!(error = %err, "waiting for a full input window")
                }
                Err(err) => error!(error = %err, "prediction tick failed"),
            }
            std::thread::sleep(interval);
        }
    }
}

/// Timestamps `last_input + 1 unit .. + horizon units`, one per prediction.
fn build_horizon(last_input: DateTime<Utc>, values: &[f64]) -> Vec<Sample> {
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| Sample::new(last_input + Duration::minutes(i as i64 + 1), value))
        .collect()
}
