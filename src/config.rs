//! Pipeline configuration from flags and environment variables

use chrono::Duration;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use crate::forecaster::{ForecasterSettings, SaveMode};
use crate::scaler::ScalerFit;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    #[clap(subcommand)]
    pub role: Option<Role>,

    /// Base URL of the Prometheus server polled for actuals
    #[clap(long, env = "PROMETHEUS_URL", default_value = "http://prometheus-server:9090")]
    pub prometheus_url: String,

    /// PromQL expression for the monitored quantity
    #[clap(
        long,
        env = "PROMETHEUS_QUERY",
        default_value = "sum(rate(container_cpu_usage_seconds_total{container=\"nginx\"}[5m]))"
    )]
    pub prometheus_query: String,

    /// URL of the deployed prediction endpoint
    #[clap(
        long,
        env = "MODEL_URL",
        default_value = "http://cpu-usage-forecaster-predictor-00001-private/v1/models/cpu-usage-forecaster:predict"
    )]
    pub model_url: String,

    /// Actuals store file
    #[clap(long, env = "METRICS_PATH", default_value = "/data/metrics.csv")]
    pub actuals_path: PathBuf,

    /// Forecast store file
    #[clap(long, env = "PREDICTIONS_PATH", default_value = "/data/predictions.csv")]
    pub forecast_path: PathBuf,

    /// Seconds between collector polls
    #[clap(long, env = "QUERY_INTERVAL", default_value_t = 1)]
    pub collect_interval_secs: u64,

    /// Seconds between forecaster ticks
    #[clap(long, default_value_t = 60)]
    pub forecast_interval_secs: u64,

    /// Seconds between evaluator ticks
    #[clap(long, default_value_t = 60)]
    pub evaluate_interval_secs: u64,

    /// Input window length in minutes
    #[clap(long, default_value_t = 60)]
    pub window_len: usize,

    /// Forecast horizon length in minutes
    #[clap(long, default_value_t = 60)]
    pub horizon: usize,

    /// Trailing evaluation window in minutes
    #[clap(long, default_value_t = 60)]
    pub evaluation_window_mins: i64,

    /// Timeout for external HTTP calls in seconds
    #[clap(long, default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Whether the scaler is fitted once from history or refit per window
    #[clap(long, value_enum, default_value = "history")]
    pub scaler_fit: ScalerFit,

    /// How a new horizon is saved into the forecast store
    #[clap(long, value_enum, default_value = "merge")]
    pub save_mode: SaveMode,

    /// Port for the metrics exposition endpoint
    #[clap(long, env = "METRICS_PORT", default_value_t = 8000)]
    pub metrics_port: u16,
}

impl Config {
    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::All)
    }

    pub fn collect_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.collect_interval_secs)
    }

    pub fn forecast_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.forecast_interval_secs)
    }

    pub fn evaluate_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.evaluate_interval_secs)
    }

    pub fn request_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.request_timeout_secs)
    }

    pub fn evaluation_window(&self) -> Duration {
        Duration::minutes(self.evaluation_window_mins)
    }

    pub fn forecaster_settings(&self) -> ForecasterSettings {
        ForecasterSettings {
            window_len: self.window_len,
            horizon: self.horizon,
            scaler_fit: self.scaler_fit,
            save_mode: self.save_mode,
        }
    }
}

/// Which pipeline component(s) this process runs.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Poll the metrics source and append to the actuals store
    Collector,
    /// Predict the next horizon whenever new actuals arrive
    Forecaster,
    /// Evaluate forecast accuracy and expose the gauges
    Evaluator,
    /// Run all three components in one process
    All,
}
