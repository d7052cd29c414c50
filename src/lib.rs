//! # cpu_forecast
//!
//! A CPU usage collection, forecasting and accuracy-monitoring pipeline.
//!
//! Three components share two CSV-backed time series stores and compose
//! into a feedback loop:
//!
//! - **Collector**: polls a Prometheus server on a fixed cadence and
//!   appends one observation per poll to the actuals store.
//! - **Forecaster**: builds a fixed-length scaled window from the actuals,
//!   calls an external prediction endpoint, and merges the returned horizon
//!   into the forecast store, resolving overlap with earlier forecasts.
//! - **Evaluator**: aligns both stores over a trailing window, computes
//!   R²/RMSE/MSE, and exposes them as Prometheus gauges.
//!
//! Data flows one way: the collector feeds the actuals store, the
//! forecaster reads actuals and writes forecasts, and the evaluator reads
//! both. Components communicate only through the stores, so each is
//! independently restartable and testable.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cpu_forecast::{Forecaster, HttpForecastClient, TimeSeriesStore};
//! use cpu_forecast::forecaster::ForecasterSettings;
//! use cpu_forecast::store::FORECAST_COLUMN;
//! use std::time::Duration;
//!
//! fn main() -> cpu_forecast::Result<()> {
//!     let store = TimeSeriesStore::open("/data/predictions.csv", FORECAST_COLUMN)?;
//!     let client = HttpForecastClient::new(
//!         "http://localhost:8080/v1/models/cpu-usage-forecaster:predict",
//!         60,
//!         Duration::from_secs(10),
//!     )?;
//!     let forecaster = Forecaster::new(
//!         "/data/metrics.csv",
//!         store,
//!         client,
//!         ForecasterSettings::default(),
//!     );
//!     forecaster.run(Duration::from_secs(60));
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod exporter;
pub mod forecaster;
pub mod metrics;
pub mod scaler;
pub mod series;
pub mod store;

// Re-export commonly used types
pub use crate::collector::{Collector, MetricsSource, PrometheusSource};
pub use crate::error::{PipelineError, Result};
pub use crate::evaluator::{EvaluationReport, Evaluator};
pub use crate::exporter::ModelMetrics;
pub use crate::forecaster::{ForecastClient, Forecaster, HttpForecastClient, SaveMode, Window};
pub use crate::scaler::{MinMaxScaler, ScalerFit};
pub use crate::series::{Sample, TimeSeries};
pub use crate::store::TimeSeriesStore;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
