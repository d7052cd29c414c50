//! Metrics collection: poll an external source, append to the actuals store

use chrono::{Timelike, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::{PipelineError, Result};
use crate::series::Sample;
use crate::store::TimeSeriesStore;

/// Abstract interface for querying the monitored scalar.
pub trait MetricsSource {
    /// Query the current instantaneous value. `Ok(None)` means the source
    /// answered but had no data for the series.
    fn query(&self) -> Result<Option<f64>>;
}

/// Prometheus HTTP API instant-query source.
pub struct PrometheusSource {
    client: reqwest::blocking::Client,
    endpoint: String,
    query: String,
}

impl PrometheusSource {
    pub fn new(base_url: &str, query: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/v1/query", base_url.trim_end_matches('/')),
            query: query.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    status: String,
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    // [unix_time, "value"] pair as returned by the query API
    value: (f64, String),
}

impl MetricsSource for PrometheusSource {
    fn query(&self) -> Result<Option<f64>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", self.query.as_str())])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))?;

        let body: QueryResponse = response
            .json()
            .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))?;
        if body.status != "success" {
            return Err(PipelineError::SourceUnavailable(format!(
                "query returned status {}",
                body.status
            )));
        }

        match body.data.and_then(|d| d.result.into_iter().next()) {
            Some(first) => first
                .value
                .1
                .parse::<f64>()
                .map(Some)
                .map_err(|e| PipelineError::SourceUnavailable(e.to_string())),
            None => Ok(None),
        }
    }
}

/// Polls a [`MetricsSource`] on a fixed cadence and appends one sample per
/// successful poll to the actuals store. Timestamps are stamped locally at
/// collection time, not taken from the source.
pub struct Collector<S: MetricsSource> {
    source: S,
    store: TimeSeriesStore,
}

impl<S: MetricsSource> Collector<S> {
    pub fn new(source: S, store: TimeSeriesStore) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    /// One poll-and-append cycle. `Ok(None)` means the source had no data.
    pub fn tick(&mut self) -> Result<Option<Sample>> {
        let value = match self.source.query()? {
            Some(value) => value,
            None => return Ok(None),
        };

        let now = Utc::now();
        let sample = Sample::new(now.with_nanosecond(0).unwrap_or(now), value);
        self.store.append(sample)?;
        Ok(Some(sample))
    }

    /// Loop forever with a fixed sleep after each tick. Failures are logged
    /// and the loop waits out the normal interval; there is no backoff and
    /// no retry within a tick. The effective cadence therefore drifts by the
    /// query latency.
    pub fn run(mut self, interval: Duration) {
        info!("starting metrics collection");
        loop {
            match self.tick() {
                Ok(Some(sample)) => {
                    info!(timestamp = %sample.timestamp, value = sample.value, "appended sample");
                }
                Ok(None) => warn!("metrics source returned no data"),
                Err(err) => error!(error = %err, "collection tick failed"),
            }
            std::thread::sleep(interval);
        }
    }
}
