//! CSV-file-backed time series store
//!
//! Two instances back the pipeline: the actuals store (`cpu_usage` column)
//! written by the collector, and the forecast store (`predicted_cpu_usage`
//! column) written by the forecaster. The file is the sole source of truth
//! across restarts: every successful append is flushed before the call
//! returns, and a store that does not yet exist is created empty with a
//! header row. Readers skip malformed or partially flushed records instead
//! of failing the whole load.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::series::{Sample, TimeSeries};

/// Value column of the actuals store.
pub const ACTUALS_COLUMN: &str = "cpu_usage";
/// Value column of the forecast store.
pub const FORECAST_COLUMN: &str = "predicted_cpu_usage";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-oriented store keyed by timestamp, persisted as delimited text.
#[derive(Debug)]
pub struct TimeSeriesStore {
    path: PathBuf,
    value_column: String,
    samples: BTreeMap<DateTime<Utc>, f64>,
}

impl TimeSeriesStore {
    /// Open a store file, creating it (header included) when missing.
    pub fn open<P: AsRef<Path>>(path: P, value_column: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut samples = BTreeMap::new();

        if path.exists() {
            let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&path)?;
            for record in reader.records() {
                let record = match record {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "skipping unreadable record");
                        continue;
                    }
                };
                match parse_record(&record) {
                    Some((timestamp, value)) => {
                        samples.insert(timestamp, value);
                    }
                    None => {
                        warn!(path = %path.display(), row = ?record, "skipping malformed record");
                    }
                }
            }
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(["timestamp", value_column])?;
            writer.flush()?;
        }

        Ok(Self {
            path,
            value_column: value_column.to_string(),
            samples,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.keys().next_back().copied()
    }

    /// Insert one sample. A sample already present at the exact same
    /// timestamp is replaced by the new value, which keeps re-polls
    /// idempotent. The write is flushed before returning.
    pub fn append(&mut self, sample: Sample) -> Result<()> {
        if !sample.value.is_finite() {
            return Err(PipelineError::InvalidValue(format!(
                "refusing to persist non-finite value at {}",
                sample.timestamp
            )));
        }

        let is_tail = self
            .samples
            .keys()
            .next_back()
            .map_or(true, |last| sample.timestamp > *last);
        let replaced = self
            .samples
            .insert(sample.timestamp, sample.value)
            .is_some();

        if replaced || !is_tail {
            // Replacement or out-of-order insert: the file is rewritten so it
            // stays ordered with one row per timestamp.
            self.rewrite()
        } else {
            let file = OpenOptions::new().append(true).open(&self.path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(&[
                format_timestamp(sample.timestamp),
                sample.value.to_string(),
            ])?;
            writer.flush()?;
            Ok(())
        }
    }

    /// All samples with `from <= timestamp <= to`, ascending.
    pub fn read_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Sample> {
        self.samples
            .range(from..=to)
            .map(|(&timestamp, &value)| Sample { timestamp, value })
            .collect()
    }

    /// The full store content as an ordered series.
    pub fn series(&self) -> TimeSeries {
        TimeSeries::new(
            self.samples
                .iter()
                .map(|(&timestamp, &value)| Sample { timestamp, value })
                .collect(),
        )
    }

    /// Bucket means over `interval` with forward-filled interior gaps.
    pub fn resample(&self, interval: Duration) -> TimeSeries {
        self.series().resample(interval)
    }

    /// Overlap resolution for a new forecast horizon: every stored sample at
    /// or after the horizon's first timestamp is discarded and replaced by
    /// the horizon, while samples strictly before it are kept. The result is
    /// rewritten durably.
    pub fn merge_horizon(&mut self, horizon: &[Sample]) -> Result<()> {
        let first = match horizon.first() {
            Some(sample) => sample.timestamp,
            None => return Ok(()),
        };
        validate_finite(horizon)?;

        self.samples.split_off(&first);
        for sample in horizon {
            self.samples.insert(sample.timestamp, sample.value);
        }
        self.rewrite()
    }

    /// Full-overwrite save: the store becomes exactly `samples`.
    pub fn replace_all(&mut self, samples: &[Sample]) -> Result<()> {
        validate_finite(samples)?;
        self.samples.clear();
        for sample in samples {
            self.samples.insert(sample.timestamp, sample.value);
        }
        self.rewrite()
    }

    fn rewrite(&self) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(["timestamp", self.value_column.as_str()])?;
        for (&timestamp, &value) in &self.samples {
            writer.write_record(&[format_timestamp(timestamp), value.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn validate_finite(samples: &[Sample]) -> Result<()> {
    for sample in samples {
        if !sample.value.is_finite() {
            return Err(PipelineError::InvalidValue(format!(
                "refusing to persist non-finite value at {}",
                sample.timestamp
            )));
        }
    }
    Ok(())
}

fn parse_record(record: &csv::StringRecord) -> Option<(DateTime<Utc>, f64)> {
    let timestamp = parse_timestamp(record.get(0)?)?;
    let value: f64 = record.get(1)?.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((timestamp, value))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Sub-second timestamps written by other tooling
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    None
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
