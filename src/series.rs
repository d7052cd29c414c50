//! In-memory time series with minute resampling and forward-fill

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;

/// A single observation: a UTC timestamp and a finite value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// An ordered sequence of samples with unique timestamps.
///
/// Construction sorts by timestamp and keeps the latest value for any
/// duplicated timestamp, so a series built from raw appends always satisfies
/// the store ordering invariant.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        let mut map = BTreeMap::new();
        for sample in samples {
            map.insert(sample.timestamp, sample.value);
        }
        Self {
            samples: map
                .into_iter()
                .map(|(timestamp, value)| Sample { timestamp, value })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// Re-grid onto fixed-width buckets of `interval`.
    ///
    /// Each bucket carries the mean of its contained samples; interior gaps
    /// are filled by carrying the last known value forward. Nothing is ever
    /// produced before the first observed bucket and nothing is extrapolated
    /// past the last one.
    pub fn resample(&self, interval: Duration) -> TimeSeries {
        if self.samples.is_empty() {
            return TimeSeries::default();
        }
        let bucket_secs = interval.num_seconds().max(1);

        let mut buckets: BTreeMap<i64, (f64, u32)> = BTreeMap::new();
        for sample in &self.samples {
            let bucket = sample.timestamp.timestamp().div_euclid(bucket_secs) * bucket_secs;
            let entry = buckets.entry(bucket).or_insert((0.0, 0));
            entry.0 += sample.value;
            entry.1 += 1;
        }

        let first = match buckets.keys().next() {
            Some(&t) => t,
            None => return TimeSeries::default(),
        };
        let last = match buckets.keys().next_back() {
            Some(&t) => t,
            None => return TimeSeries::default(),
        };

        let mut resampled = Vec::with_capacity(((last - first) / bucket_secs + 1) as usize);
        let mut carried: Option<f64> = None;
        let mut t = first;
        while t <= last {
            let value = match buckets.get(&t) {
                Some(&(sum, count)) => {
                    let mean = sum / f64::from(count);
                    carried = Some(mean);
                    mean
                }
                None => match carried {
                    Some(previous) => previous,
                    None => {
                        t += bucket_secs;
                        continue;
                    }
                },
            };
            if let Some(timestamp) = Utc.timestamp_opt(t, 0).single() {
                resampled.push(Sample { timestamp, value });
            }
            t += bucket_secs;
        }

        TimeSeries { samples: resampled }
    }

    /// Samples with `after < timestamp <= upto`, the evaluator's trailing
    /// window bound.
    pub fn window_between(&self, after: DateTime<Utc>, upto: DateTime<Utc>) -> TimeSeries {
        TimeSeries {
            samples: self
                .samples
                .iter()
                .filter(|s| s.timestamp > after && s.timestamp <= upto)
                .copied()
                .collect(),
        }
    }
}
