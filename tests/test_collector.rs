use chrono::{Timelike, Utc};
use cpu_forecast::store::{TimeSeriesStore, ACTUALS_COLUMN};
use cpu_forecast::{Collector, MetricsSource, PipelineError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use tempfile::tempdir;

/// Source that replays a scripted sequence of query outcomes.
struct ScriptedSource {
    responses: RefCell<VecDeque<Result<Option<f64>>>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Option<f64>>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
        }
    }
}

impl MetricsSource for ScriptedSource {
    fn query(&self) -> Result<Option<f64>> {
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

#[test]
fn test_successful_tick_appends_one_sample() {
    let dir = tempdir().unwrap();
    let store = TimeSeriesStore::open(dir.path().join("metrics.csv"), ACTUALS_COLUMN).unwrap();
    let mut collector = Collector::new(ScriptedSource::new(vec![Ok(Some(0.42))]), store);

    let sample = collector.tick().unwrap().unwrap();
    assert_eq!(sample.value, 0.42);
    assert_eq!(collector.store().len(), 1);
}

#[test]
fn test_timestamp_is_stamped_locally_at_collection_time() {
    let dir = tempdir().unwrap();
    let store = TimeSeriesStore::open(dir.path().join("metrics.csv"), ACTUALS_COLUMN).unwrap();
    let mut collector = Collector::new(ScriptedSource::new(vec![Ok(Some(1.0))]), store);

    let before = Utc::now();
    let sample = collector.tick().unwrap().unwrap();
    let after = Utc::now();

    assert!(sample.timestamp >= before - chrono::Duration::seconds(1));
    assert!(sample.timestamp <= after);
    assert_eq!(sample.timestamp.nanosecond(), 0);
}

#[test]
fn test_no_data_tick_appends_nothing() {
    let dir = tempdir().unwrap();
    let store = TimeSeriesStore::open(dir.path().join("metrics.csv"), ACTUALS_COLUMN).unwrap();
    let mut collector = Collector::new(ScriptedSource::new(vec![Ok(None)]), store);

    assert!(collector.tick().unwrap().is_none());
    assert!(collector.store().is_empty());
}

#[test]
fn test_source_failure_propagates_and_appends_nothing() {
    let dir = tempdir().unwrap();
    let store = TimeSeriesStore::open(dir.path().join("metrics.csv"), ACTUALS_COLUMN).unwrap();
    let mut collector = Collector::new(
        ScriptedSource::new(vec![
            Err(PipelineError::SourceUnavailable("timeout".to_string())),
            Ok(Some(0.5)),
        ]),
        store,
    );

    let err = collector.tick().unwrap_err();
    assert!(matches!(err, PipelineError::SourceUnavailable(_)));
    assert!(collector.store().is_empty());

    // The next tick recovers
    assert!(collector.tick().unwrap().is_some());
    assert_eq!(collector.store().len(), 1);
}
