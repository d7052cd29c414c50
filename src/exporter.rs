//! Prometheus gauge registry and scrape endpoint

use prometheus::{Encoder, Gauge, Registry, TextEncoder};
use tracing::{error, info};
use warp::Filter;

use crate::evaluator::EvaluationReport;

/// The five model accuracy gauges behind `GET /metrics`.
#[derive(Clone)]
pub struct ModelMetrics {
    registry: Registry,
    r2: Gauge,
    rmse: Gauge,
    mse: Gauge,
    predicted: Gauge,
    actual: Gauge,
}

impl ModelMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let r2 = Gauge::new("model_r2_score", "R-squared score of the model")?;
        let rmse = Gauge::new("model_rmse", "Root mean squared error of the model")?;
        let mse = Gauge::new("model_mse", "Mean squared error of the model")?;
        let predicted = Gauge::new("predicted_value", "Predicted value of the CPU usage")?;
        let actual = Gauge::new("actual_value", "Actual value of the CPU usage")?;

        registry.register(Box::new(r2.clone()))?;
        registry.register(Box::new(rmse.clone()))?;
        registry.register(Box::new(mse.clone()))?;
        registry.register(Box::new(predicted.clone()))?;
        registry.register(Box::new(actual.clone()))?;

        Ok(Self {
            registry,
            r2,
            rmse,
            mse,
            predicted,
            actual,
        })
    }

    pub fn publish(&self, report: &EvaluationReport) {
        self.r2.set(report.r2);
        self.rmse.set(report.rmse);
        self.mse.set(report.mse);
        self.predicted.set(report.predicted);
        self.actual.set(report.actual);
    }

    /// Current registry content in the Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            error!(error = %err, "failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Serve the scrape endpoint until the process stops.
pub async fn serve(metrics: ModelMetrics, port: u16) {
    let route = warp::get()
        .and(warp::path("metrics"))
        .map(move || {
            warp::reply::with_header(
                metrics.encode(),
                "content-type",
                "text/plain; version=0.0.4",
            )
        });

    info!(port, "metrics exposition listening");
    warp::serve(route).run(([0, 0, 0, 0], port)).await;
}
