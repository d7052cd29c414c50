//! Accuracy metrics for evaluating forecasts against ground truth

use statrs::statistics::Statistics;

use crate::error::{PipelineError, Result};

/// Mean squared error. Returns NaN for empty or mismatched inputs.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Root mean squared error. Returns NaN for empty or mismatched inputs.
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean_squared_error(actual, predicted).sqrt()
}

/// Coefficient of determination. Returns NaN when undefined (empty or
/// mismatched inputs, or zero variance in the actual values).
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let mean = actual.iter().mean();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return f64::NAN;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Aggregate accuracy over one set of aligned pairs
#[derive(Debug, Clone, Copy)]
pub struct AccuracyReport {
    /// Coefficient of determination
    pub r2: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl std::fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  R2:   {:.4}", self.r2)?;
        writeln!(f, "  MSE:  {:.4}", self.mse)?;
        writeln!(f, "  RMSE: {:.4}", self.rmse)?;
        Ok(())
    }
}

/// Evaluate forecast accuracy against actual values.
///
/// Fails with `InsufficientOverlap` when the pair set is empty, mismatched,
/// or the actual values carry zero variance (R² undefined). Callers leave
/// metrics unpublished in that case rather than publishing NaN.
pub fn evaluate_forecast(actual: &[f64], predicted: &[f64]) -> Result<AccuracyReport> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(PipelineError::InsufficientOverlap(
            "actual and predicted values must have the same non-zero length".to_string(),
        ));
    }

    let mean = actual.iter().mean();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Err(PipelineError::InsufficientOverlap(
            "zero variance in actual values".to_string(),
        ));
    }

    let mse = mean_squared_error(actual, predicted);
    let ss_res = mse * actual.len() as f64;

    Ok(AccuracyReport {
        r2: 1.0 - ss_res / ss_tot,
        mse,
        rmse: mse.sqrt(),
    })
}
