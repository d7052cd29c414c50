//! Min/max normalization for model input and output

use clap::ValueEnum;

use crate::error::{PipelineError, Result};

/// Min/max normalization fitted from data and passed by value into each
/// prediction call. Never process-wide state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler over `values`.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(PipelineError::InvalidValue(
                "cannot fit scaler on empty data".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidValue(
                "cannot fit scaler on non-finite data".to_string(),
            ));
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in values {
            min = min.min(value);
            max = max.max(value);
        }

        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Map values into `[0, 1]` relative to the fitted range. A constant
    /// series (zero range) maps to 0 so that `inverse_transform` still
    /// round-trips it.
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        let range = self.max - self.min;
        values
            .iter()
            .map(|&value| {
                if range == 0.0 {
                    0.0
                } else {
                    (value - self.min) / range
                }
            })
            .collect()
    }

    /// Invert `transform` back to the original units.
    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        let range = self.max - self.min;
        values
            .iter()
            .map(|&value| value * range + self.min)
            .collect()
    }
}

/// When the forecaster's scaler is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScalerFit {
    /// Fit once over the full actuals history at the first tick where data
    /// exists, then reuse for every prediction.
    History,
    /// Refit on each tick's input window.
    Window,
}
