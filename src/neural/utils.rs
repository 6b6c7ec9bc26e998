// projeto: cpuforecast
// file: src/neural/utils.rs
// Error handling, input validation and timing helpers

use ndarray::{Array2, ShapeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("Data processing error: {0}")]
    DataProcessing(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<ShapeError> for ForecastError {
    fn from(err: ShapeError) -> Self {
        ForecastError::Shape(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ForecastError {
    fn from(err: toml::ser::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Serialization(err.to_string())
    }
}

/// Rejects empty matrices and any NaN / infinite cell, reporting the first offending position.
pub fn validate_input_data(data: &Array2<f64>, name: &str) -> Result<(), ForecastError> {
    if data.is_empty() {
        return Err(ForecastError::DataProcessing(format!("{} is empty", name)));
    }

    for ((i, j), &value) in data.indexed_iter() {
        if value.is_nan() {
            return Err(ForecastError::DataProcessing(
                format!("{} contains NaN at position ({}, {})", name, i, j)
            ));
        }
        if value.is_infinite() {
            return Err(ForecastError::DataProcessing(
                format!("{} contains infinite value at position ({}, {})", name, i, j)
            ));
        }
    }

    Ok(())
}

pub fn validate_targets(targets: &[f32], name: &str) -> Result<(), ForecastError> {
    if targets.is_empty() {
        return Err(ForecastError::DataProcessing(format!("{} is empty", name)));
    }

    if let Some(i) = targets.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::DataProcessing(
            format!("{} contains non-finite value at position {}", name, i)
        ));
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    pub start_time: std::time::Instant,
    pub epoch_times: Vec<f64>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        PerformanceMonitor {
            start_time: std::time::Instant::now(),
            epoch_times: Vec::new(),
        }
    }

    pub fn record_epoch(&mut self, duration: f64) {
        self.epoch_times.push(duration);
    }

    pub fn get_average_epoch_time(&self) -> f64 {
        if self.epoch_times.is_empty() {
            0.0
        } else {
            self.epoch_times.iter().sum::<f64>() / self.epoch_times.len() as f64
        }
    }

    pub fn get_total_time(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn log_summary(&self) {
        log::info!("⏱️ [Performance] Training Summary:");
        log::info!("   ├── Total Time: {:.2}s", self.get_total_time());
        log::info!("   ├── Total Epochs: {}", self.epoch_times.len());
        log::info!("   ├── Avg Epoch Time: {:.2}s", self.get_average_epoch_time());
        if !self.epoch_times.is_empty() {
            let min_time = self.epoch_times.iter().fold(f64::INFINITY, |a, &b| a.min(b));
            let max_time = self.epoch_times.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            log::info!("   ├── Min Epoch Time: {:.2}s", min_time);
            log::info!("   └── Max Epoch Time: {:.2}s", max_time);
        }
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}
