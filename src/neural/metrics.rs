// projeto: cpuforecast
// file: src/neural/metrics.rs
// Training history, early stopping bookkeeping and regression metrics

use serde::{Deserialize, Serialize};

use crate::neural::utils::ForecastError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub val_loss: f64,
    pub val_mse: f64,
    pub epoch_seconds: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct MetricsTracker {
    pub history: Vec<TrainingMetrics>,
    pub best_val_loss: f64,
    pub best_epoch: usize,
    pub patience_counter: usize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        MetricsTracker {
            history: Vec::new(),
            best_val_loss: f64::INFINITY,
            best_epoch: 0,
            patience_counter: 0,
        }
    }

    /// Records one epoch. Returns true once `patience` epochs passed without a
    /// better validation loss; `None` never stops.
    pub fn add_metrics(&mut self, metrics: TrainingMetrics, patience: Option<usize>) -> bool {
        if metrics.val_loss < self.best_val_loss {
            self.best_val_loss = metrics.val_loss;
            self.best_epoch = metrics.epoch;
            self.patience_counter = 0;
            log::debug!("🎯 [Metrics] New best validation loss: {:.6} at epoch {}",
                        self.best_val_loss, self.best_epoch);
        } else {
            self.patience_counter += 1;
        }

        self.history.push(metrics);

        patience.is_some_and(|p| self.patience_counter >= p)
    }

    pub fn train_losses(&self) -> Vec<f64> {
        self.history.iter().map(|m| m.train_loss).collect()
    }

    pub fn val_losses(&self) -> Vec<f64> {
        self.history.iter().map(|m| m.val_loss).collect()
    }

    pub fn get_best_metrics(&self) -> Option<&TrainingMetrics> {
        self.history.iter().find(|m| m.epoch == self.best_epoch)
    }

    pub fn get_latest_metrics(&self) -> Option<&TrainingMetrics> {
        self.history.last()
    }

    pub fn log_summary(&self) {
        if let (Some(best), Some(last)) = (self.get_best_metrics(), self.get_latest_metrics()) {
            log::info!("📈 [Metrics] Training Summary:");
            log::info!("   ├── Epochs run: {}", self.history.len());
            log::info!("   ├── Best Epoch: {}", best.epoch);
            log::info!("   ├── Best Val Loss: {:.6}", best.val_loss);
            log::info!("   ├── Final Train Loss: {:.6}", last.train_loss);
            log::info!("   └── Final Val MSE: {:.6}", last.val_mse);
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r_squared: f64,
    pub max_error: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    pub fn log(&self, prefix: &str) {
        log::info!("📊 [{}] Regression Metrics:", prefix);
        log::info!("   ├── Samples: {}", self.n_samples);
        log::info!("   ├── MSE: {:.8}", self.mse);
        log::info!("   ├── RMSE: {:.8}", self.rmse);
        log::info!("   ├── MAE: {:.8}", self.mae);
        log::info!("   ├── Max Error: {:.8}", self.max_error);
        log::info!("   └── R²: {:.6}", self.r_squared);
    }
}

pub fn calculate_regression_metrics(predictions: &[f64], targets: &[f64]) -> Result<RegressionMetrics, ForecastError> {
    if predictions.len() != targets.len() {
        return Err(ForecastError::Shape(format!(
            "{} predictions for {} targets", predictions.len(), targets.len()
        )));
    }
    if predictions.is_empty() {
        return Err(ForecastError::Shape("no samples to evaluate".to_string()));
    }

    let n = predictions.len() as f64;
    let errors: Vec<f64> = predictions.iter().zip(targets).map(|(p, t)| p - t).collect();

    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let max_error = errors.iter().fold(0.0f64, |acc, e| acc.max(e.abs()));

    let target_mean = targets.iter().sum::<f64>() / n;
    let ss_res = errors.iter().map(|e| e.powi(2)).sum::<f64>();
    let ss_tot = targets.iter().map(|t| (t - target_mean).powi(2)).sum::<f64>();
    let r_squared = if ss_tot != 0.0 { 1.0 - (ss_res / ss_tot) } else { 0.0 };

    Ok(RegressionMetrics {
        mse,
        rmse: mse.sqrt(),
        mae,
        r_squared,
        max_error,
        n_samples: predictions.len(),
    })
}
