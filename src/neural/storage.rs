// projeto: cpuforecast
// file: src/neural/storage.rs
// Run artifacts: per-epoch history (CSV) and the final run report (JSON)

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::neural::data::MetricsSpace;
use crate::neural::metrics::{MetricsTracker, RegressionMetrics};
use crate::neural::utils::ForecastError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataShapes {
    pub raw_rows: usize,
    pub raw_columns: usize,
    pub supervised_rows: usize,
    pub supervised_columns: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub config: Config,
    pub signals: Vec<String>,
    pub supervised_columns: Vec<String>,
    pub shapes: DataShapes,
    pub epochs_run: usize,
    pub best_epoch: usize,
    pub final_train_loss: Option<f64>,
    pub final_val_loss: Option<f64>,
    pub test_metrics: RegressionMetrics,
    pub metrics_space: MetricsSpace,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub fn save_history_csv(tracker: &MetricsTracker, path: &Path) -> Result<(), ForecastError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in &tracker.history {
        writer.serialize(record)?;
    }
    writer.flush()?;

    log::info!("💾 [Storage] Training history ({} epochs) saved to {}", tracker.history.len(), path.display());
    Ok(())
}

pub fn save_run_report(report: &RunReport, path: &Path) -> Result<(), ForecastError> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;

    log::info!("💾 [Storage] Run report saved to {}", path.display());
    log::debug!("   ├── Test RMSE: {:.8}", report.test_metrics.rmse);
    log::debug!("   └── Metrics space: {:?}", report.metrics_space);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::metrics::{calculate_regression_metrics, TrainingMetrics};

    fn tracker() -> MetricsTracker {
        let mut tracker = MetricsTracker::new();
        for epoch in 1..=2 {
            tracker.add_metrics(TrainingMetrics {
                epoch,
                train_loss: 0.2,
                val_loss: 0.3 / epoch as f64,
                val_mse: 0.1,
                epoch_seconds: 0.5,
                timestamp: Utc::now().to_rfc3339(),
            }, None);
        }
        tracker
    }

    #[test]
    fn test_history_csv() {
        let path = std::env::temp_dir().join(format!("cpuforecast_history_{}.csv", std::process::id()));
        save_history_csv(&tracker(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("epoch,train_loss,val_loss,val_mse"));
        assert!(lines[2].starts_with("2,0.2,0.15,"));
    }

    #[test]
    fn test_run_report_json() {
        let tracker = tracker();
        let started_at = Utc::now();
        let report = RunReport {
            config: Config::default(),
            signals: vec!["cpu".to_string(), "mem".to_string()],
            supervised_columns: vec!["cpu1(t-1)".to_string(), "mem2(t-1)".to_string(),
                                     "cpu1(t)".to_string(), "mem2(t)".to_string()],
            shapes: DataShapes {
                raw_rows: 10,
                raw_columns: 2,
                supervised_rows: 9,
                supervised_columns: 4,
                train_rows: 6,
                test_rows: 3,
            },
            epochs_run: tracker.history.len(),
            best_epoch: tracker.best_epoch,
            final_train_loss: tracker.get_latest_metrics().map(|m| m.train_loss),
            final_val_loss: tracker.get_latest_metrics().map(|m| m.val_loss),
            test_metrics: calculate_regression_metrics(&[1.0, 2.0], &[1.0, 3.0]).unwrap(),
            metrics_space: MetricsSpace::Unscaled,
            started_at,
            finished_at: Utc::now(),
        };

        let path = std::env::temp_dir().join(format!("cpuforecast_report_{}.json", std::process::id()));
        save_run_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(content.contains("\"metrics_space\": \"unscaled\""));

        let loaded: RunReport = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.shapes, report.shapes);
        assert_eq!(loaded.best_epoch, 2);
        assert_eq!(loaded.test_metrics, report.test_metrics);
        assert_eq!(loaded.started_at, started_at);
    }
}
