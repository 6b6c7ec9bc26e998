// projeto: cpuforecast
// file: src/neural/plots.rs
// Loss curve and prediction-vs-real charts as standalone plotly HTML

use std::fs;
use std::path::Path;

use plotly::{
    common::{Mode, Title},
    layout::Axis,
    Layout, Plot, Scatter,
};

use crate::neural::metrics::MetricsTracker;
use crate::neural::utils::ForecastError;

fn write_plot(plot: &Plot, path: &Path) -> Result<(), ForecastError> {
    fs::write(path, plot.to_html())?;
    log::info!("🖼️ [Plots] Saved {}", path.display());
    Ok(())
}

/// Train and validation loss per epoch.
pub fn loss_plot(tracker: &MetricsTracker) -> Plot {
    let epochs: Vec<usize> = tracker.history.iter().map(|m| m.epoch).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(epochs.clone(), tracker.train_losses())
            .name("train")
            .mode(Mode::Lines),
    );
    plot.add_trace(
        Scatter::new(epochs, tracker.val_losses())
            .name("validation")
            .mode(Mode::Lines),
    );
    plot.set_layout(
        Layout::new()
            .title(Title::with_text("Training and Validation Loss"))
            .x_axis(Axis::new().title(Title::with_text("epoch")))
            .y_axis(Axis::new().title(Title::with_text("loss"))),
    );
    plot
}

/// Prediction against real values over the first `limit` points (all when `None`).
pub fn prediction_plot(predictions: &[f64], actual: &[f64], signal: &str, limit: Option<usize>) -> Plot {
    let n = predictions.len().min(actual.len());
    let n = limit.map_or(n, |l| l.min(n));
    let steps: Vec<usize> = (0..n).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(steps.clone(), predictions[..n].to_vec())
            .name("prediction")
            .mode(Mode::Lines),
    );
    plot.add_trace(
        Scatter::new(steps, actual[..n].to_vec())
            .name("real")
            .mode(Mode::Lines),
    );
    plot.set_layout(
        Layout::new()
            .x_axis(Axis::new().title(Title::with_text("time")))
            .y_axis(Axis::new().title(Title::with_text(signal))),
    );
    plot
}

pub fn save_loss_plot(tracker: &MetricsTracker, path: &Path) -> Result<(), ForecastError> {
    write_plot(&loss_plot(tracker), path)
}

pub fn save_prediction_plot(
    predictions: &[f64],
    actual: &[f64],
    signal: &str,
    limit: Option<usize>,
    path: &Path,
) -> Result<(), ForecastError> {
    if predictions.len() != actual.len() {
        return Err(ForecastError::Shape(format!(
            "{} predictions for {} real values", predictions.len(), actual.len()
        )));
    }
    write_plot(&prediction_plot(predictions, actual, signal, limit), path)
}
