// projeto: cpuforecast
// file: src/neural/trainer.rs
// Fixed-epoch training loop with held-out validation and batched inference

use std::time::Instant;

use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::{AutodiffBackend, Backend}, ElementConversion, Tensor, TensorData},
};
use chrono::Utc;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::neural::metrics::{MetricsTracker, TrainingMetrics};
use crate::neural::model::{huber_loss, mse, ConvGruForecaster};
use crate::neural::utils::{validate_targets, ForecastError, PerformanceMonitor};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub huber_delta: f32,
    pub shuffle: bool,
    pub seed: u64,
    /// Epochs without validation improvement before stopping; unset trains every epoch.
    pub patience: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 50,
            batch_size: 72,
            learning_rate: 0.001,
            huber_delta: 1.0,
            shuffle: true,
            seed: 42,
            patience: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.epochs == 0 {
            return Err(ForecastError::Validation("training.epochs must be greater than zero".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::Validation("training.batch_size must be greater than zero".to_string()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ForecastError::Validation(
                format!("training.learning_rate must be positive, got {}", self.learning_rate)
            ));
        }
        if !(self.huber_delta > 0.0) {
            return Err(ForecastError::Validation(
                format!("training.huber_delta must be positive, got {}", self.huber_delta)
            ));
        }
        Ok(())
    }
}

/// Feature rows and their targets, kept on the host until batched.
#[derive(Debug, Clone)]
pub struct SupervisedSet {
    pub x: Array2<f32>,
    pub y: Array1<f32>,
}

impl SupervisedSet {
    pub fn new(x: Array2<f32>, y: Array1<f32>) -> Result<Self, ForecastError> {
        if x.nrows() != y.len() {
            return Err(ForecastError::Shape(format!(
                "{} feature rows for {} targets", x.nrows(), y.len()
            )));
        }
        Ok(SupervisedSet { x, y })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }
}

/// Selected rows as a `[rows, 1, features]` tensor (one timestep per sample).
fn features_tensor<B: Backend>(x: ArrayView2<f32>, rows: &[usize], device: &B::Device) -> Tensor<B, 3> {
    let batch = x.select(Axis(0), rows);
    let data: Vec<f32> = batch.iter().copied().collect();
    Tensor::from_data(TensorData::new(data, [rows.len(), 1, x.ncols()]), device)
}

fn targets_tensor<B: Backend>(y: ArrayView1<f32>, rows: &[usize], device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = rows.iter().map(|&i| y[i]).collect();
    Tensor::from_data(TensorData::new(data, [rows.len(), 1]), device)
}

/// Mean Huber loss and MSE over `set`, batch by batch.
fn evaluate<B: Backend>(
    model: &ConvGruForecaster<B>,
    set: &SupervisedSet,
    batch_size: usize,
    huber_delta: f32,
    device: &B::Device,
) -> (f64, f64) {
    let rows: Vec<usize> = (0..set.len()).collect();
    let mut loss_sum = 0.0;
    let mut mse_sum = 0.0;

    for chunk in rows.chunks(batch_size) {
        let x = features_tensor::<B>(set.x.view(), chunk, device);
        let y = targets_tensor::<B>(set.y.view(), chunk, device);
        let output = model.forward(x);

        let weight = chunk.len() as f64;
        loss_sum += huber_loss(output.clone(), y.clone(), huber_delta).into_scalar().elem::<f64>() * weight;
        mse_sum += mse(output, y).into_scalar().elem::<f64>() * weight;
    }

    let n = set.len() as f64;
    (loss_sum / n, mse_sum / n)
}

pub fn train<B: AutodiffBackend>(
    model: ConvGruForecaster<B>,
    train_set: &SupervisedSet,
    valid_set: &SupervisedSet,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(ConvGruForecaster<B>, MetricsTracker), ForecastError> {
    config.validate()?;
    if train_set.is_empty() {
        return Err(ForecastError::Training("training split is empty".to_string()));
    }
    if valid_set.is_empty() {
        return Err(ForecastError::Training("validation split is empty".to_string()));
    }
    validate_targets(&train_set.y.to_vec(), "training targets")?;

    log::info!("🎓 [Trainer] {} epochs, batch {} | Train samples: {} | Val samples: {}",
               config.epochs, config.batch_size, train_set.len(), valid_set.len());

    let mut model = model;
    let mut optimizer = AdamConfig::new().init::<B, ConvGruForecaster<B>>();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..train_set.len()).collect();

    let mut tracker = MetricsTracker::new();
    let mut monitor = PerformanceMonitor::new();

    for epoch in 1..=config.epochs {
        let epoch_start = Instant::now();
        if config.shuffle {
            order.shuffle(&mut rng);
        }

        let mut loss_sum = 0.0;
        for chunk in order.chunks(config.batch_size) {
            let x = features_tensor::<B>(train_set.x.view(), chunk, device);
            let y = targets_tensor::<B>(train_set.y.view(), chunk, device);

            let output = model.forward(x);
            let loss = huber_loss(output, y, config.huber_delta);
            loss_sum += loss.clone().into_scalar().elem::<f64>() * chunk.len() as f64;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }
        let train_loss = loss_sum / train_set.len() as f64;

        let (val_loss, val_mse) = evaluate(&model.valid(), valid_set, config.batch_size, config.huber_delta, device);
        if !train_loss.is_finite() {
            return Err(ForecastError::Training(format!("training loss diverged at epoch {}", epoch)));
        }

        let epoch_seconds = epoch_start.elapsed().as_secs_f64();
        monitor.record_epoch(epoch_seconds);
        log::info!("📈 Epoch {}/{}: loss={:.6} | val_loss={:.6} | val_mse={:.6} | {:.1}s",
                   epoch, config.epochs, train_loss, val_loss, val_mse, epoch_seconds);

        let metrics = TrainingMetrics {
            epoch,
            train_loss,
            val_loss,
            val_mse,
            epoch_seconds,
            timestamp: Utc::now().to_rfc3339(),
        };

        if tracker.add_metrics(metrics, config.patience) {
            log::info!("⏹️ [Trainer] Early stopping at epoch {}", epoch);
            break;
        }
    }

    monitor.log_summary();
    tracker.log_summary();
    Ok((model, tracker))
}

/// Runs the model over every row of `x`, in order.
pub fn predict<B: Backend>(
    model: &ConvGruForecaster<B>,
    x: ArrayView2<f32>,
    batch_size: usize,
    device: &B::Device,
) -> Result<Vec<f32>, ForecastError> {
    if batch_size == 0 {
        return Err(ForecastError::Validation("batch_size must be greater than zero".to_string()));
    }

    let rows: Vec<usize> = (0..x.nrows()).collect();
    let mut predictions = Vec::with_capacity(rows.len());

    for chunk in rows.chunks(batch_size) {
        let output = model.forward(features_tensor::<B>(x, chunk, device));
        let values = output.into_data().convert::<f32>().to_vec::<f32>()
            .map_err(|e| ForecastError::Training(format!("cannot read predictions: {:?}", e)))?;
        predictions.extend(values);
    }

    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::model::ModelConfig;
    use burn::backend::{Autodiff, NdArray};

    type TrainBackend = Autodiff<NdArray<f32>>;

    fn toy_set(n: usize, offset: usize) -> SupervisedSet {
        let x = Array2::from_shape_fn((n, 3), |(i, j)| (((i + offset) * 3 + j) % 10) as f32 / 10.0);
        let y = Array1::from_shape_fn(n, |i| x[[i, 0]] * 0.5 + x[[i, 2]] * 0.25);
        SupervisedSet::new(x, y).unwrap()
    }

    fn small_model() -> ModelConfig {
        ModelConfig { conv_filters: 4, gru1_hidden: 4, gru2_hidden: 3, dense_hidden: 3, ..ModelConfig::default() }
    }

    #[test]
    fn test_training_records_every_epoch() {
        let device = Default::default();
        let model = ConvGruForecaster::<TrainBackend>::new(3, &small_model(), &device);
        let config = TrainingConfig { epochs: 3, batch_size: 8, ..TrainingConfig::default() };

        let (model, tracker) = train(model, &toy_set(20, 0), &toy_set(6, 20), &config, &device).unwrap();

        assert_eq!(tracker.history.len(), 3);
        assert_eq!(tracker.history.iter().map(|m| m.epoch).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(tracker.history.iter().all(|m| m.train_loss.is_finite() && m.val_loss.is_finite()));

        let valid_set = toy_set(6, 20);
        let predictions = predict(&model.valid(), valid_set.x.view(), 4, &device).unwrap();
        assert_eq!(predictions.len(), 6);
        assert!(predictions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_training_rejects_empty_splits() {
        let device = Default::default();
        let model = ConvGruForecaster::<TrainBackend>::new(3, &small_model(), &device);
        let empty = SupervisedSet::new(Array2::zeros((0, 3)), Array1::zeros(0)).unwrap();

        let result = train(model, &toy_set(10, 0), &empty, &TrainingConfig::default(), &device);
        assert!(matches!(result, Err(ForecastError::Training(_))));
    }

    #[test]
    fn test_supervised_set_shape_check() {
        assert!(SupervisedSet::new(Array2::zeros((3, 2)), Array1::zeros(2)).is_err());
    }

    #[test]
    fn test_training_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());
        assert!(TrainingConfig { batch_size: 0, ..TrainingConfig::default() }.validate().is_err());
        assert!(TrainingConfig { learning_rate: 0.0, ..TrainingConfig::default() }.validate().is_err());
    }
}
