// projeto: cpuforecast
// file: src/neural/model.rs
// Conv1D + stacked GRU regression network

use burn::{
    module::Module,
    nn::{
        conv::{Conv1d, Conv1dConfig},
        gru::{Gru, GruConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig1d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};
use serde::{Deserialize, Serialize};

use crate::neural::utils::ForecastError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub conv_filters: usize,
    pub kernel_size: usize,
    pub gru1_hidden: usize,
    pub gru2_hidden: usize,
    pub dense_hidden: usize,
    pub dropout: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            conv_filters: 32,
            kernel_size: 3,
            gru1_hidden: 32,
            gru2_hidden: 16,
            dense_hidden: 16,
            dropout: 0.2,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ForecastError> {
        let sizes = [
            ("conv_filters", self.conv_filters),
            ("kernel_size", self.kernel_size),
            ("gru1_hidden", self.gru1_hidden),
            ("gru2_hidden", self.gru2_hidden),
            ("dense_hidden", self.dense_hidden),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(ForecastError::Validation(format!("model.{} must be greater than zero", name)));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::Validation(
                format!("model.dropout must be in [0, 1), got {}", self.dropout)
            ));
        }
        Ok(())
    }
}

/// Causal Conv1D → GRU (sequences) → GRU (last step) → Dense/ReLU → Dropout → Dense(1).
#[derive(Module, Debug)]
pub struct ConvGruForecaster<B: Backend> {
    conv: Conv1d<B>,
    gru1: Gru<B>,
    gru2: Gru<B>,
    dense: Linear<B>,
    dropout: Dropout,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> ConvGruForecaster<B> {
    pub fn new(n_features: usize, config: &ModelConfig, device: &B::Device) -> Self {
        // left padding of kernel-1; the trailing outputs are cut in forward()
        let conv = Conv1dConfig::new(n_features, config.conv_filters, config.kernel_size)
            .with_padding(PaddingConfig1d::Explicit(config.kernel_size - 1))
            .init(device);

        let gru1 = GruConfig::new(config.conv_filters, config.gru1_hidden, true).init(device);
        let gru2 = GruConfig::new(config.gru1_hidden, config.gru2_hidden, true).init(device);
        let dense = LinearConfig::new(config.gru2_hidden, config.dense_hidden).init(device);
        let dropout = DropoutConfig::new(config.dropout).init();
        let output = LinearConfig::new(config.dense_hidden, 1).init(device);

        log::info!("🛠️ [Model] Conv1D({}, k={}) → GRU({}) → GRU({}) → Dense({}) → Dropout({}) → Dense(1) on {} features",
                   config.conv_filters, config.kernel_size, config.gru1_hidden, config.gru2_hidden,
                   config.dense_hidden, config.dropout, n_features);

        Self {
            conv,
            gru1,
            gru2,
            dense,
            dropout,
            output,
            activation: Relu::new(),
        }
    }

    /// x: [batch, timesteps, features] → [batch, 1]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, timesteps, _] = x.dims();

        // Conv1d works on [batch, channels, length]
        let x = self.conv.forward(x.swap_dims(1, 2));
        let x = x.narrow(2, 0, timesteps);
        let x = self.activation.forward(x).swap_dims(1, 2);

        let x = self.gru1.forward(x, None);
        let x = self.gru2.forward(x, None);
        let [_, _, hidden] = x.dims();
        let last = x.narrow(1, timesteps - 1, 1).reshape([batch, hidden]);

        let x = self.activation.forward(self.dense.forward(last));
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }
}

/// Mean Huber loss: quadratic below `delta`, linear above.
pub fn huber_loss<B: Backend>(predictions: Tensor<B, 2>, targets: Tensor<B, 2>, delta: f32) -> Tensor<B, 1> {
    let abs_error = (predictions - targets).abs();
    let quadratic = abs_error.clone().clamp_max(delta);
    let linear = abs_error - quadratic.clone();
    (quadratic.powf_scalar(2.0).mul_scalar(0.5) + linear.mul_scalar(delta)).mean()
}

pub fn mse<B: Backend>(predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    (predictions - targets).powf_scalar(2.0).mean()
}
