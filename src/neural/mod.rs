// projeto: cpuforecast
// file: src/neural/mod.rs
// Module declarations for the forecasting pipeline

pub mod utils;    // Error handling, validation and timing helpers
pub mod window;   // Lag/lead windowing of a multivariate series
pub mod data;     // CSV loading, scaling and row splits
pub mod model;    // Conv1D + GRU network and losses
pub mod metrics;  // Training history and regression metrics
pub mod trainer;  // Training loop and batched inference
pub mod plots;    // HTML charts
pub mod storage;  // History CSV and JSON run report

// Re-export commonly used items for convenience
pub use data::{load_csv, MetricsSpace, MinMaxScaler};
pub use model::ConvGruForecaster;
pub use trainer::{predict, train, SupervisedSet};
pub use utils::ForecastError;
pub use window::series_to_supervised;
