// projeto: cpuforecast
// file: src/config.rs
// Configuração do experimento (TOML) e valores padrão

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::neural::data::MetricsSpace;
use crate::neural::model::ModelConfig;
use crate::neural::trainer::TrainingConfig;
use crate::neural::utils::ForecastError;

/// Lido automaticamente do diretório atual quando nenhum `--config` é informado.
pub const DEFAULT_CONFIG_FILE: &str = "cpuforecast.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub input_path: PathBuf,
    pub n_in: usize,
    pub n_out: usize,
    /// Linhas supervisionadas usadas para treino; o restante vira teste/validação.
    pub n_train: usize,
    pub feature_range: (f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoomPlot {
    pub file: String,
    pub points: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub loss_plot: String,
    pub prediction_plot: String,
    pub history_file: String,
    pub report_file: String,
    pub metrics_space: MetricsSpace,
    // arrays of tables must follow plain values in TOML
    pub zoom_plots: Vec<ZoomPlot>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                input_path: PathBuf::from("Machine_usage_groupby.csv"),
                n_in: 1,
                n_out: 1,
                n_train: 40000,
                feature_range: (0.0, 1.0),
            },
            model: ModelConfig::default(),
            training: TrainingConfig::default(),
            output: OutputConfig {
                output_dir: PathBuf::from("."),
                loss_plot: "loss_train.html".to_string(),
                prediction_plot: "prediction.html".to_string(),
                history_file: "training_history.csv".to_string(),
                report_file: "run_report.json".to_string(),
                metrics_space: MetricsSpace::Unscaled,
                zoom_plots: vec![
                    ZoomPlot { file: "prediction_zoom1.html".to_string(), points: 500 },
                    ZoomPlot { file: "prediction_zoom2.html".to_string(), points: 50 },
                ],
            },
        }
    }
}

impl Config {
    /// Um caminho explícito precisa existir; sem caminho, usa `cpuforecast.toml`
    /// se presente, senão os padrões.
    pub fn load(path: Option<&Path>) -> Result<Self, ForecastError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => PathBuf::from(DEFAULT_CONFIG_FILE),
            None => {
                log::info!("📄 Nenhum arquivo de configuração; usando padrões");
                return Ok(Config::default());
            }
        };

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        log::info!("⚙️ Configuração carregada de: {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ForecastError> {
        let config_toml = toml::to_string_pretty(self)?;
        fs::write(path, config_toml)?;
        log::info!("💾 Configuração salva em: {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.data.n_out == 0 {
            return Err(ForecastError::Validation("data.n_out deve ser pelo menos 1".to_string()));
        }
        let (lo, hi) = self.data.feature_range;
        if !(lo < hi) {
            return Err(ForecastError::Validation(
                format!("data.feature_range inválido: ({}, {})", lo, hi)
            ));
        }
        if self.output.zoom_plots.iter().any(|z| z.points == 0) {
            return Err(ForecastError::Validation("output.zoom_plots: points deve ser maior que zero".to_string()));
        }
        self.model.validate()?;
        self.training.validate()?;
        Ok(())
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output.output_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_experiment() {
        let config = Config::default();
        assert_eq!(config.data.n_train, 40000);
        assert_eq!((config.data.n_in, config.data.n_out), (1, 1));
        assert_eq!(config.training.epochs, 50);
        assert_eq!(config.training.batch_size, 72);
        assert_eq!(config.output.zoom_plots.iter().map(|z| z.points).collect::<Vec<_>>(), vec![500, 50]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.training.patience = Some(5);
        config.output.metrics_space = MetricsSpace::Scaled;

        let path = std::env::temp_dir().join(format!("cpuforecast_config_{}.toml", std::process::id()));
        config.save(&path).unwrap();
        let loaded = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let result = Config::load(Some(Path::new("/nonexistent/cpuforecast.toml")));
        assert!(matches!(result, Err(ForecastError::Io(_))));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.data.n_out = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.data.feature_range = (1.0, 0.0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.training.epochs = 0;
        assert!(config.validate().is_err());
    }
}
