// projeto: cpuforecast
// file: src/main.rs
// Previsão de uso de CPU: janelamento, treino Conv1D+GRU e avaliação no conjunto de teste

mod config;
mod neural;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use chrono::Utc;
use clap::Parser;
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::neural::data::{features_and_target, restore_target, split_rows};
use crate::neural::metrics::calculate_regression_metrics;
use crate::neural::plots::{save_loss_plot, save_prediction_plot};
use crate::neural::storage::{save_history_csv, save_run_report, DataShapes, RunReport};
use crate::neural::utils::validate_input_data;
use crate::neural::{
    load_csv, predict, series_to_supervised, train, ConvGruForecaster, ForecastError, MetricsSpace,
    MinMaxScaler, SupervisedSet,
};

type TrainBackend = Autodiff<NdArray<f32>>;

#[derive(Parser, Debug)]
#[command(
    name = "cpu-forecast",
    version,
    about = "Treina um modelo Conv1D + GRU para prever o uso de CPU a partir de telemetria",
    long_about = "Lê a série de telemetria em CSV, transforma em tabela supervisionada (lags/leads), \
                  treina o modelo e reporta RMSE/MSE no conjunto de teste, com gráficos em HTML."
)]
struct Cli {
    /// Arquivo de configuração TOML (padrão: cpuforecast.toml, se existir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV de entrada com cabeçalho
    #[arg(long)]
    input: Option<PathBuf>,

    /// Diretório onde gráficos e relatórios são gravados
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Linhas supervisionadas usadas para treino
    #[arg(long)]
    n_train: Option<usize>,

    /// Número de épocas de treinamento
    #[arg(long)]
    epochs: Option<usize>,

    /// Tamanho do lote
    #[arg(long)]
    batch_size: Option<usize>,

    /// Passos passados (lags) por amostra
    #[arg(long)]
    n_in: Option<usize>,

    /// Passos de previsão, incluindo t
    #[arg(long)]
    n_out: Option<usize>,

    /// Calcula métricas no espaço normalizado [0, 1]
    #[arg(long)]
    scaled_metrics: bool,

    /// Grava a configuração padrão neste caminho e sai
    #[arg(long)]
    write_default_config: Option<PathBuf>,

    /// Modo verboso de logging
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.data.input_path = input.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if let Some(n_train) = self.n_train {
            config.data.n_train = n_train;
        }
        if let Some(n_in) = self.n_in {
            config.data.n_in = n_in;
        }
        if let Some(n_out) = self.n_out {
            config.data.n_out = n_out;
        }
        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.training.batch_size = batch_size;
        }
        if self.scaled_metrics {
            config.output.metrics_space = MetricsSpace::Scaled;
        }
    }
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let start_time = Instant::now();
    info!("🚀 Previsão de uso de CPU iniciada");
    info!("🕐 Iniciado em: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));

    match run(&cli) {
        Ok(()) => {
            info!("✅ Execução concluída em {:.2}s", start_time.elapsed().as_secs_f64());
        }
        Err(e) => {
            error!("❌ Erro durante a execução: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

fn run(cli: &Cli) -> Result<(), ForecastError> {
    if let Some(path) = &cli.write_default_config {
        return Config::default().save(path);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let started_at = Utc::now();
    fs::create_dir_all(&config.output.output_dir)?;

    // 1. Dados brutos
    let series = load_csv(&config.data.input_path)?;
    validate_input_data(&series.values, "input series")?;

    // 2. Normalização e janelamento
    let (scaler, scaled) = MinMaxScaler::fit_transform(series.values.view(), config.data.feature_range)?;
    let table = series_to_supervised(scaled.view(), &series.columns, config.data.n_in, config.data.n_out, true)?;
    info!("🔄 Tabela supervisionada: {} linhas x {} colunas", table.nrows(), table.ncols());
    debug!("   Colunas: {:?}", table.names);

    // 3. Divisão treino/teste pela ordem temporal
    let (train_rows, test_rows) = split_rows(table.values.view(), config.data.n_train)?;
    info!("✂️ Treino: {} linhas | Teste: {} linhas", train_rows.nrows(), test_rows.nrows());

    let (train_x, train_y) = features_and_target(train_rows.view())?;
    let (test_x, test_y) = features_and_target(test_rows.view())?;
    let train_set = SupervisedSet::new(train_x, train_y)?;
    let test_set = SupervisedSet::new(test_x, test_y)?;

    // 4. Treino (o conjunto de teste faz o papel de validação)
    let device = Default::default();
    let model = ConvGruForecaster::<TrainBackend>::new(train_set.n_features(), &config.model, &device);
    let (model, tracker) = train(model, &train_set, &test_set, &config.training, &device)?;

    // 5. Avaliação
    let predictions = predict(&model.valid(), test_set.x.view(), config.training.batch_size, &device)?;

    let target_column = series.n_vars() - 1;
    let signal = &series.columns[target_column];
    let space = config.output.metrics_space;
    if space == MetricsSpace::Scaled {
        warn!("⚠️ Métricas calculadas no espaço normalizado; valores não estão nas unidades de '{}'", signal);
    }

    let predicted = restore_target(&scaler, target_column, &predictions, space)?;
    let actual = restore_target(&scaler, target_column, &test_set.y.to_vec(), space)?;

    let test_metrics = calculate_regression_metrics(&predicted, &actual)?;
    test_metrics.log("Test");
    println!("Test RMSE: {:.8}", test_metrics.rmse);
    println!("Test MSE: {:.8}", test_metrics.mse);

    // 6. Gráficos e relatórios
    save_loss_plot(&tracker, &config.output_path(&config.output.loss_plot))?;
    save_prediction_plot(&predicted, &actual, signal, None, &config.output_path(&config.output.prediction_plot))?;
    for zoom in &config.output.zoom_plots {
        save_prediction_plot(&predicted, &actual, signal, Some(zoom.points), &config.output_path(&zoom.file))?;
    }
    save_history_csv(&tracker, &config.output_path(&config.output.history_file))?;

    let latest = tracker.get_latest_metrics();
    let report = RunReport {
        signals: series.columns.clone(),
        supervised_columns: table.names.clone(),
        shapes: DataShapes {
            raw_rows: series.len(),
            raw_columns: series.n_vars(),
            supervised_rows: table.nrows(),
            supervised_columns: table.ncols(),
            train_rows: train_set.len(),
            test_rows: test_set.len(),
        },
        epochs_run: tracker.history.len(),
        best_epoch: tracker.best_epoch,
        final_train_loss: latest.map(|m| m.train_loss),
        final_val_loss: latest.map(|m| m.val_loss),
        test_metrics,
        metrics_space: space,
        started_at,
        finished_at: Utc::now(),
        config: config.clone(),
    };
    save_run_report(&report, &config.output_path(&config.output.report_file))?;

    Ok(())
}
