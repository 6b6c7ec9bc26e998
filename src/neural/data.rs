// projeto: cpuforecast
// file: src/neural/data.rs
// CSV ingestion, min-max scaling and row-ordered train/test splitting

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};

use crate::neural::utils::ForecastError;

/// Telemetry table as read from disk: one row per time step, one column per signal.
#[derive(Debug, Clone)]
pub struct RawSeries {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl RawSeries {
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_vars(&self) -> usize {
        self.values.ncols()
    }
}

/// Reads a headed CSV where every data cell is numeric.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawSeries, ForecastError> {
    let path = path.as_ref();
    log::info!("📥 [Data] Loading telemetry from: {}", path.display());

    // File::open yields ErrorKind::NotFound for a missing dataset
    let file = File::open(path)?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);

    let columns: Vec<String> = rdr.headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if columns.is_empty() {
        return Err(ForecastError::DataProcessing(
            format!("{} has no header columns", path.display())
        ));
    }

    let mut flat: Vec<f64> = Vec::new();
    let mut n_rows = 0;
    for (row_idx, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() != columns.len() {
            return Err(ForecastError::DataProcessing(format!(
                "row {} has {} fields, header has {}", row_idx + 1, record.len(), columns.len()
            )));
        }
        for (col_idx, field) in record.iter().enumerate() {
            let value = field.trim().parse::<f64>().map_err(|_| {
                ForecastError::DataProcessing(format!(
                    "row {} column '{}': cannot parse '{}' as a number",
                    row_idx + 1, columns[col_idx], field
                ))
            })?;
            flat.push(value);
        }
        n_rows += 1;
    }

    if n_rows == 0 {
        return Err(ForecastError::DataProcessing(
            format!("{} contains no data rows", path.display())
        ));
    }

    let values = Array2::from_shape_vec((n_rows, columns.len()), flat)?;
    log::info!("✅ [Data] Loaded {} time steps x {} signals: {:?}", n_rows, columns.len(), columns);
    Ok(RawSeries { columns, values })
}

/// Per-column min-max scaler. Zero-range columns are divided by 1 instead of 0, so they map
/// onto the lower bound of the range and invert back to their constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub feature_range: (f64, f64),
    pub data_min: Array1<f64>,
    pub data_max: Array1<f64>,
}

impl MinMaxScaler {
    pub fn fit(data: ArrayView2<f64>, feature_range: (f64, f64)) -> Result<Self, ForecastError> {
        let (lo, hi) = feature_range;
        if !(lo < hi) {
            return Err(ForecastError::Validation(
                format!("invalid feature range ({}, {})", lo, hi)
            ));
        }
        if data.nrows() == 0 {
            return Err(ForecastError::DataProcessing("cannot fit scaler on an empty table".to_string()));
        }

        let mut data_min = Array1::zeros(data.ncols());
        let mut data_max = Array1::zeros(data.ncols());
        for (j, column) in data.axis_iter(Axis(1)).enumerate() {
            data_min[j] = *column.min_skipnan();
            data_max[j] = *column.max_skipnan();
        }

        Ok(MinMaxScaler { feature_range, data_min, data_max })
    }

    fn data_range(&self, j: usize) -> f64 {
        let range = self.data_max[j] - self.data_min[j];
        if range.abs() < f64::EPSILON { 1.0 } else { range }
    }

    fn check_width(&self, ncols: usize) -> Result<(), ForecastError> {
        if ncols != self.data_min.len() {
            return Err(ForecastError::Shape(format!(
                "scaler fitted on {} columns, got {}", self.data_min.len(), ncols
            )));
        }
        Ok(())
    }

    pub fn transform(&self, data: ArrayView2<f64>) -> Result<Array2<f64>, ForecastError> {
        self.check_width(data.ncols())?;
        let mut out = data.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.data_min[j], self.data_range(j));
            let (lo, hi) = self.feature_range;
            column.mapv_inplace(|x| (x - min) / range * (hi - lo) + lo);
        }
        Ok(out)
    }

    pub fn fit_transform(
        data: ArrayView2<f64>,
        feature_range: (f64, f64),
    ) -> Result<(Self, Array2<f64>), ForecastError> {
        let scaler = Self::fit(data, feature_range)?;
        let scaled = scaler.transform(data)?;
        Ok((scaler, scaled))
    }

    pub fn inverse_transform(&self, data: ArrayView2<f64>) -> Result<Array2<f64>, ForecastError> {
        self.check_width(data.ncols())?;
        let mut out = data.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.data_min[j], self.data_range(j));
            let (lo, hi) = self.feature_range;
            column.mapv_inplace(|x| (x - lo) / (hi - lo) * range + min);
        }
        Ok(out)
    }

    /// Inverts a single column, e.g. model outputs for the target signal.
    pub fn inverse_transform_column(&self, column: usize, values: ArrayView1<f64>) -> Result<Array1<f64>, ForecastError> {
        if column >= self.data_min.len() {
            return Err(ForecastError::Shape(format!(
                "column {} out of range for scaler with {} columns", column, self.data_min.len()
            )));
        }
        let (min, range) = (self.data_min[column], self.data_range(column));
        let (lo, hi) = self.feature_range;
        Ok(values.mapv(|x| (x - lo) / (hi - lo) * range + min))
    }
}

/// Space in which test predictions are scored and plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSpace {
    /// Target signal mapped back to its original units.
    Unscaled,
    /// Model space, i.e. the scaler's feature range.
    Scaled,
}

/// Brings model outputs (or scaled targets) for signal `target_column` into `space`.
pub fn restore_target(
    scaler: &MinMaxScaler,
    target_column: usize,
    values: &[f32],
    space: MetricsSpace,
) -> Result<Vec<f64>, ForecastError> {
    let values: Array1<f64> = values.iter().map(|&v| v as f64).collect();
    match space {
        MetricsSpace::Scaled => Ok(values.to_vec()),
        MetricsSpace::Unscaled => Ok(scaler.inverse_transform_column(target_column, values.view())?.to_vec()),
    }
}

/// Splits rows into the prefix `[0, k)` and the suffix `[k, n)`; order is preserved.
pub fn split_rows(values: ArrayView2<f64>, k: usize) -> Result<(Array2<f64>, Array2<f64>), ForecastError> {
    let n = values.nrows();
    if k > n {
        return Err(ForecastError::Shape(format!(
            "split index {} exceeds the {} supervised rows available", k, n
        )));
    }
    Ok((values.slice(s![..k, ..]).to_owned(), values.slice(s![k.., ..]).to_owned()))
}

/// Inputs are every column but the last; the last column is the target.
pub fn features_and_target(values: ArrayView2<f64>) -> Result<(Array2<f32>, Array1<f32>), ForecastError> {
    let ncols = values.ncols();
    if ncols < 2 {
        return Err(ForecastError::Shape(format!(
            "need at least 2 columns to separate features from target, got {}", ncols
        )));
    }
    let x = values.slice(s![.., ..ncols - 1]).mapv(|v| v as f32);
    let y = values.column(ncols - 1).mapv(|v| v as f32);
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;

    fn temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("cpuforecast_{}_{}.csv", name, std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_csv() {
        let path = temp_csv("ok", "cpu,mem\n10.5,20\n11,21.25\n12,22\n");
        let series = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(series.columns, vec!["cpu", "mem"]);
        assert_eq!(series.len(), 3);
        assert_eq!(series.n_vars(), 2);
        assert_eq!(series.values, array![[10.5, 20.0], [11.0, 21.25], [12.0, 22.0]]);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv("/nonexistent/cpuforecast/machine_usage.csv").unwrap_err();
        match err {
            ForecastError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_csv_bad_cell() {
        let path = temp_csv("bad", "cpu,mem\n1,2\n3,abc\n");
        let err = load_csv(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        let msg = err.to_string();
        assert!(msg.contains("row 2"));
        assert!(msg.contains("mem"));
    }

    #[test]
    fn test_load_csv_header_only() {
        let path = temp_csv("empty", "cpu,mem\n");
        let err = load_csv(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ForecastError::DataProcessing(_)));
    }

    #[test]
    fn test_scaler_round_trip() {
        let data = array![[0.0, 10.0], [5.0, 30.0], [10.0, 50.0]];
        let (scaler, scaled) = MinMaxScaler::fit_transform(data.view(), (0.0, 1.0)).unwrap();

        assert_eq!(scaled, array![[0.0, 0.0], [0.5, 0.5], [1.0, 1.0]]);

        let restored = scaler.inverse_transform(scaled.view()).unwrap();
        for (a, b) in restored.iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-12);
        }

        let target = scaler.inverse_transform_column(1, scaled.column(1)).unwrap();
        assert_eq!(target.to_vec(), vec![10.0, 30.0, 50.0]);
    }

    #[test]
    fn test_scaler_constant_column() {
        let data = array![[3.0, 1.0], [3.0, 2.0]];
        let (scaler, scaled) = MinMaxScaler::fit_transform(data.view(), (0.0, 1.0)).unwrap();
        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.0]);

        let restored = scaler.inverse_transform(scaled.view()).unwrap();
        assert_eq!(restored.column(0).to_vec(), vec![3.0, 3.0]);
    }

    #[test]
    fn test_scaler_width_mismatch() {
        let data = array![[0.0, 1.0], [1.0, 2.0]];
        let scaler = MinMaxScaler::fit(data.view(), (0.0, 1.0)).unwrap();
        let wrong = array![[0.0], [1.0]];
        assert!(matches!(scaler.transform(wrong.view()), Err(ForecastError::Shape(_))));
        assert!(scaler.inverse_transform_column(2, wrong.column(0)).is_err());
    }

    #[test]
    fn test_restore_target() {
        let data = array![[0.0, 100.0], [10.0, 300.0]];
        let scaler = MinMaxScaler::fit(data.view(), (0.0, 1.0)).unwrap();

        let unscaled = restore_target(&scaler, 1, &[0.0, 0.5, 1.0], MetricsSpace::Unscaled).unwrap();
        assert_eq!(unscaled, vec![100.0, 200.0, 300.0]);

        let scaled = restore_target(&scaler, 1, &[0.0, 0.5, 1.0], MetricsSpace::Scaled).unwrap();
        assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_split_partitions_rows() {
        let table = Array2::from_shape_fn((6, 2), |(i, j)| (i * 2 + j) as f64);
        for k in 0..=6 {
            let (train, test) = split_rows(table.view(), k).unwrap();
            assert_eq!(train.nrows(), k);
            assert_eq!(test.nrows(), 6 - k);
            let rejoined = ndarray::concatenate(Axis(0), &[train.view(), test.view()]).unwrap();
            assert_eq!(rejoined, table);
        }
    }

    #[test]
    fn test_split_beyond_rows_reports_sizes() {
        let table = Array2::<f64>::zeros((10, 3));
        let err = split_rows(table.view(), 40000).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("40000"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_features_and_target() {
        let table = array![[1.0, 10.0, 2.0, 20.0], [2.0, 20.0, 3.0, 30.0]];
        let (x, y) = features_and_target(table.view()).unwrap();
        assert_eq!(x, array![[1.0f32, 10.0, 2.0], [2.0, 20.0, 3.0]]);
        assert_eq!(y.to_vec(), vec![20.0f32, 30.0]);

        let narrow = array![[1.0], [2.0]];
        assert!(features_and_target(narrow.view()).is_err());
    }
}
