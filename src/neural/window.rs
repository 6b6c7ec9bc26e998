// projeto: cpuforecast
// file: src/neural/window.rs
// Supervised windowing: lagged inputs and lead targets from a raw series

use ndarray::{Array2, ArrayView2, Axis};
use crate::neural::utils::ForecastError;

/// Table produced by [`series_to_supervised`]. Missing cells are `f64::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisedTable {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl SupervisedTable {
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

/// Offset of one generated block relative to the anchor row.
#[derive(Debug, Clone, Copy)]
enum Shift {
    Lag(usize),
    Lead(usize),
}

impl Shift {
    fn source_row(self, row: usize, len: usize) -> Option<usize> {
        match self {
            Shift::Lag(i) => row.checked_sub(i),
            Shift::Lead(i) => Some(row + i).filter(|&r| r < len),
        }
    }

    fn label(self, column: &str, j: usize) -> String {
        match self {
            Shift::Lag(i) => format!("{}{}(t-{})", column, j + 1, i),
            Shift::Lead(0) => format!("{}{}(t)", column, j + 1),
            Shift::Lead(i) => format!("{}{}(t+{})", column, j + 1, i),
        }
    }
}

/// Reframes `data` (rows = time steps, columns = signals) as a supervised table.
///
/// Blocks are emitted lag-first, from `t-n_in` down to `t-1`, followed by
/// `t`, `t+1` … `t+n_out-1`. Each block holds one column per signal, named
/// `"{signal}{j+1}(t±i)"`. With `drop_incomplete` every row holding a NaN is
/// removed, which for a gap-free series removes the first `n_in` and the last
/// `n_out - 1` rows.
pub fn series_to_supervised<S: AsRef<str>>(
    data: ArrayView2<f64>,
    columns: &[S],
    n_in: usize,
    n_out: usize,
    drop_incomplete: bool,
) -> Result<SupervisedTable, ForecastError> {
    let (len, n_vars) = data.dim();

    if columns.len() != n_vars {
        return Err(ForecastError::Validation(format!(
            "{} signal labels given for a series with {} columns",
            columns.len(), n_vars
        )));
    }
    if n_out == 0 {
        return Err(ForecastError::Validation(
            "n_out must be at least 1 (no target column otherwise)".to_string()
        ));
    }

    let shifts: Vec<Shift> = (1..=n_in).rev().map(Shift::Lag)
        .chain((0..n_out).map(Shift::Lead))
        .collect();

    let names: Vec<String> = shifts.iter()
        .flat_map(|&shift| {
            columns.iter().enumerate().map(move |(j, c)| shift.label(c.as_ref(), j))
        })
        .collect();

    let mut values = Array2::from_elem((len, shifts.len() * n_vars), f64::NAN);
    for (block, &shift) in shifts.iter().enumerate() {
        let offset = block * n_vars;
        for row in 0..len {
            if let Some(src) = shift.source_row(row, len) {
                for j in 0..n_vars {
                    values[[row, offset + j]] = data[[src, j]];
                }
            }
        }
    }

    if drop_incomplete {
        let complete: Vec<usize> = values.axis_iter(Axis(0))
            .enumerate()
            .filter(|(_, row)| row.iter().all(|v| !v.is_nan()))
            .map(|(i, _)| i)
            .collect();
        values = values.select(Axis(0), &complete);
    }

    log::debug!("🪟 [Window] n_in={} n_out={} → {} rows x {} columns",
                n_in, n_out, values.nrows(), values.ncols());

    Ok(SupervisedTable { names, values })
}
