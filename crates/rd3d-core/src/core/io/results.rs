use crate::core::models::dose::{
    DoseRange, DoseSample, DoseVolume, HistogramBin, SimulationSummary,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

pub const AVERAGE_DWD_COLUMN: &str = "Average_DWD";
pub const MAX_DOSE_COLUMN: &str = "Max_Dose";

static HISTOGRAM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Bin\s+(\d+),\s+([\d.]+)\s+(?:to\s+([\d.]+)\s+MGy|MGy upwards):\s+([\d.]+)")
        .expect("histogram pattern is a valid regex")
});

#[derive(Debug, Error)]
pub enum ResultError {
    #[error("Result file '{path}' does not exist (the simulator produced no output)", path = .path.display())]
    Missing { path: PathBuf },
    #[error("I/O error for '{path}': {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}", path = .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("'{path}' contains no data row", path = .path.display())]
    NoData { path: PathBuf },
    #[error("Column '{column}' is missing from '{path}'", path = .path.display())]
    MissingColumn { column: &'static str, path: PathBuf },
    #[error("Invalid number '{value}' in '{path}' ({location})", path = .path.display())]
    InvalidNumber {
        path: PathBuf,
        location: String,
        value: String,
    },
    #[error("Row {row} of '{path}' has {found} columns, expected at least 4", path = .path.display())]
    TooFewColumns {
        path: PathBuf,
        row: usize,
        found: usize,
    },
    #[error(
        "Dose samples do not form a complete grid: {samples} samples for a {}x{}x{} grid",
        .shape[0], .shape[1], .shape[2]
    )]
    RaggedGrid { samples: usize, shape: [usize; 3] },
}

/// Normalizes a CSV header the way `numpy.genfromtxt(names=True)` does:
/// surrounding whitespace is dropped, inner spaces become underscores and
/// punctuation is removed (`"Average DWD"` -> `"Average_DWD"`,
/// `"AD-WC"` -> `"ADWC"`).
pub fn normalize_column_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Loads the first data row of the simulator's summary CSV.
///
/// # Errors
///
/// Fails if the file is absent, has no data row, lacks `Average_DWD` or
/// `Max_Dose`, or holds a non-numeric value in one of those columns.
pub fn read_summary(path: &Path) -> Result<SimulationSummary, ResultError> {
    if !path.is_file() {
        return Err(ResultError::Missing {
            path: path.to_path_buf(),
        });
    }
    let csv_error = |source| ResultError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(normalize_column_name)
        .collect();

    let record = match reader.records().next() {
        Some(record) => record.map_err(csv_error)?,
        None => {
            return Err(ResultError::NoData {
                path: path.to_path_buf(),
            });
        }
    };

    let mut raw = BTreeMap::new();
    for (name, value) in headers.iter().zip(record.iter()) {
        raw.insert(name.clone(), value.to_string());
    }

    let required = |column: &'static str| -> Result<f64, ResultError> {
        let value = raw.get(column).ok_or_else(|| ResultError::MissingColumn {
            column,
            path: path.to_path_buf(),
        })?;
        value.parse().map_err(|_| ResultError::InvalidNumber {
            path: path.to_path_buf(),
            location: format!("column {}", column),
            value: value.clone(),
        })
    };
    let average_dwd = required(AVERAGE_DWD_COLUMN)?;
    let max_dose = required(MAX_DOSE_COLUMN)?;

    let columns = raw
        .iter()
        .filter_map(|(name, value)| value.parse().ok().map(|v| (name.clone(), v)))
        .collect();

    Ok(SimulationSummary {
        average_dwd,
        max_dose,
        columns,
    })
}

/// Extracts the final dose histogram from the simulator's text summary.
///
/// Lines that are not histogram bins are skipped; text without any bins
/// yields an empty histogram.
pub fn parse_histogram(text: &str) -> Vec<HistogramBin> {
    HISTOGRAM_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let index = caps[1].parse().ok()?;
            let from = caps[2].to_string();
            let range = match caps.get(3) {
                Some(to) => DoseRange::Closed {
                    from,
                    to: to.as_str().to_string(),
                },
                None => DoseRange::Upwards { from },
            };
            let percentage = caps[4].parse().ok()?;
            Some(HistogramBin {
                index,
                range,
                percentage,
            })
        })
        .collect()
}

pub fn read_histogram(path: &Path) -> Result<Vec<HistogramBin>, ResultError> {
    if !path.is_file() {
        return Err(ResultError::Missing {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|source| ResultError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_histogram(&text))
}

/// Loads the per-voxel dose state (`x, y, z, dose, ...` without header).
///
/// The grid shape is the number of distinct coordinates along each axis; the
/// samples must fill that grid completely.
pub fn read_dose_volume(path: &Path) -> Result<DoseVolume, ResultError> {
    if !path.is_file() {
        return Err(ResultError::Missing {
            path: path.to_path_buf(),
        });
    }
    let csv_error = |source| ResultError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() < 4 {
            return Err(ResultError::TooFewColumns {
                path: path.to_path_buf(),
                row: row + 1,
                found: record.len(),
            });
        }
        let mut values = [0.0; 4];
        for (column, value) in values.iter_mut().enumerate() {
            let field = &record[column];
            *value = field.parse().map_err(|_| ResultError::InvalidNumber {
                path: path.to_path_buf(),
                location: format!("row {}, column {}", row + 1, column + 1),
                value: field.to_string(),
            })?;
        }
        let [x, y, z, dose] = values;
        samples.push(DoseSample { x, y, z, dose });
    }

    let shape = [
        distinct(samples.iter().map(|s| s.x)),
        distinct(samples.iter().map(|s| s.y)),
        distinct(samples.iter().map(|s| s.z)),
    ];
    if shape.iter().product::<usize>() != samples.len() {
        return Err(ResultError::RaggedGrid {
            samples: samples.len(),
            shape,
        });
    }

    Ok(DoseVolume { samples, shape })
}

fn distinct(values: impl Iterator<Item = f64>) -> usize {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values.len()
}
