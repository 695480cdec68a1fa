//! # Parameter Store
//!
//! Holds the pretrained network weights: the input-to-hidden matrix `W`, the
//! hidden bias vector `b`, and the hidden-to-output matrix `Beta`. Shapes are
//! checked once, when the parameters are built or loaded; a `NetworkParameters`
//! value that exists is always well-formed, so the engine never has to re-check
//! them per call.
//!
//! Two on-disk formats are understood:
//! - The human-readable TOML artifact (`model.toml`), with a `[network]` table
//!   holding `w`, `b` and `beta` as nested arrays.
//! - The legacy packaging: three JSON files `W.json`, `b.json` and
//!   `Beta_output.json` in one directory.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Length of the normalized input vector.
pub const INPUT_FEATURES: usize = 9;
/// Output logits: class 0 is "no risk", class 1 is "risk".
pub const OUTPUT_CLASSES: usize = 2;

pub const WEIGHTS_FILE: &str = "W.json";
pub const BIAS_FILE: &str = "b.json";
pub const OUTPUT_WEIGHTS_FILE: &str = "Beta_output.json";

/// Everything that can go wrong while building or loading network parameters.
/// All variants are fatal: an engine is never constructed from bad parameters.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Failed to read or write parameter file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML parameter file: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize parameters to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Failed to parse JSON parameter file '{file}': {source}")]
    JsonParseError {
        file: String,
        source: serde_json::Error,
    },
    #[error("Matrix '{matrix}' is ragged: row {row} has {found} columns, expected {expected}.")]
    RaggedMatrix {
        matrix: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Could not assemble parameter matrix: {0}")]
    ShapeError(#[from] ndarray::ShapeError),
    #[error("Matrix 'W' has {found} rows, but the network takes {expected} inputs.")]
    MismatchedInputRows { found: usize, expected: usize },
    #[error("Bias vector 'b' has length {found}, but 'W' defines {expected} hidden units.")]
    MismatchedBiasLength { found: usize, expected: usize },
    #[error("Matrix 'Beta' has {found} rows, but 'W' defines {expected} hidden units.")]
    MismatchedOutputRows { found: usize, expected: usize },
    #[error("Matrix 'Beta' has {found} columns, but the network has {expected} output classes.")]
    MismatchedOutputColumns { found: usize, expected: usize },
    #[error("Matrix 'W' has no columns; the network needs at least one hidden unit.")]
    NoHiddenUnits,
    #[error("Parameter '{matrix}' holds a non-finite value at [{row}, {col}].")]
    NonFiniteParameter {
        matrix: &'static str,
        row: usize,
        col: usize,
    },
}

/// The `[network]` table of the TOML artifact, and the in-memory shape of the
/// JSON trio once read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkTable {
    pub w: Vec<Vec<f64>>,
    pub b: Vec<f64>,
    pub beta: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParameterFile {
    network: NetworkTable,
}

/// Validated, immutable network parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParameters {
    w: Array2<f64>,
    b: Array1<f64>,
    beta: Array2<f64>,
}

impl NetworkParameters {
    /// Builds parameters from arrays, rejecting any shape that does not fit
    /// `W: [9 x H]`, `b: [H]`, `Beta: [H x 2]`, and any non-finite entry.
    pub fn new(
        w: Array2<f64>,
        b: Array1<f64>,
        beta: Array2<f64>,
    ) -> Result<Self, ConfigurationError> {
        if w.nrows() != INPUT_FEATURES {
            return Err(ConfigurationError::MismatchedInputRows {
                found: w.nrows(),
                expected: INPUT_FEATURES,
            });
        }
        let hidden = w.ncols();
        if hidden == 0 {
            return Err(ConfigurationError::NoHiddenUnits);
        }
        if b.len() != hidden {
            return Err(ConfigurationError::MismatchedBiasLength {
                found: b.len(),
                expected: hidden,
            });
        }
        if beta.nrows() != hidden {
            return Err(ConfigurationError::MismatchedOutputRows {
                found: beta.nrows(),
                expected: hidden,
            });
        }
        if beta.ncols() != OUTPUT_CLASSES {
            return Err(ConfigurationError::MismatchedOutputColumns {
                found: beta.ncols(),
                expected: OUTPUT_CLASSES,
            });
        }

        check_finite_matrix("W", w.view())?;
        if let Some(col) = b.iter().position(|v| !v.is_finite()) {
            return Err(ConfigurationError::NonFiniteParameter {
                matrix: "b",
                row: 0,
                col,
            });
        }
        check_finite_matrix("Beta", beta.view())?;

        Ok(Self { w, b, beta })
    }

    /// Builds parameters from nested row vectors, as they appear on disk.
    pub fn from_table(table: NetworkTable) -> Result<Self, ConfigurationError> {
        let w = matrix_from_rows("W", table.w)?;
        let beta = matrix_from_rows("Beta", table.beta)?;
        Self::new(w, Array1::from_vec(table.b), beta)
    }

    /// Input-to-hidden weights, shape `[9, H]`.
    pub fn w(&self) -> ArrayView2<'_, f64> {
        self.w.view()
    }

    /// Hidden-layer biases, length `H`.
    pub fn b(&self) -> ArrayView1<'_, f64> {
        self.b.view()
    }

    /// Hidden-to-output weights, shape `[H, 2]`.
    pub fn beta(&self) -> ArrayView2<'_, f64> {
        self.beta.view()
    }

    pub fn hidden_units(&self) -> usize {
        self.w.ncols()
    }

    pub fn to_table(&self) -> NetworkTable {
        NetworkTable {
            w: self.w.outer_iter().map(|row| row.to_vec()).collect(),
            b: self.b.to_vec(),
            beta: self.beta.outer_iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Saves the parameters to a file in a human-readable TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ConfigurationError> {
        let file_contents = ParameterFile {
            network: self.to_table(),
        };
        let toml_string = toml::to_string_pretty(&file_contents)?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads parameters from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let toml_string = fs::read_to_string(path)?;
        let parsed: ParameterFile = toml::from_str(&toml_string)?;
        let params = Self::from_table(parsed.network)?;
        log::info!(
            "Loaded network parameters from '{}': W [{} x {}], b [{}], Beta [{} x {}]",
            path.display(),
            INPUT_FEATURES,
            params.hidden_units(),
            params.hidden_units(),
            params.hidden_units(),
            OUTPUT_CLASSES
        );
        Ok(params)
    }

    /// Loads parameters from the three JSON files `W.json`, `b.json` and
    /// `Beta_output.json` in `dir`.
    pub fn load_json_dir(dir: &Path) -> Result<Self, ConfigurationError> {
        let table = NetworkTable {
            w: read_json(&dir.join(WEIGHTS_FILE))?,
            b: read_json(&dir.join(BIAS_FILE))?,
            beta: read_json(&dir.join(OUTPUT_WEIGHTS_FILE))?,
        };
        let params = Self::from_table(table)?;
        log::info!(
            "Loaded network parameters from JSON files in '{}' ({} hidden units)",
            dir.display(),
            params.hidden_units()
        );
        Ok(params)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigurationError> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| ConfigurationError::JsonParseError {
        file: path.display().to_string(),
        source,
    })
}

fn matrix_from_rows(
    matrix: &'static str,
    rows: Vec<Vec<f64>>,
) -> Result<Array2<f64>, ConfigurationError> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(n_rows * n_cols);
    for (row, values) in rows.into_iter().enumerate() {
        if values.len() != n_cols {
            return Err(ConfigurationError::RaggedMatrix {
                matrix,
                row,
                expected: n_cols,
                found: values.len(),
            });
        }
        flat.extend(values);
    }
    Ok(Array2::from_shape_vec((n_rows, n_cols), flat)?)
}

fn check_finite_matrix(
    matrix: &'static str,
    values: ArrayView2<f64>,
) -> Result<(), ConfigurationError> {
    match values.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), _)) => Err(ConfigurationError::NonFiniteParameter { matrix, row, col }),
        None => Ok(()),
    }
}
