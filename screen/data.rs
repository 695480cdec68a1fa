//! # Screening Data Loading
//!
//! Reads a tab-separated file of vitals, one person per row, and writes the
//! matching predictions back out.
//!
//! - Fixed Schema: the required columns are `age`, `gender`, `weight`, `height`,
//!   `temperature`, `heart_rate`, `respiratory_rate` and `oxygen_saturation`.
//!   `bmi` and `sample_id` are optional.
//! - Per-Row Failures: every column is read as text and parsed cell by cell.
//!   A cell that is empty or not a number becomes `NaN` in that row only, so one
//!   bad row yields one error prediction instead of rejecting the whole file.

use crate::engine::PredictionResult;
use crate::recommend::recommendations;
use crate::vitals::{Gender, RawVitals, body_mass_index, parse_vital};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "age",
    "gender",
    "weight",
    "height",
    "temperature",
    "heart_rate",
    "respiratory_rate",
    "oxygen_saturation",
];

/// Rows of vitals ready for the engine.
#[derive(Debug)]
pub struct ScreeningData {
    /// From the `sample_id` column if present, otherwise 1-based row numbers.
    pub sample_ids: Vec<String>,
    pub vitals: Vec<RawVitals>,
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(
        "The required column '{0}' was not found in the input file. Please check spelling and case."
    )]
    ColumnNotFound(String),
    #[error("The input file '{0}' contains no data rows.")]
    EmptyInput(String),
    #[error("Got {results} predictions for {rows} rows.")]
    MismatchedResults { rows: usize, results: usize },
}

/// Loads vitals from a TSV file with a header row.
pub fn load_screening_data(path: &str) -> Result<ScreeningData, DataError> {
    log::info!("Loading screening data from '{path}'");

    let df = CsvReader::new(File::open(Path::new(path))?)
        .with_options(
            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(0))
                .with_parse_options(CsvParseOptions::default().with_separator(b'\t')),
        )
        .finish()?;

    if df.height() == 0 {
        return Err(DataError::EmptyInput(path.to_string()));
    }

    let columns_set: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    for col_name in REQUIRED_COLUMNS {
        if !columns_set.contains(col_name) {
            return Err(DataError::ColumnNotFound(col_name.to_string()));
        }
    }

    let n = df.height();
    let age = text_column(&df, "age")?;
    let gender = text_column(&df, "gender")?;
    let weight = text_column(&df, "weight")?;
    let height = text_column(&df, "height")?;
    let temperature = text_column(&df, "temperature")?;
    let heart_rate = text_column(&df, "heart_rate")?;
    let respiratory_rate = text_column(&df, "respiratory_rate")?;
    let oxygen_saturation = text_column(&df, "oxygen_saturation")?;
    let bmi = if columns_set.contains("bmi") {
        Some(text_column(&df, "bmi")?)
    } else {
        None
    };

    let numeric = |cells: &[Option<String>], i: usize| {
        cells[i].as_deref().map_or(f64::NAN, parse_vital)
    };

    let vitals: Vec<RawVitals> = (0..n)
        .map(|i| {
            let weight_kg = numeric(&weight, i);
            let height_cm = numeric(&height, i);
            // A blank bmi cell falls back to the derived value.
            let bmi_cell = bmi
                .as_ref()
                .and_then(|cells| cells[i].as_deref())
                .filter(|text| !text.is_empty());
            let bmi_value = match bmi_cell {
                Some(text) => parse_vital(text),
                None => body_mass_index(weight_kg, height_cm),
            };
            RawVitals {
                age: numeric(&age, i),
                gender: Gender::parse(gender[i].as_deref().unwrap_or("")),
                weight: weight_kg,
                height: height_cm,
                temperature: numeric(&temperature, i),
                heart_rate: numeric(&heart_rate, i),
                respiratory_rate: numeric(&respiratory_rate, i),
                oxygen_saturation: numeric(&oxygen_saturation, i),
                bmi: bmi_value,
            }
        })
        .collect();

    let sample_ids = if columns_set.contains("sample_id") {
        text_column(&df, "sample_id")?
            .into_iter()
            .enumerate()
            .map(|(i, id)| match id {
                Some(text) if !text.is_empty() => text,
                _ => (i + 1).to_string(),
            })
            .collect()
    } else {
        (1..=n).map(|i| i.to_string()).collect()
    };

    log::info!("Loaded {n} rows of vitals");
    Ok(ScreeningData { sample_ids, vitals })
}

fn text_column(df: &DataFrame, column_name: &str) -> Result<Vec<Option<String>>, DataError> {
    let casted = df.column(column_name)?.cast(&DataType::String)?;
    let values = casted
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|cell| cell.map(|text| text.trim().to_string()))
        .collect();
    Ok(values)
}

/// Writes one row per prediction. Failed predictions are written with `NA`
/// probabilities, category `Error`, and the reason.
pub fn save_predictions(
    output_path: &str,
    data: &ScreeningData,
    results: &[PredictionResult],
) -> Result<(), DataError> {
    if results.len() != data.vitals.len() {
        return Err(DataError::MismatchedResults {
            rows: data.vitals.len(),
            results: results.len(),
        });
    }

    let mut file = BufWriter::new(File::create(output_path)?);
    writeln!(
        file,
        "sample_id\tprobability\trisk_score\tcategory\trecommendations\terror"
    )?;

    for ((id, vitals), result) in data.sample_ids.iter().zip(&data.vitals).zip(results) {
        let recs = recommendations(vitals, result.category)
            .iter()
            .map(|item| item.key.template_id())
            .collect::<Vec<_>>()
            .join(",");
        match &result.error {
            Some(error) => writeln!(
                file,
                "{}\tNA\tNA\t{}\t{}\t{}",
                id, result.category, recs, error
            )?,
            None => writeln!(
                file,
                "{}\t{:.1}\t{}\t{}\t{}\tNA",
                id, result.probability, result.risk_score, result.category, recs
            )?,
        }
    }

    file.flush()?;
    Ok(())
}
