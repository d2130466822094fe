use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::model::{Observation, ObservationTable};

/// Columns every input file must provide. Anything else is ignored.
pub const REQUIRED_COLUMNS: [&str; 4] =
    ["scientific_name", "common_name", "latitude", "longitude"];

/// Why a dataset could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("cannot open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("malformed row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: '{value}' in column '{column}' is not a number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: null value in column '{column}'")]
    NullValue { row: usize, column: &'static str },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType {
        column: &'static str,
        data_type: DataType,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an observation table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-delimited, header row
/// * `.tsv`     – tab-delimited, header row
/// * `.json`    – `[{ "scientific_name": ..., "latitude": ..., ... }, ...]`
/// * `.parquet` – one column per field
pub fn load_file(path: &Path) -> Result<ObservationTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_delimited(path, b',')?,
        "tsv" => load_delimited(path, b'\t')?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    let out_of_range = table.out_of_range_count();
    if out_of_range > 0 {
        log::warn!(
            "{} of {} observations in {} have out-of-range coordinates",
            out_of_range,
            table.len(),
            path.display()
        );
    }
    let missing = table.missing_coordinate_count();
    if missing > 0 {
        log::warn!(
            "{} of {} observations in {} have no coordinates",
            missing,
            table.len(),
            path.display()
        );
    }

    Ok(table)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with at least the required columns, in any order.
/// Row numbers in errors are 1-based and count data rows only.
fn load_delimited(path: &Path, delimiter: u8) -> Result<ObservationTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(open(path)?);

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv { row: 0, source })?
        .clone();

    let mut indices = [0usize; 4];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(LoadError::MissingColumn(name))?;
    }
    let [name_idx, common_idx, lat_idx, lon_idx] = indices;

    let mut records = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|source| LoadError::Csv { row, source })?;
        let field = |idx: usize| record.get(idx).unwrap_or("");

        records.push(Observation::new(
            field(name_idx),
            field(common_idx),
            parse_coordinate(field(lat_idx), row, "latitude")?,
            parse_coordinate(field(lon_idx), row, "longitude")?,
        ));
    }

    Ok(ObservationTable::from_records(records))
}

/// A blank cell is a missing coordinate and reads as NaN.
fn parse_coordinate(s: &str, row: usize, column: &'static str) -> Result<f64, LoadError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
        row,
        column,
        value: s.to_string(),
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "scientific_name": "Mikania micrantha",
///     "common_name": "Mile-a-minute",
///     "latitude": 3.139,
///     "longitude": 101.687
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<ObservationTable, LoadError> {
    let reader = BufReader::new(open(path)?);
    let records: Vec<Observation> = serde_json::from_reader(reader)?;
    Ok(ObservationTable::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Expected schema:
/// - `scientific_name`, `common_name`: Utf8 or LargeUtf8
/// - `latitude`, `longitude`: Float64, Float32, Int64 or Int32
/// - Any other columns are ignored
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<ObservationTable, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let reader = builder.build()?;

    let mut records = Vec::new();
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result?;
        append_batch(&batch, row_offset, &mut records)?;
        row_offset += batch.num_rows();
    }

    Ok(ObservationTable::from_records(records))
}

fn append_batch(
    batch: &RecordBatch,
    row_offset: usize,
    records: &mut Vec<Observation>,
) -> Result<(), LoadError> {
    let name_col = required_column(batch, "scientific_name")?;
    let common_col = required_column(batch, "common_name")?;
    let lat_col = required_column(batch, "latitude")?;
    let lon_col = required_column(batch, "longitude")?;

    for row in 0..batch.num_rows() {
        let file_row = row_offset + row + 1;
        records.push(Observation::new(
            extract_string(name_col, row, file_row, "scientific_name")?,
            extract_string(common_col, row, file_row, "common_name")?,
            extract_f64(lat_col, row, "latitude")?,
            extract_f64(lon_col, row, "longitude")?,
        ));
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

fn required_column<'b>(
    batch: &'b RecordBatch,
    name: &'static str,
) -> Result<&'b Arc<dyn Array>, LoadError> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| LoadError::MissingColumn(name))?;
    Ok(batch.column(idx))
}

fn extract_string(
    col: &Arc<dyn Array>,
    row: usize,
    file_row: usize,
    column: &'static str,
) -> Result<String, LoadError> {
    if col.is_null(row) {
        return Err(LoadError::NullValue { row: file_row, column });
    }
    if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
        Ok(s.value(row).to_string())
    } else if let Some(s) = col.as_any().downcast_ref::<LargeStringArray>() {
        Ok(s.value(row).to_string())
    } else {
        Err(LoadError::UnsupportedColumnType {
            column,
            data_type: col.data_type().clone(),
        })
    }
}

/// Null coordinates read as NaN, like a blank CSV cell.
fn extract_f64(col: &Arc<dyn Array>, row: usize, column: &'static str) -> Result<f64, LoadError> {
    let any = col.as_any();
    let value = if let Some(arr) = any.downcast_ref::<Float64Array>() {
        arr.value(row)
    } else if let Some(arr) = any.downcast_ref::<Float32Array>() {
        arr.value(row) as f64
    } else if let Some(arr) = any.downcast_ref::<Int64Array>() {
        arr.value(row) as f64
    } else if let Some(arr) = any.downcast_ref::<Int32Array>() {
        arr.value(row) as f64
    } else {
        return Err(LoadError::UnsupportedColumnType {
            column,
            data_type: col.data_type().clone(),
        });
    };
    Ok(if col.is_null(row) { f64::NAN } else { value })
}
