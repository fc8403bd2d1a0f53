//! CSV dataset source.
//!
//! Expected columns (header row required, extra columns ignored):
//! `school_name` (or `name`), `latitude` (or `lat`), `longitude`
//! (or `lon` / `lng`). Rows that cannot become a valid [`GeoPoint`] are
//! skipped and reported, never passed on to the index.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use geomesh_core::GeoPoint;
use serde::Serialize;

use crate::error::{DatasetError, IndexError};
use crate::index::PointIndex;

const NAME_COLUMNS: &[&str] = &["school_name", "name"];
const LATITUDE_COLUMNS: &[&str] = &["latitude", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["longitude", "lon", "lng"];

/// A row rejected during loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the source file (the header is line 1).
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    pub points: Vec<GeoPoint>,
    pub skipped: Vec<SkippedRow>,
}

impl LoadedDataset {
    /// Builds a [`PointIndex`] from the accepted rows.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::EmptyDataset`] when no row survived loading.
    pub fn into_index(self) -> Result<PointIndex, IndexError> {
        PointIndex::build(self.points)
    }
}

/// Loads a dataset from a CSV file on disk.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file cannot be opened, and
/// the errors of [`read_dataset`] otherwise.
pub fn load_dataset(path: &Path) -> Result<LoadedDataset, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = read_dataset(file)?;

    tracing::info!(
        path = %path.display(),
        accepted = dataset.points.len(),
        skipped = dataset.skipped.len(),
        "loaded dataset"
    );

    Ok(dataset)
}

/// Reads a dataset from any CSV source.
///
/// # Errors
///
/// - [`DatasetError::Csv`] if the header row cannot be read.
/// - [`DatasetError::MissingColumn`] if a required column is absent.
pub fn read_dataset<R: Read>(reader: R) -> Result<LoadedDataset, DatasetError> {
    let mut csv = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    let name_col = find_column(&headers, NAME_COLUMNS).ok_or(DatasetError::MissingColumn("name"))?;
    let lat_col =
        find_column(&headers, LATITUDE_COLUMNS).ok_or(DatasetError::MissingColumn("latitude"))?;
    let lon_col =
        find_column(&headers, LONGITUDE_COLUMNS).ok_or(DatasetError::MissingColumn("longitude"))?;

    let mut dataset = LoadedDataset::default();
    let mut record = StringRecord::new();

    loop {
        match csv.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let line = record.position().map_or(0, csv::Position::line);
                match parse_row(&record, name_col, lat_col, lon_col) {
                    Ok(point) => dataset.points.push(point),
                    Err(reason) => skip(&mut dataset, line, reason),
                }
            }
            Err(e) => {
                let line = e.position().map_or(0, csv::Position::line);
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    return Err(DatasetError::Csv(e));
                }
                skip(&mut dataset, line, format!("unreadable row: {e}"));
            }
        }
    }

    Ok(dataset)
}

fn skip(dataset: &mut LoadedDataset, line: u64, reason: String) {
    tracing::warn!(line, reason = %reason, "skipping dataset row");
    dataset.skipped.push(SkippedRow { line, reason });
}

fn find_column(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| candidates.iter().any(|c| h.eq_ignore_ascii_case(c)))
}

fn parse_row(
    record: &StringRecord,
    name_col: usize,
    lat_col: usize,
    lon_col: usize,
) -> Result<GeoPoint, String> {
    let name = record
        .get(name_col)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing name".to_string())?;
    let latitude = parse_coordinate(record.get(lat_col), "latitude")?;
    let longitude = parse_coordinate(record.get(lon_col), "longitude")?;

    GeoPoint::new(name, latitude, longitude).map_err(|e| e.to_string())
}

fn parse_coordinate(raw: Option<&str>, field: &str) -> Result<f64, String> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing {field}"))?;
    raw.parse::<f64>()
        .map_err(|_| format!("non-numeric {field} '{raw}'"))
}
