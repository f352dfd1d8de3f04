use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use tracing::{error, info, warn};

use crate::config::{ColumnNames, Config};
use crate::error::LoadError;
use crate::models::Observation;
use crate::normalize::{normalize_rows, CellValue, RawRow, TimestampFormats};

/// Why a file contributed nothing to the combined dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadIssue {
    Missing(PathBuf),
    Unreadable { path: PathBuf, message: String },
}

impl LoadIssue {
    pub fn describe(&self) -> String {
        match self {
            LoadIssue::Missing(path) => format!("{} was not found", path.display()),
            LoadIssue::Unreadable { path, message } => {
                format!("{} could not be read: {}", path.display(), message)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub observations: Vec<Observation>,
    pub issues: Vec<LoadIssue>,
    pub files_loaded: usize,
}

/// Loads every file in order, skipping the ones that are missing or
/// unreadable. Never fails as a whole.
pub fn load_files(paths: &[PathBuf], config: &Config) -> LoadOutcome {
    let formats = TimestampFormats::from_config(config);
    let mut outcome = LoadOutcome::default();

    for path in paths {
        match load_file(path, &config.columns, &formats) {
            Ok(observations) => {
                info!(
                    file = %path.display(),
                    rows = observations.len(),
                    "loaded export"
                );
                outcome.files_loaded += 1;
                outcome.observations.extend(observations);
            }
            Err(LoadError::NotFound(path)) => {
                warn!(file = %path.display(), "export not found, skipping");
                outcome.issues.push(LoadIssue::Missing(path));
            }
            Err(err) => {
                error!(file = %path.display(), error = %err, "failed to read export, skipping");
                outcome.issues.push(LoadIssue::Unreadable {
                    path: path.clone(),
                    message: err.to_string(),
                });
            }
        }
    }

    outcome
}

pub fn load_file(
    path: &Path,
    columns: &ColumnNames,
    formats: &TimestampFormats,
) -> Result<Vec<Observation>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let table = read_table(path)?;
    let rows = raw_rows(&table, columns)?;
    Ok(normalize_rows(&rows, path, formats)?)
}

fn read_table(path: &Path) -> Result<Vec<Vec<CellValue>>, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

fn read_csv(path: &Path) -> Result<Vec<Vec<CellValue>>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut table = Vec::new();
    for result in reader.records() {
        let record = result?;
        table.push(record.iter().map(CellValue::text).collect());
    }
    Ok(table)
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<CellValue>>, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(decode_cell).collect())
        .collect())
}

fn decode_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            CellValue::text(value)
        }
        Data::Int(value) => CellValue::Text(value.to_string()),
        Data::Float(value) => CellValue::Text(value.to_string()),
        Data::Bool(value) => CellValue::Text(value.to_string()),
        Data::DateTime(value) => decode_datetime(value),
    }
}

/// Spreadsheet serials below one day hold a time of day only; whole serials
/// hold a date only.
fn decode_datetime(value: &ExcelDateTime) -> CellValue {
    let serial = value.as_f64();
    match value.as_datetime() {
        None => CellValue::Empty,
        Some(datetime) if value.is_duration() || serial < 1.0 => CellValue::Time(datetime.time()),
        Some(datetime) if serial.fract() == 0.0 => CellValue::Date(datetime.date()),
        Some(datetime) => CellValue::DateTime(datetime),
    }
}

struct ColumnIndex {
    student: usize,
    skill: usize,
    date: usize,
    time: usize,
    outcome: Option<usize>,
}

impl ColumnIndex {
    fn from_header(header: &[CellValue], columns: &ColumnNames) -> Result<Self, LoadError> {
        let names: Vec<String> = header
            .iter()
            .map(|cell| header_key(&cell.as_text().unwrap_or_default()))
            .collect();
        let find = |name: &str| names.iter().position(|candidate| *candidate == header_key(name));
        let require = |name: &str| find(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()));

        Ok(ColumnIndex {
            student: require(&columns.student)?,
            skill: require(&columns.skill)?,
            date: require(&columns.date)?,
            time: require(&columns.time)?,
            outcome: find(&columns.outcome),
        })
    }
}

fn header_key(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn cell(row: &[CellValue], position: usize) -> CellValue {
    row.get(position).cloned().unwrap_or(CellValue::Empty)
}

fn raw_rows(table: &[Vec<CellValue>], columns: &ColumnNames) -> Result<Vec<RawRow>, LoadError> {
    let (header, body) = table.split_first().ok_or(LoadError::MissingHeader)?;
    let index = ColumnIndex::from_header(header, columns)?;

    Ok(body
        .iter()
        .enumerate()
        .map(|(offset, row)| RawRow {
            row: offset + 2,
            student: cell(row, index.student),
            skill: cell(row, index.skill),
            date: cell(row, index.date),
            time: cell(row, index.time),
            outcome: index
                .outcome
                .map(|position| cell(row, position))
                .unwrap_or(CellValue::Empty),
        })
        .collect())
}
