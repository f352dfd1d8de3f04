use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::Config;
use crate::error::NormalizeError;
use crate::models::{Observation, OutcomeLevel};

const FULL_TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// A spreadsheet cell after decoding, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(value) => Some(value.clone()),
            CellValue::Date(value) => Some(value.to_string()),
            CellValue::Time(value) => Some(value.to_string()),
            CellValue::DateTime(value) => Some(value.to_string()),
        }
    }

    fn describe(&self) -> String {
        self.as_text().unwrap_or_default()
    }
}

/// One data row of an export, keyed by column role rather than position.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based row number in the source table, header included.
    pub row: usize,
    pub student: CellValue,
    pub skill: CellValue,
    pub date: CellValue,
    pub time: CellValue,
    pub outcome: CellValue,
}

impl RawRow {
    /// Padding rows carry neither a student nor a skill, whatever else is
    /// filled in.
    pub fn is_blank(&self) -> bool {
        self.student.is_empty() && self.skill.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TimestampFormats {
    pub date_formats: Vec<String>,
    pub time_formats: Vec<String>,
}

impl TimestampFormats {
    pub fn from_config(config: &Config) -> Self {
        TimestampFormats {
            date_formats: config.date_formats.clone(),
            time_formats: config.time_formats.clone(),
        }
    }

    fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        self.date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    }

    fn parse_time(&self, value: &str) -> Option<NaiveTime> {
        self.time_formats
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
    }
}

impl Default for TimestampFormats {
    fn default() -> Self {
        TimestampFormats::from_config(&Config::default())
    }
}

enum DatePart {
    Day(NaiveDate),
    Full(NaiveDateTime),
}

/// Combines the date and time cells of one row into a timestamp.
pub fn combine_timestamp(
    row: usize,
    date: &CellValue,
    time: &CellValue,
    formats: &TimestampFormats,
) -> Result<NaiveDateTime, NormalizeError> {
    let failure = || NormalizeError::Timestamp {
        row,
        date: date.describe(),
        time: time.describe(),
    };

    let date_part = match date {
        CellValue::Date(value) => DatePart::Day(*value),
        CellValue::DateTime(value) => DatePart::Full(*value),
        CellValue::Text(value) => FULL_TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .map(DatePart::Full)
            .or_else(|| formats.parse_date(value).map(DatePart::Day))
            .ok_or_else(failure)?,
        CellValue::Time(_) | CellValue::Empty => return Err(failure()),
    };

    let time_part = match time {
        CellValue::Time(value) => Some(*value),
        CellValue::DateTime(value) => Some(value.time()),
        CellValue::Text(value) => Some(formats.parse_time(value).ok_or_else(failure)?),
        CellValue::Date(_) => return Err(failure()),
        CellValue::Empty => None,
    };

    match (date_part, time_part) {
        (DatePart::Day(day), Some(time)) => Ok(day.and_time(time)),
        (DatePart::Full(full), Some(time)) => Ok(full.date().and_time(time)),
        (DatePart::Full(full), None) => Ok(full),
        (DatePart::Day(_), None) => Err(failure()),
    }
}

pub fn normalize_row(
    raw: &RawRow,
    source: &Path,
    formats: &TimestampFormats,
) -> Result<Observation, NormalizeError> {
    let student = raw.student.as_text().ok_or(NormalizeError::MissingField {
        row: raw.row,
        field: "student",
    })?;
    let skill = raw.skill.as_text().ok_or(NormalizeError::MissingField {
        row: raw.row,
        field: "skill",
    })?;
    let timestamp = combine_timestamp(raw.row, &raw.date, &raw.time, formats)?;
    let level = OutcomeLevel::from_label(raw.outcome.as_text().as_deref());

    Ok(Observation {
        student,
        skill,
        timestamp,
        level,
        passed: level.is_pass(),
        source: source.to_path_buf(),
    })
}

/// Normalizes every row of one file. Blank padding rows are dropped; any
/// other failure rejects the whole file.
pub fn normalize_rows(
    rows: &[RawRow],
    source: &Path,
    formats: &TimestampFormats,
) -> Result<Vec<Observation>, NormalizeError> {
    rows.iter()
        .filter(|raw| !raw.is_blank())
        .map(|raw| normalize_row(raw, source, formats))
        .collect()
}
