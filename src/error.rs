use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported file extension: {0}")]
    UnsupportedFormat(String),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    #[error("table has no header row")]
    MissingHeader,

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("row {row}: missing {field}")]
    MissingField { row: usize, field: &'static str },

    #[error("row {row}: cannot parse timestamp from date '{date}' and time '{time}'")]
    Timestamp {
        row: usize,
        date: String,
        time: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
