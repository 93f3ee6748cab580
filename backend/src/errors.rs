//! Fatal error types for the ingestion layer.
//!
//! Everything else in the pipeline degrades to a logged warning and a
//! fallback value, only these conditions stop a run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Input file does not exist: {0:?}")]
    MissingInput(PathBuf),

    #[error("Unexpected header in input at column {position}: '{name}'")]
    UnrecognizedHeader { position: usize, name: String },

    #[error("Input has no header row: {0:?}")]
    EmptyHeader(PathBuf),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("No sheets found matching filter '{filter}'. Available sheets: {available}")]
    NoMatchingSheets { filter: String, available: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited text error: {0}")]
    Csv(#[from] csv::Error),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
