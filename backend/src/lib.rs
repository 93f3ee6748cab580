pub mod errors;
pub mod types;
pub mod logger;
pub mod config;
pub mod quran_data;
pub mod ingest;
pub mod classify;
pub mod tex_utils;
pub mod ocr_parser;
pub mod quran_api;
pub mod enrich;
pub mod interlinear;
pub mod glossary;
pub mod tex_render;
pub mod document_io;

use std::path::Path;

use anyhow::Result;

use crate::types::{LessonMeta, TextbookDocument};

/// Read a CSV or spreadsheet and build the document, with the file name as the lesson source.
pub fn ingest_document(path: &Path) -> Result<TextbookDocument> {
    let rows = ingest::read_rows(path)?;

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(classify::build_document(&rows, LessonMeta::from_source(&source)))
}

/// Local time stamp recorded in documents produced from OCR scans.
pub fn processing_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}
