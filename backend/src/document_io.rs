//! Reading and writing documents and side files.
//!
//! Every output goes through a temporary file in the target directory which
//! is renamed into place once complete, so a failed run never leaves a
//! half-written file behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::errors::IngestError;
use crate::ocr_parser::OcrOutput;
use crate::types::TextbookDocument;

pub fn read_json(path: &Path) -> Result<TextbookDocument> {
    if !path.exists() {
        return Err(IngestError::MissingInput(path.to_path_buf()).into());
    }
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = serde_json::from_str(&text).with_context(|| format!("Invalid document JSON in {}", path.display()))?;
    Ok(doc)
}

/// Write `bytes` to `path` through a temporary file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_text_atomic(path: &Path, text: &str) -> Result<()> {
    write_atomic(path, text.as_bytes())
}

/// Pretty-printed UTF-8 JSON with a trailing newline. Non-ASCII text is written as is.
pub fn document_to_json(doc: &TextbookDocument) -> Result<String> {
    let mut json = serde_json::to_string_pretty(doc)?;
    json.push('\n');
    Ok(json)
}

pub fn write_json(path: &Path, doc: &TextbookDocument) -> Result<()> {
    write_text_atomic(path, &document_to_json(doc)?)
}

fn csv_bytes<F>(header: &[&str], fill: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> csv::Result<()>,
{
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(header)?;
    fill(&mut wtr)?;
    wtr.into_inner().map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e))
}

fn opt_to_string(n: Option<u32>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}

/// `Arabic Word,Count,Pages`, one row per distinct word.
pub fn word_frequencies_csv(output: &OcrOutput) -> Result<Vec<u8>> {
    csv_bytes(&["Arabic Word", "Count", "Pages"], |wtr| {
        for (word, stats) in &output.word_frequencies {
            let pages: Vec<String> = stats.pages.iter().map(|p| p.to_string()).collect();
            let count = stats.count.to_string();
            let pages = pages.join(", ");
            wtr.write_record([word.as_str(), count.as_str(), pages.as_str()])?;
        }
        Ok(())
    })
}

pub fn ocr_vocabulary_csv(output: &OcrOutput) -> Result<Vec<u8>> {
    let header = [
        "Page Number",
        "Lesson Number",
        "Column 1",
        "Column 2",
        "Column 3",
        "English Translations",
        "Verb Form",
        "Part of Speech",
    ];
    csv_bytes(&header, |wtr| {
        for line in &output.vocabulary {
            let page = line.page.to_string();
            let chapter = line.chapter.to_string();
            wtr.write_record([
                page.as_str(),
                chapter.as_str(),
                line.forms.col1.as_str(),
                line.forms.col2.as_str(),
                line.forms.col3.as_str(),
                line.english.as_str(),
                line.verb_form.as_str(),
                line.part_of_speech.as_str(),
            ])?;
        }
        Ok(())
    })
}

/// Exercises in the exercise-only layout the CSV reader accepts.
pub fn ocr_exercises_csv(output: &OcrOutput) -> Result<Vec<u8>> {
    let header = [
        "Page Number",
        "Lesson Number",
        "Exercise Number",
        "Arabic Text",
        "Quran Chapter/Surah",
        "Quran Verse/Ayah",
        "Warning",
    ];
    csv_bytes(&header, |wtr| {
        for ex in &output.exercises {
            let fields = [
                opt_to_string(ex.page),
                ex.chapter.to_string(),
                ex.exercise_number.to_string(),
                ex.arabic_text.clone(),
                ex.surah.to_string(),
                ex.ayah.to_string(),
                ex.validation_warning.clone().unwrap_or_default(),
            ];
            wtr.write_record(&fields)?;
        }
        Ok(())
    })
}

/// Write the three OCR side files next to `prefix`.
pub fn write_ocr_csvs(output: &OcrOutput, prefix: &str) -> Result<()> {
    write_atomic(Path::new(&format!("{}-arabic-words.csv", prefix)), &word_frequencies_csv(output)?)?;
    write_atomic(Path::new(&format!("{}-vocabulary.csv", prefix)), &ocr_vocabulary_csv(output)?)?;
    write_atomic(Path::new(&format!("{}-exercises.csv", prefix)), &ocr_exercises_csv(output)?)?;
    Ok(())
}
