//! Reading tabular textbook data into ordered rows.
//!
//! Delimited text files carry one of three known header layouts. Spreadsheets
//! (ODS, XLSX) carry one sheet per lesson. Both end up as [`Row`] maps with
//! canonical column names.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use indexmap::{IndexMap, IndexSet};
use lazy_static::lazy_static;

use crate::errors::{IngestError, IngestResult};
use crate::logger::{debug, info, warn};

/// Column name to cell value, in source column order.
pub type Row = IndexMap<String, String>;

pub const COL_PAGE: &str = "Page Number";
pub const COL_LESSON: &str = "Lesson #";
pub const COL_KIND: &str = "Ex/Voc";
pub const COL_SING_PERF: &str = "Sing. / Perf.";
pub const COL_DUAL_IMPERF: &str = "Dual / Imperf.";
pub const COL_PLURAL_VN: &str = "Plural / Verbal N.";
pub const COL_ENGLISH: &str = "English";
pub const COL_VERB_FORM: &str = "Verb Form";
pub const COL_EXERCISE: &str = "Exercise #";
pub const COL_ARABIC_TEXT: &str = "Arabic Text";
pub const COL_SURA: &str = "Sura";
pub const COL_VERSE: &str = "Verse";
pub const COL_WARNING: &str = "Warning";

pub const KIND_EXERCISE: &str = "Exercise";
pub const KIND_VOCABULARY: &str = "Vocabulary";

/// Sheets whose trimmed, lowercased name starts with this are read.
pub const SHEET_KEYWORD: &str = "lesson";

lazy_static! {
    static ref HEADER_RENAMES: HashMap<&'static str, &'static str> = {
        let mut map = HashMap::new();
        map.insert("Page Number", COL_PAGE);
        map.insert("Lesson Number", COL_LESSON);
        map.insert("English Translations", COL_ENGLISH);
        map.insert("Exercise Number", COL_EXERCISE);
        map.insert("Quran Chapter/Surah", COL_SURA);
        map.insert("Quran Verse/Ayah", COL_VERSE);
        map
    };
}

/// Canonical column names a source file may carry, `Warning` coming from OCR exports.
const KNOWN_COLUMNS: [&str; 13] = [
    COL_PAGE,
    COL_LESSON,
    COL_KIND,
    COL_SING_PERF,
    COL_DUAL_IMPERF,
    COL_PLURAL_VN,
    COL_ENGLISH,
    COL_VERB_FORM,
    COL_EXERCISE,
    COL_ARABIC_TEXT,
    COL_SURA,
    COL_VERSE,
    COL_WARNING,
];

/// Canonical name for a source header. Unknown names pass through trimmed.
pub fn canonical_header(name: &str) -> String {
    let name = name.trim();
    HEADER_RENAMES.get(name).copied().unwrap_or(name).to_string()
}

/// The three header layouts a delimited source file can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Vocabulary and exercise rows mixed, distinguished by an `Ex/Voc` column.
    Combined,
    VocabularyOnly,
    ExerciseOnly,
}

impl HeaderLayout {
    /// Inspect the raw (not yet renamed) headers at their fixed positions.
    pub fn detect(headers: &[String]) -> Option<Self> {
        let at = |i: usize| headers.get(i).map(|s| s.trim());

        if at(3) == Some(COL_SING_PERF) {
            if at(9) == Some("Exercise Number") {
                Some(HeaderLayout::Combined)
            } else {
                Some(HeaderLayout::VocabularyOnly)
            }
        } else if at(2) == Some("Exercise Number") {
            Some(HeaderLayout::ExerciseOnly)
        } else {
            None
        }
    }

    /// The first header that is no known column name. When every name is known
    /// but out of place, the layout key column (Sing. / Perf.) is reported.
    pub fn unrecognized_column(headers: &[String]) -> (usize, String) {
        headers
            .iter()
            .enumerate()
            .find(|(_, h)| !KNOWN_COLUMNS.contains(&canonical_header(h).as_str()))
            .map(|(i, h)| (i, h.trim().to_string()))
            .unwrap_or_else(|| (3, headers.get(3).map(|h| h.trim().to_string()).unwrap_or_default()))
    }

    /// Row kind implied by the layout, for layouts without an `Ex/Voc` column.
    pub fn implied_kind(&self) -> Option<&'static str> {
        match self {
            HeaderLayout::Combined => None,
            HeaderLayout::VocabularyOnly => Some(KIND_VOCABULARY),
            HeaderLayout::ExerciseOnly => Some(KIND_EXERCISE),
        }
    }
}

fn is_blank_row(row: &Row) -> bool {
    row.values().all(|v| v.trim().is_empty())
}

/// Read a delimited file with a header row.
pub fn read_csv(path: &Path) -> IngestResult<Vec<Row>> {
    if !path.exists() {
        return Err(IngestError::MissingInput(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let rows = read_csv_from_reader(file, path)?;
    if rows.is_empty() {
        debug(&format!("No data rows in {:?}", path));
    }
    Ok(rows)
}

/// Read delimited text from any reader. `origin` only names the input in errors.
pub fn read_csv_from_reader<R: Read>(reader: R, origin: &Path) -> IngestResult<Vec<Row>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let raw_headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if raw_headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestError::EmptyHeader(origin.to_path_buf()));
    }

    let layout = HeaderLayout::detect(&raw_headers).ok_or_else(|| {
        let (position, name) = HeaderLayout::unrecognized_column(&raw_headers);
        IngestError::UnrecognizedHeader { position, name }
    })?;
    debug(&format!("Detected header layout: {:?}", layout));

    let headers: Vec<String> = raw_headers.iter().map(|h| canonical_header(h)).collect();

    let mut rows = Vec::new();
    for (n, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(n as u64 + 2);
                warn(&format!("Skipping unreadable row at line {} in {:?}: {}", line, origin, e));
                continue;
            }
        };
        let mut row = Row::new();
        for (i, h) in headers.iter().enumerate() {
            row.insert(h.clone(), record.get(i).unwrap_or("").to_string());
        }

        if is_blank_row(&row) {
            debug(&format!("Skipping blank row {}", n + 2));
            continue;
        }

        if let Some(kind) = layout.implied_kind() {
            row.insert(COL_KIND.to_string(), kind.to_string());
        }
        rows.push(row);
    }

    Ok(rows)
}

/// One lesson sheet of a spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Render a spreadsheet cell as text. Whole-number floats lose their `.0`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn is_lesson_sheet(name: &str) -> bool {
    name.trim().to_lowercase().starts_with(SHEET_KEYWORD)
}

/// Read every lesson sheet of an ODS/XLSX/XLS file, in workbook order.
///
/// The first row of each sheet is its header. Sheets whose headers match one
/// of the single-kind layouts get the implied `Ex/Voc` value.
pub fn read_spreadsheet(path: &Path) -> IngestResult<Vec<Sheet>> {
    if !path.exists() {
        return Err(IngestError::MissingInput(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| IngestError::Spreadsheet(e.to_string()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        if !is_lesson_sheet(&name) {
            debug(&format!("Skipping sheet: {}", name));
            continue;
        }

        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| IngestError::Spreadsheet(format!("{}: {}", name, e)))?;

        let mut cells = range.rows();
        let raw_headers: Vec<String> = match cells.next() {
            Some(header_row) => header_row.iter().map(cell_to_string).collect(),
            None => {
                debug(&format!("Sheet has no header row: {}", name));
                sheets.push(Sheet { name, rows: Vec::new() });
                continue;
            }
        };

        let layout = HeaderLayout::detect(&raw_headers);
        let headers: Vec<String> = raw_headers.iter().map(|h| canonical_header(h)).collect();

        let mut rows = Vec::new();
        for data_row in cells {
            let mut row = Row::new();
            for (i, h) in headers.iter().enumerate() {
                if h.is_empty() {
                    continue;
                }
                let value = data_row.get(i).map(cell_to_string).unwrap_or_default();
                row.insert(h.clone(), value);
            }
            if is_blank_row(&row) {
                continue;
            }
            if let Some(kind) = layout.and_then(|l| l.implied_kind()) {
                row.insert(COL_KIND.to_string(), kind.to_string());
            }
            rows.push(row);
        }

        info(&format!("Read sheet '{}': {} rows", name, rows.len()));
        sheets.push(Sheet { name, rows });
    }

    Ok(sheets)
}

pub fn is_spreadsheet_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref(),
        Some("ods") | Some("xlsx") | Some("xls") | Some("xlsm")
    )
}

/// Read rows from either a spreadsheet (all lesson sheets concatenated) or a delimited file.
pub fn read_rows(path: &Path) -> IngestResult<Vec<Row>> {
    if is_spreadsheet_path(path) {
        let sheets = read_spreadsheet(path)?;
        Ok(sheets.into_iter().flat_map(|s| s.rows).collect())
    } else {
        read_csv(path)
    }
}

/// Select sheets whose name contains `filter`. No filter selects all.
pub fn filter_sheets(sheets: Vec<Sheet>, filter: Option<&str>) -> IngestResult<Vec<Sheet>> {
    let filter = match filter {
        Some(f) if !f.is_empty() => f,
        _ => return Ok(sheets),
    };

    let available = sheets.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ");
    let selected: Vec<Sheet> = sheets.into_iter().filter(|s| s.name.contains(filter)).collect();

    if selected.is_empty() {
        return Err(IngestError::NoMatchingSheets {
            filter: filter.to_string(),
            available,
        });
    }
    Ok(selected)
}

/// Write sheets as one delimited stream.
///
/// Each sheet becomes a `=== Sheet: <name> ===` marker row, a header row with
/// the union of the sheet's columns in discovery order, its data rows and a
/// blank separator row.
pub fn write_sheets_csv<W: Write>(sheets: &[Sheet], mut writer: W) -> IngestResult<()> {
    for sheet in sheets {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(&mut writer);
        wtr.write_record([format!("=== Sheet: {} ===", sheet.name)])?;

        if !sheet.rows.is_empty() {
            let mut headers: IndexSet<&str> = IndexSet::new();
            for row in &sheet.rows {
                for key in row.keys() {
                    headers.insert(key.as_str());
                }
            }

            wtr.write_record(headers.iter())?;
            for row in &sheet.rows {
                wtr.write_record(headers.iter().map(|h| row.get(*h).map(|v| v.as_str()).unwrap_or("")))?;
            }
        }

        wtr.flush()?;
        drop(wtr);

        // Blank separator line between sheets.
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}

/// Export the lesson sheets of a spreadsheet to a delimited file. Returns the sheet names written.
pub fn export_sheets_to_csv(input: &Path, output: &Path, filter: Option<&str>) -> IngestResult<Vec<String>> {
    let sheets = filter_sheets(read_spreadsheet(input)?, filter)?;
    let names: Vec<String> = sheets.iter().map(|s| s.name.clone()).collect();

    info(&format!("Exporting {} sheet(s): {}", names.len(), names.join(", ")));

    let file = File::create(output)?;
    write_sheets_csv(&sheets, file)?;

    Ok(names)
}
