use std::fs;
use std::path::PathBuf;

use textbook_backend::errors::IngestError;
use textbook_backend::ingest::{
    export_sheets_to_csv, filter_sheets, read_rows, read_spreadsheet, COL_ENGLISH, COL_KIND, COL_LESSON, COL_PAGE,
};
use textbook_backend::ingest_document;
use textbook_backend::types::PartOfSpeech;

/// Workbook with sheets "Lesson 1" (exercises), "Notes" and "lesson 2" (vocabulary).
fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/lessons.xlsx")
}

#[test]
fn test_reads_lesson_sheets_only() {
    let sheets = read_spreadsheet(&fixture()).unwrap();
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Lesson 1", "lesson 2"]);

    assert_eq!(sheets[0].rows.len(), 2);
    assert_eq!(sheets[1].rows.len(), 2);
    assert_eq!(sheets[0].rows[0].get(COL_KIND).map(String::as_str), Some("Exercise"));
    assert_eq!(sheets[1].rows[1].get(COL_ENGLISH).map(String::as_str), Some("house, home"));
}

#[test]
fn test_numeric_cells_as_text() {
    let sheets = read_spreadsheet(&fixture()).unwrap();

    // Stored as 21.0 and 3.0
    let first = &sheets[0].rows[0];
    assert_eq!(first.get(COL_PAGE).map(String::as_str), Some("21"));
    assert_eq!(first.get(COL_LESSON).map(String::as_str), Some("3"));

    let fractional = &sheets[1].rows[1];
    assert_eq!(fractional.get(COL_PAGE).map(String::as_str), Some("30.5"));

    // Missing dual cell
    assert_eq!(sheets[1].rows[0].get("Dual / Imperf.").map(String::as_str), Some(""));
}

#[test]
fn test_filter_by_sheet_name() {
    let sheets = read_spreadsheet(&fixture()).unwrap();

    let picked = filter_sheets(sheets.clone(), Some("lesson")).unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].name, "lesson 2");

    let err = filter_sheets(sheets, Some("Appendix")).unwrap_err();
    assert!(matches!(err, IngestError::NoMatchingSheets { .. }));
    assert_eq!(
        err.to_string(),
        "No sheets found matching filter 'Appendix'. Available sheets: Lesson 1, lesson 2"
    );
}

#[test]
fn test_export_all_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("lessons.csv");

    let names = export_sheets_to_csv(&fixture(), &out, None).unwrap();
    assert_eq!(names, vec!["Lesson 1".to_string(), "lesson 2".to_string()]);

    let expected = "\
=== Sheet: Lesson 1 ===
Page Number,Lesson #,Exercise #,Arabic Text,Sura,Verse,Ex/Voc
21,3,1,قُلْ هُوَ ٱللَّهُ أَحَدٌ,112,1,Exercise
22,3,2,ٱللَّهُ لَا إِلَٰهَ إِلَّا هُوَ,2,255,Exercise

=== Sheet: lesson 2 ===
Page Number,Lesson #,Ex/Voc,Sing. / Perf.,Dual / Imperf.,Plural / Verbal N.,English
30,4,Vocabulary,كِتَابٌ,,كُتُبٌ,book
30.5,4,Vocabulary,بَيْتٌ,,بُيُوتٌ,\"house, home\"

";
    assert_eq!(fs::read_to_string(&out).unwrap(), expected);
}

#[test]
fn test_export_with_unmatched_filter_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("none.csv");

    assert!(export_sheets_to_csv(&fixture(), &out, Some("Appendix")).is_err());
    assert!(!out.exists());
}

#[test]
fn test_spreadsheet_document() {
    let rows = read_rows(&fixture()).unwrap();
    assert_eq!(rows.len(), 4);

    let doc = ingest_document(&fixture()).unwrap();
    assert_eq!(doc.lesson.source, "lessons.xlsx");
    assert_eq!(doc.exercises.len(), 2);
    assert_eq!(doc.exercises[1].quranic_reference, "2:255");
    assert_eq!(doc.vocabulary.len(), 2);
    assert_eq!(doc.vocabulary[0].part_of_speech, PartOfSpeech::Noun);
    assert_eq!(doc.vocabulary[0].chapter, 4);
}
