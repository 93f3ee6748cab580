use std::fs;
use std::path::Path;

use textbook_backend::classify::build_document;
use textbook_backend::errors::IngestError;
use textbook_backend::ingest::{read_csv, read_rows, COL_KIND};
use textbook_backend::ingest_document;
use textbook_backend::types::{LessonMeta, PartOfSpeech};

const LESSON_CSV: &str = "\
Page Number,Lesson Number,Ex/Voc,Sing. / Perf.,Dual / Imperf.,Plural / Verbal N.,English Translations,Verb Form,Arabic Text,Exercise Number,Quran Chapter/Surah,Quran Verse/Ayah
10,2,Vocabulary,كَتَبَ,يَكْتُبُ,كِتَابَة,\"to write, record\",1,,,,
10,2,Vocabulary,كِتَاب,,كُتُب,a book,,,,,
10,2,Vocabulary,عَلِمَ,يَعْلَمُ,عِلْم,know,,,,,
11,2,Exercise,,,,,,ٱللَّهُ لَآ إِلَٰهَ إِلَّا هُوَ,1,2,255
11,2,Exercise,,,,,,كَلِمَة,2,2,287
11,2,Notes,,,,,,,,,
";

fn write_lesson(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("lesson2.csv");
    fs::write(&path, LESSON_CSV).unwrap();
    path
}

#[test]
fn test_read_csv_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_lesson(dir.path());

    let first = read_csv(&path).unwrap();
    let second = read_csv(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 6);
    let keys: Vec<&str> = first[0].keys().map(String::as_str).collect();
    assert_eq!(keys[1], "Lesson #");
    assert_eq!(first[5].get(COL_KIND).map(String::as_str), Some("Notes"));
}

#[test]
fn test_build_document_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_lesson(dir.path());

    let doc = ingest_document(&path).unwrap();
    assert_eq!(doc.lesson.source, "lesson2.csv");

    assert_eq!(doc.vocabulary.len(), 3);
    let write = &doc.vocabulary[0];
    assert_eq!(write.part_of_speech, PartOfSpeech::Verb);
    assert_eq!(write.english_meanings_sort_letter, "w");
    assert_eq!(write.english_meanings_sort_start_index, 3);
    assert_eq!(write.verb_form.as_deref(), Some("1"));
    assert_eq!(write.definitions.len(), 2);
    assert_eq!(write.arabic_sort_letter, "ك");

    let book = &doc.vocabulary[1];
    assert_eq!(book.part_of_speech, PartOfSpeech::Noun);
    assert_eq!(book.english_meanings_sort_letter, "a");

    // Three forms after a verb row: taken as a verb.
    assert_eq!(doc.vocabulary[2].part_of_speech, PartOfSpeech::Verb);

    assert_eq!(doc.exercises.len(), 2);
    assert_eq!(doc.exercises[0].quranic_reference, "2:255");
    assert_eq!(doc.exercises[0].validation_warning, None);
    assert_eq!(
        doc.exercises[1].validation_warning.as_deref(),
        Some("Verse 287 is invalid for chapter 2 (valid range: 1-286)")
    );
}

#[test]
fn test_rebuilding_gives_same_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_lesson(dir.path());

    let rows = read_rows(&path).unwrap();
    let a = build_document(&rows, LessonMeta::from_source("x"));
    let b = build_document(&read_rows(&path).unwrap(), LessonMeta::from_source("x"));
    assert_eq!(a, b);
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.csv");
    match read_csv(&path) {
        Err(IngestError::MissingInput(p)) => assert_eq!(p, path),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_unknown_header_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "Word,Meaning\nكتاب,book\n").unwrap();

    assert!(matches!(read_csv(&path), Err(IngestError::UnrecognizedHeader { .. })));
    assert!(ingest_document(&path).is_err());
}

#[test]
fn test_vocabulary_only_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vocab.csv");
    fs::write(
        &path,
        "Page Number,Lesson Number,Ex/Voc,Sing. / Perf.,Dual / Imperf.,Plural / Verbal N.,English Translations,Verb Form\n\
         4,1,,بَيْت,,بُيُوت,house,\n",
    )
    .unwrap();

    let doc = ingest_document(&path).unwrap();
    assert_eq!(doc.vocabulary.len(), 1);
    assert_eq!(doc.vocabulary[0].page, Some(4));
    assert_eq!(doc.vocabulary[0].arabic_forms.col3, "بُيُوت");
}
