use std::fs;

use serde_json::json;

use textbook_backend::classify::new_vocabulary_entry;
use textbook_backend::document_io::{document_to_json, read_json, write_json};
use textbook_backend::types::{
    ArabicForms, ContextLine, ExerciseEntry, LessonMeta, PartOfSpeech, TextType, TextbookDocument, VerseSource,
};

fn sample_document() -> TextbookDocument {
    let mut lesson = LessonMeta::from_source("lesson3.ods");
    lesson.name = Some("Lesson Three".to_string());
    lesson.extra.insert("editor".to_string(), json!({"initials": "ab", "pass": 2}));

    let mut verb = new_vocabulary_entry(
        3,
        PartOfSpeech::Verb,
        ArabicForms::new("قَالَ", "يَقُولُ", "قَوْل"),
        "to say, speak",
        "textbook_jones",
    );
    verb.verb_form = Some("1".to_string());
    verb.page = Some(41);

    let source = VerseSource {
        source_name: "quran.com".to_string(),
        source_url: "https://quran.com/112?startingVerse=1".to_string(),
        text_type: TextType::Translation,
        language: "english".to_string(),
        text: "Say: He is Allah, the One!".to_string(),
        translation_resource_id: Some(19),
        translation_resource_name: Some("M. Pickthall".to_string()),
    };

    let exercise = ExerciseEntry {
        chapter: 3,
        exercise_number: 4,
        arabic_text: "قُلْ هُوَ ٱللَّهُ أَحَدٌ".to_string(),
        surah: 112,
        ayah: 1,
        quranic_reference: "112:1".to_string(),
        validation_warning: None,
        page: Some(42),
        quranic_sources: vec![source.clone()],
        context_lines: vec![
            ContextLine {
                surah: 111,
                ayah: 5,
                quranic_sources: Vec::new(),
            },
            ContextLine {
                surah: 112,
                ayah: 1,
                quranic_sources: vec![source],
            },
        ],
    };

    TextbookDocument {
        lesson,
        vocabulary: vec![verb],
        exercises: vec![exercise],
    }
}

#[test]
fn test_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    let doc = sample_document();

    write_json(&path, &doc).unwrap();
    let back = read_json(&path).unwrap();
    assert_eq!(back, doc);

    // Writing again gives the same bytes.
    let first = fs::read_to_string(&path).unwrap();
    write_json(&path, &back).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn test_json_shape() {
    let json = document_to_json(&sample_document()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["lesson"]["source"], "lesson3.ods");
    assert_eq!(value["lesson"]["editor"]["pass"], 2);
    assert_eq!(value["vocabulary"][0]["part_of_speech"], "verb");
    assert_eq!(value["exercises"][0]["quranic_sources"][0]["text_type"], "translation");
    assert!(json.contains("قُلْ هُوَ"));
}

#[test]
fn test_reads_minimal_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("min.json");
    fs::write(&path, r#"{"lesson": {"source": "hand written"}}"#).unwrap();

    let doc = read_json(&path).unwrap();
    assert_eq!(doc.lesson.source, "hand written");
    assert!(doc.vocabulary.is_empty());
    assert!(doc.exercises.is_empty());
}

#[test]
fn test_invalid_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(read_json(&path).is_err());
}

#[test]
fn test_extra_lesson_keys_keep_their_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ordered.json");
    fs::write(
        &path,
        r#"{"lesson": {"source": "s", "zeta": 1, "alpha": "a", "middle": true}, "vocabulary": [], "exercises": []}"#,
    )
    .unwrap();

    let doc = read_json(&path).unwrap();
    let keys: Vec<&str> = doc.lesson.extra.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "middle"]);

    let json = document_to_json(&doc).unwrap();
    let zeta = json.find("\"zeta\"").unwrap();
    let alpha = json.find("\"alpha\"").unwrap();
    let middle = json.find("\"middle\"").unwrap();
    assert!(zeta < alpha && alpha < middle);
}
