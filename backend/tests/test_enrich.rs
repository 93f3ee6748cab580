use std::cell::RefCell;
use std::collections::BTreeSet;

use anyhow::{anyhow, Result};

use textbook_backend::classify::new_vocabulary_entry;
use textbook_backend::config::EnrichOptions;
use textbook_backend::enrich::{collect_verse_keys, enrich_document};
use textbook_backend::quran_api::{TranslationText, VerseData, VerseFetcher, VerseResponse};
use textbook_backend::quran_data::VerseKey;
use textbook_backend::types::{
    ArabicForms, ExerciseEntry, LessonMeta, PartOfSpeech, TextType, TextbookDocument, VocabularyEntry,
};

/// Records every call, fails for the keys in `failing`.
#[derive(Default)]
struct CountingFetcher {
    token_calls: RefCell<usize>,
    fetched: RefCell<Vec<VerseKey>>,
    failing: BTreeSet<VerseKey>,
    token_fails: bool,
}

impl VerseFetcher for CountingFetcher {
    fn access_token(&self) -> Result<String> {
        *self.token_calls.borrow_mut() += 1;
        if self.token_fails {
            return Err(anyhow!("401 Unauthorized"));
        }
        Ok("token".to_string())
    }

    fn fetch_verse(&self, token: &str, key: VerseKey) -> Result<VerseResponse> {
        assert_eq!(token, "token");
        self.fetched.borrow_mut().push(key);
        if self.failing.contains(&key) {
            return Err(anyhow!("timeout"));
        }
        Ok(VerseResponse {
            verse: VerseData {
                text_indopak: None,
                text_uthmani: Some(format!("uthmani {}", key)),
                text_imlaei: Some(format!("imlaei {}", key)),
                translations: vec![TranslationText {
                    resource_id: 19,
                    text: format!("pickthall {}", key),
                }],
            },
        })
    }
}

fn vocab_at(surah: u32, ayah: u32) -> VocabularyEntry {
    let mut entry = new_vocabulary_entry(1, PartOfSpeech::Noun, ArabicForms::new("إِلَٰه", "", ""), "god", "test");
    entry.surah = surah;
    entry.ayah = ayah;
    entry
}

fn exercise_at(number: u32, surah: u32, ayah: u32) -> ExerciseEntry {
    ExerciseEntry {
        chapter: 1,
        exercise_number: number,
        arabic_text: "نص".to_string(),
        surah,
        ayah,
        quranic_reference: format!("{}:{}", surah, ayah),
        validation_warning: None,
        page: None,
        quranic_sources: Vec::new(),
        context_lines: Vec::new(),
    }
}

fn no_context() -> EnrichOptions {
    EnrichOptions {
        context_before: 0,
        context_after: 0,
        ..Default::default()
    }
}

#[test]
fn test_shared_verse_fetched_once() {
    let mut doc = TextbookDocument {
        lesson: LessonMeta::from_source("test"),
        vocabulary: vec![vocab_at(2, 255), vocab_at(2, 255), vocab_at(2, 255)],
        exercises: vec![exercise_at(1, 2, 255), exercise_at(2, 2, 255)],
    };
    let fetcher = CountingFetcher::default();

    let report = enrich_document(&mut doc, &fetcher, &no_context()).unwrap();

    assert_eq!(*fetcher.token_calls.borrow(), 1);
    assert_eq!(*fetcher.fetched.borrow(), vec![VerseKey::new(2, 255)]);
    assert_eq!(report.unique_keys, 1);
    assert_eq!(report.fetched, 1);

    for entry in &doc.vocabulary {
        assert_eq!(entry.quranic_sources.len(), 3);
    }
    for ex in &doc.exercises {
        assert_eq!(ex.quranic_sources.len(), 3);
        assert_eq!(ex.quranic_sources[2].translation_resource_name.as_deref(), Some("M. Pickthall"));
    }
}

#[test]
fn test_context_lines_cross_surah_boundary() {
    let mut doc = TextbookDocument {
        exercises: vec![exercise_at(1, 2, 286)],
        ..Default::default()
    };
    let fetcher = CountingFetcher::default();

    enrich_document(&mut doc, &fetcher, &EnrichOptions::default()).unwrap();

    let lines: Vec<(u32, u32)> = doc.exercises[0].context_lines.iter().map(|l| (l.surah, l.ayah)).collect();
    assert_eq!(lines, vec![(2, 285), (2, 286), (3, 1)]);
    assert!(doc.exercises[0].context_lines.iter().all(|l| !l.quranic_sources.is_empty()));

    let mut fetched = fetcher.fetched.borrow().clone();
    fetched.sort();
    assert_eq!(fetched, vec![VerseKey::new(2, 285), VerseKey::new(2, 286), VerseKey::new(3, 1)]);
}

#[test]
fn test_failed_fetch_leaves_entry_without_sources() {
    let mut doc = TextbookDocument {
        vocabulary: vec![vocab_at(1, 1), vocab_at(112, 1)],
        ..Default::default()
    };
    let fetcher = CountingFetcher {
        failing: BTreeSet::from([VerseKey::new(1, 1)]),
        ..Default::default()
    };

    let report = enrich_document(&mut doc, &fetcher, &no_context()).unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.fetched, 1);
    assert!(doc.vocabulary[0].quranic_sources.is_empty());
    assert_eq!(doc.vocabulary[1].quranic_sources[0].text_type, TextType::Uthmani);
}

#[test]
fn test_token_failure_aborts() {
    let mut doc = TextbookDocument {
        vocabulary: vec![vocab_at(1, 1)],
        ..Default::default()
    };
    let fetcher = CountingFetcher {
        token_fails: true,
        ..Default::default()
    };

    assert!(enrich_document(&mut doc, &fetcher, &no_context()).is_err());
    assert!(fetcher.fetched.borrow().is_empty());
}

#[test]
fn test_no_references_needs_no_token() {
    let mut doc = TextbookDocument {
        vocabulary: vec![vocab_at(0, 0)],
        ..Default::default()
    };
    let fetcher = CountingFetcher::default();

    let report = enrich_document(&mut doc, &fetcher, &no_context()).unwrap();
    assert_eq!(report.unique_keys, 0);
    assert_eq!(*fetcher.token_calls.borrow(), 0);
}

#[test]
fn test_enriching_twice_appends_unless_deduped() {
    let mut doc = TextbookDocument {
        vocabulary: vec![vocab_at(1, 1)],
        ..Default::default()
    };
    let fetcher = CountingFetcher::default();

    enrich_document(&mut doc, &fetcher, &no_context()).unwrap();
    enrich_document(&mut doc, &fetcher, &no_context()).unwrap();
    assert_eq!(doc.vocabulary[0].quranic_sources.len(), 6);

    let dedupe = EnrichOptions {
        dedupe_sources: true,
        ..no_context()
    };
    let report = enrich_document(&mut doc, &fetcher, &dedupe).unwrap();
    assert_eq!(report.attached, 0);
    assert_eq!(doc.vocabulary[0].quranic_sources.len(), 6);
}

#[test]
fn test_collect_keys_does_not_repeat_context_lines() {
    let mut doc = TextbookDocument {
        exercises: vec![exercise_at(1, 1, 1)],
        ..Default::default()
    };
    let options = EnrichOptions::default();

    let keys = collect_verse_keys(&mut doc, &options);
    collect_verse_keys(&mut doc, &options);

    assert_eq!(keys.len(), 2);
    assert_eq!(doc.exercises[0].context_lines.len(), 2);
}
