//! Turning ingested rows into vocabulary and exercise entries.
//!
//! The source tables don't mark part of speech, so it is guessed from the
//! English meaning. The same heuristic gives the alphabetization keys used by
//! the glossaries.

use lazy_static::lazy_static;
use regex::Regex;

use crate::ingest::{
    Row, COL_ARABIC_TEXT, COL_DUAL_IMPERF, COL_ENGLISH, COL_EXERCISE, COL_KIND, COL_LESSON, COL_PAGE,
    COL_PLURAL_VN, COL_SING_PERF, COL_SURA, COL_VERB_FORM, COL_VERSE,
};
use crate::logger::{debug, error, warn};
use crate::quran_data::validate_reference;
use crate::types::{
    ArabicForms, Definition, ExerciseEntry, ExerciseRow, LessonMeta, PartOfSpeech, SourceRow, TextbookDocument,
    VocabularyEntry, VocabularyRow, SOURCE_TEXTBOOK,
};

lazy_static! {
    /// "to" followed by whitespace and a word character. `to (motion)` doesn't match.
    static ref VERB_RE: Regex = Regex::new(r"^to\s+(\w)").unwrap();
}

/// Exercise id used in lesson 3 for an unnumbered list item.
const SPECIAL_EXERCISE_ID: &str = "B";
const SPECIAL_EXERCISE_CHAPTER: u32 = 3;
const SPECIAL_EXERCISE_NUMBER: u32 = 21;

/// Strip a leading `(...)` or `[...]` qualifier, e.g. `(+ bi-) to see`.
///
/// An unclosed qualifier leaves the text unchanged.
pub fn remove_leading_qualifier(text: &str) -> &str {
    let close = if text.starts_with('(') {
        ')'
    } else if text.starts_with('[') {
        ']'
    } else {
        return text;
    };

    match text.find(close) {
        Some(idx) => text[idx + close.len_utf8()..].trim(),
        None => text,
    }
}

/// Lowercased, qualifier-stripped text that sort indices refer to.
pub fn english_sort_base(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    remove_leading_qualifier(&lower).to_string()
}

/// The part of `text` a glossary sorts on: the sort base with the first
/// `start_index` characters skipped.
pub fn english_sort_text(text: &str, start_index: usize) -> String {
    english_sort_base(text).chars().skip(start_index).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnglishSortKey {
    pub letter: String,
    /// Character index into [`english_sort_base`].
    pub start_index: usize,
    pub part_of_speech: PartOfSpeech,
}

/// Guess part of speech and sort key from an English meaning.
///
/// `to <word>` is a verb sorted from `<word>`, anything else is a noun sorted
/// from its first character. Leading articles are not skipped.
///
/// With a `hint` of verb, a noun-looking string stays a verb (the second
/// meaning of `to co-operate, help one another`). Returns `None` for text
/// with nothing left to sort on.
pub fn guess_english_sort_key(text: &str, hint: Option<PartOfSpeech>) -> Option<EnglishSortKey> {
    let base = english_sort_base(text);
    if base.is_empty() {
        return None;
    }

    let (start_index, guessed) = match VERB_RE.captures(&base).and_then(|c| c.get(1)) {
        Some(m) => (base[..m.start()].chars().count(), PartOfSpeech::Verb),
        None => (0, PartOfSpeech::Noun),
    };

    let letter = base.chars().nth(start_index)?.to_string();

    let part_of_speech = match (hint, guessed) {
        (Some(PartOfSpeech::Verb), PartOfSpeech::Noun) => PartOfSpeech::Verb,
        (Some(PartOfSpeech::Noun), PartOfSpeech::Verb) => {
            warn(&format!("Guessed noun, but string looks like a verb: {}", text));
            guessed
        }
        _ => guessed,
    };

    Some(EnglishSortKey {
        letter,
        start_index,
        part_of_speech,
    })
}

/// First character of the first non-empty Arabic form.
pub fn guess_arabic_sort_key(forms: &ArabicForms) -> (String, usize) {
    forms
        .first_non_empty()
        .and_then(|w| w.chars().next())
        .map(|c| (c.to_string(), 0))
        .unwrap_or_default()
}

/// Split comma-separated meanings into definitions, each with its own key.
pub fn split_definitions(english: &str, part_of_speech: PartOfSpeech) -> Vec<Definition> {
    english
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let key = guess_english_sort_key(s, Some(part_of_speech));
            Definition {
                text: s.to_string(),
                sort_letter: key.as_ref().map(|k| k.letter.clone()).unwrap_or_default(),
                sort_start_index: key.map(|k| k.start_index).unwrap_or(0),
            }
        })
        .collect()
}

/// Build an entry with all sort keys filled in. The caller has already decided the part of speech.
pub fn new_vocabulary_entry(
    chapter: u32,
    part_of_speech: PartOfSpeech,
    forms: ArabicForms,
    english_meanings: &str,
    source_name: &str,
) -> VocabularyEntry {
    let english_meanings = english_meanings.trim();
    let (arabic_sort_letter, arabic_sort_start_index) = guess_arabic_sort_key(&forms);
    let english_key = guess_english_sort_key(english_meanings, None);

    VocabularyEntry {
        chapter,
        part_of_speech,
        verb_form: None,
        arabic_forms: forms,
        arabic_sort_letter,
        arabic_sort_start_index,
        english_meanings: english_meanings.to_string(),
        english_meanings_sort_letter: english_key.as_ref().map(|k| k.letter.clone()).unwrap_or_default(),
        english_meanings_sort_start_index: english_key.map(|k| k.start_index).unwrap_or(0),
        definitions: split_definitions(english_meanings, part_of_speech),
        source_name: source_name.to_string(),
        transliteration: None,
        page: None,
        surah: 0,
        ayah: 0,
        quranic_sources: Vec::new(),
    }
}

/// Parse a table number. Spreadsheet exports sometimes give `3.0` for 3.
pub fn parse_number(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Some(f as u32),
        _ => None,
    }
}

fn cell(row: &Row, key: &str) -> String {
    row.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Dispatch a row on its `Ex/Voc` column. Unknown kinds are skipped.
pub fn classify_row(row: &Row) -> Option<SourceRow> {
    let kind = cell(row, COL_KIND).to_lowercase();
    match kind.as_str() {
        "exercise" => {
            let arabic_text = Some(cell(row, COL_ARABIC_TEXT)).filter(|s| !s.is_empty());
            Some(SourceRow::Exercise(ExerciseRow {
                page: cell(row, COL_PAGE),
                chapter: cell(row, COL_LESSON),
                exercise_number: cell(row, COL_EXERCISE),
                arabic_text,
                sing_perf: cell(row, COL_SING_PERF),
                plural_vn: cell(row, COL_PLURAL_VN),
                surah: cell(row, COL_SURA),
                ayah: cell(row, COL_VERSE),
            }))
        }
        "vocabulary" => Some(SourceRow::Vocabulary(VocabularyRow {
            page: cell(row, COL_PAGE),
            chapter: cell(row, COL_LESSON),
            sing_perf: cell(row, COL_SING_PERF),
            dual_imperf: cell(row, COL_DUAL_IMPERF),
            plural_vn: cell(row, COL_PLURAL_VN),
            english: cell(row, COL_ENGLISH),
            verb_form: cell(row, COL_VERB_FORM),
        })),
        _ => {
            debug(&format!("Skipping row with unknown kind '{}'", kind));
            None
        }
    }
}

fn parse_chapter(raw: &str, context: &str) -> u32 {
    parse_number(raw).unwrap_or_else(|| {
        warn(&format!("Invalid lesson number: '{}', {}", raw, context));
        0
    })
}

/// Surah/ayah cells: empty means no reference, garbage is warned about.
fn parse_reference_part(raw: &str, what: &str) -> u32 {
    if raw.is_empty() {
        return 0;
    }
    parse_number(raw).unwrap_or_else(|| {
        warn(&format!("Invalid {}: '{}'", what, raw));
        0
    })
}

/// `surah:ayah` when both are set, else empty.
pub fn quranic_reference(surah: u32, ayah: u32) -> String {
    if surah != 0 && ayah != 0 {
        format!("{}:{}", surah, ayah)
    } else {
        String::new()
    }
}

/// Validation message for a partly or fully set reference.
pub fn reference_warning(surah: u32, ayah: u32) -> Option<String> {
    if surah == 0 && ayah == 0 {
        return None;
    }
    validate_reference(surah, ayah).err().map(|e| e.to_string())
}

pub fn build_exercise(row: &ExerciseRow) -> ExerciseEntry {
    let chapter = parse_chapter(&row.chapter, &row.exercise_number);
    let page = parse_number(&row.page);

    let exercise_number = match parse_number(&row.exercise_number) {
        Some(n) => n,
        None if row.exercise_number == SPECIAL_EXERCISE_ID && chapter == SPECIAL_EXERCISE_CHAPTER => {
            return ExerciseEntry {
                chapter,
                exercise_number: SPECIAL_EXERCISE_NUMBER,
                arabic_text: format!("{}: {}", row.sing_perf, row.plural_vn),
                surah: 0,
                ayah: 0,
                quranic_reference: String::new(),
                validation_warning: None,
                page,
                quranic_sources: Vec::new(),
                context_lines: Vec::new(),
            };
        }
        None => {
            warn(&format!("Invalid exercise number: '{}' in lesson {}", row.exercise_number, chapter));
            0
        }
    };

    let surah = parse_reference_part(&row.surah, "surah");
    let ayah = parse_reference_part(&row.ayah, "ayah");

    let arabic_text = match &row.arabic_text {
        Some(text) => text.clone(),
        None => row.sing_perf.clone(),
    };

    let validation_warning = reference_warning(surah, ayah);
    if let Some(w) = &validation_warning {
        warn(&format!("Lesson {} exercise {}: {}", chapter, exercise_number, w));
    }

    ExerciseEntry {
        chapter,
        exercise_number,
        arabic_text,
        surah,
        ayah,
        quranic_reference: quranic_reference(surah, ayah),
        validation_warning,
        page,
        quranic_sources: Vec::new(),
        context_lines: Vec::new(),
    }
}

/// Build a vocabulary entry. `previous` is the part of speech of the
/// preceding vocabulary row and is updated here.
pub fn build_vocabulary(row: &VocabularyRow, previous: &mut Option<PartOfSpeech>) -> Option<VocabularyEntry> {
    let chapter = parse_chapter(&row.chapter, &row.english);

    let key = match guess_english_sort_key(&row.english, None) {
        Some(k) => k,
        None => {
            warn(&format!("Vocabulary row in lesson {} has no English meaning, skipping", chapter));
            return None;
        }
    };

    let forms = ArabicForms::new(&row.sing_perf, &row.dual_imperf, &row.plural_vn);

    let mut part_of_speech = key.part_of_speech;
    if part_of_speech == PartOfSpeech::Noun && forms.all_present() {
        warn(&format!(
            "Row guessed as a noun but has all three forms, lesson {}: {}",
            chapter, row.english
        ));
        if *previous == Some(PartOfSpeech::Verb) {
            warn("...and the previous row was a verb, treating this as a verb too");
            part_of_speech = PartOfSpeech::Verb;
        }
    }
    *previous = Some(part_of_speech);

    if forms.is_empty() {
        error(&format!("Vocabulary row has no Arabic forms, lesson {}: {}", chapter, row.english));
        return None;
    }

    let mut entry = new_vocabulary_entry(chapter, part_of_speech, forms, &row.english, SOURCE_TEXTBOOK);
    entry.page = parse_number(&row.page);
    if part_of_speech == PartOfSpeech::Verb && !row.verb_form.is_empty() {
        entry.verb_form = Some(row.verb_form.clone());
    }

    Some(entry)
}

/// Build the canonical document from ingested rows, in row order.
pub fn build_document(rows: &[Row], lesson: LessonMeta) -> TextbookDocument {
    let mut vocabulary = Vec::new();
    let mut exercises = Vec::new();
    let mut previous_pos: Option<PartOfSpeech> = None;

    for row in rows {
        match classify_row(row) {
            Some(SourceRow::Exercise(ex)) => exercises.push(build_exercise(&ex)),
            Some(SourceRow::Vocabulary(voc)) => {
                if let Some(entry) = build_vocabulary(&voc, &mut previous_pos) {
                    vocabulary.push(entry);
                }
            }
            None => {}
        }
    }

    TextbookDocument {
        lesson,
        vocabulary,
        exercises,
    }
}
