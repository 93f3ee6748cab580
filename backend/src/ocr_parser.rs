//! Line scanner for OCR markdown of the textbook.
//!
//! The scanner walks the file once, keeping page, chapter and section in a
//! [`ScanCursor`]. Vocabulary tables and numbered exercises are pulled out
//! into records; everything else is kept as a transcript for rendering and
//! tallied into an Arabic word-frequency list.
//!
//! Nothing here fails on odd input. Lines that don't fit a pattern fall
//! through to the generic transcript.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::classify::{new_vocabulary_entry, quranic_reference, reference_warning};
use crate::errors::IngestError;
use crate::logger::{debug, warn};
use crate::quran_data::{convert_written_number, NUMBER_WORDS};
use crate::tex_utils::{arabic_words, contains_arabic_text, remove_arabic_marks};
use crate::types::{ArabicForms, ExerciseEntry, LessonMeta, PartOfSpeech, TextbookDocument, SOURCE_OCR};

/// Transliterations are only printed in the first lessons of the book.
pub const LAST_TRANSLITERATED_CHAPTER: u32 = 5;

/// Lines longer than this without Arabic or an exercise number end an exercise list.
const SECTION_BREAK_MIN_CHARS: usize = 10;

fn section_pattern(keyword: &str) -> Regex {
    let words = NUMBER_WORDS.iter().map(|w| regex::escape(&w.to_uppercase())).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"(?i)^{}\s+({}|\d+)$", keyword, words)).unwrap()
}

lazy_static! {
    static ref METADATA_PAGE_RE: Regex = Regex::new(r"^### START FILE \d+, Extracted Page (\d+)").unwrap();
    static ref METADATA_NO_PAGE_RE: Regex = Regex::new(r"^### START FILE \d+, Extracted Page\s*$").unwrap();
    static ref CHAPTER_RE: Regex = Regex::new(r"^## CHAPTER (\d{1,2})").unwrap();
    static ref VOCABULARY_SECTION_RE: Regex = section_pattern("VOCABULARY");
    static ref EXERCISE_SECTION_RE: Regex = section_pattern("EXERCISE");

    static ref VERB_HEADER_RE: Regex = Regex::new(r"(?i)PERFECT.*IMPERFECT.*VERBAL\s+NOUN").unwrap();
    static ref NOUN3_HEADER_RE: Regex = Regex::new(r"(?i)SINGULAR.*DUAL.*PLURAL").unwrap();
    static ref NOUN2_HEADER_RE: Regex = Regex::new(r"(?i)SINGULAR.*PLURAL").unwrap();
    static ref NOUN1_HEADER_RE: Regex = Regex::new(r"(?i)SINGULAR").unwrap();
    static ref IDIOM_HEADER_RE: Regex = Regex::new(r"(?i)Idioms").unwrap();

    static ref VERB_FORM_RE: Regex = Regex::new(r"\s*\{(\d{1,2})\}\s*").unwrap();
    static ref PLURAL_MARKER_RE: Regex = Regex::new(r"\(.*\s?pl\.\s?.*\)").unwrap();
    static ref SLASH_RE: Regex = Regex::new(r"\s*/\s*").unwrap();

    static ref EXERCISE_LINE_RE: Regex = Regex::new(r"^(\d+)\.\s*(.*\p{scx=Arabic}.*)").unwrap();
    static ref EXERCISE_NUMBER_RE: Regex = Regex::new(r"^\d+\.").unwrap();
    static ref REFERENCE_RE: Regex = Regex::new(r"\[(\d+):(\d+)\]").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    Body,
    Vocabulary,
    Exercises,
}

/// Column headers of a vocabulary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabHeader {
    Perfect,
    Imperfect,
    VerbalNoun,
    Singular,
    Dual,
    Plural,
    Idioms,
}

impl VocabHeader {
    /// Arabic column (0-based) a noun header fills.
    fn noun_column(&self) -> Option<usize> {
        match self {
            VocabHeader::Singular => Some(0),
            VocabHeader::Dual => Some(1),
            VocabHeader::Plural => Some(2),
            _ => None,
        }
    }
}

/// Where the scan is. Passed explicitly to every line handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCursor {
    pub page: u32,
    pub chapter: u32,
    pub chapter_header: String,
    pub section: Section,
    pub headers: Vec<VocabHeader>,
    pub vocab_type: PartOfSpeech,
}

impl Default for ScanCursor {
    fn default() -> Self {
        ScanCursor {
            page: 0,
            chapter: 0,
            chapter_header: String::new(),
            section: Section::Body,
            headers: Vec::new(),
            vocab_type: PartOfSpeech::Noun,
        }
    }
}

/// One row of a vocabulary table as read off the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrVocabularyLine {
    pub page: u32,
    pub chapter: u32,
    pub forms: ArabicForms,
    pub english: String,
    pub verb_form: String,
    pub part_of_speech: PartOfSpeech,
    pub transliteration: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptItem {
    Chapter(String),
    SectionStart(Section),
    Exercise {
        text: String,
        reference: String,
        warning: Option<String>,
    },
    ExercisesEnd,
    Heading { level: usize, text: String },
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordStats {
    pub count: usize,
    pub pages: BTreeSet<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    pub vocabulary: Vec<OcrVocabularyLine>,
    pub exercises: Vec<ExerciseEntry>,
    /// Keyed by the word with Quranic marks removed.
    pub word_frequencies: BTreeMap<String, WordStats>,
    pub transcript: Vec<TranscriptItem>,
}

impl OcrOutput {
    /// Canonical document for the OCR results. `timestamp` ends up in the lesson metadata.
    pub fn to_document(&self, timestamp: &str) -> TextbookDocument {
        let vocabulary = self
            .vocabulary
            .iter()
            .map(|line| {
                let mut entry = new_vocabulary_entry(
                    line.chapter,
                    line.part_of_speech,
                    line.forms.clone(),
                    &line.english,
                    SOURCE_OCR,
                );
                entry.page = Some(line.page);
                if !line.verb_form.is_empty() {
                    entry.verb_form = Some(line.verb_form.clone());
                }
                if !line.transliteration.is_empty() {
                    entry.transliteration = Some(line.transliteration.clone());
                }
                entry
            })
            .collect();

        let lesson = LessonMeta {
            source: format!("LLM OCR processed on {}", timestamp),
            processing_date: Some(timestamp.to_string()),
            ..Default::default()
        };

        TextbookDocument {
            lesson,
            vocabulary,
            exercises: self.exercises.clone(),
        }
    }
}

/// `### START FILE n, Extracted Page p`. The page-less variant advances one page.
pub fn parse_metadata_line(line: &str, current_page: u32) -> Option<u32> {
    if let Some(caps) = METADATA_PAGE_RE.captures(line) {
        return caps[1].parse().ok();
    }
    if METADATA_NO_PAGE_RE.is_match(line) {
        return Some(current_page + 1);
    }
    None
}

/// `## CHAPTER 12` gives `(12, "## CHAPTER 12")`.
pub fn detect_chapter_start(line: &str) -> Option<(u32, String)> {
    let caps = CHAPTER_RE.captures(line)?;
    let n = caps[1].parse().ok()?;
    Some((n, line.trim().to_string()))
}

/// Number of a `VOCABULARY <n>` heading, written out or in digits.
pub fn detect_vocabulary_section(line: &str) -> Option<u32> {
    VOCABULARY_SECTION_RE.captures(line.trim()).map(|c| convert_written_number(&c[1]))
}

pub fn detect_exercise_section(line: &str) -> Option<u32> {
    EXERCISE_SECTION_RE.captures(line.trim()).map(|c| convert_written_number(&c[1]))
}

/// Column headers of a vocabulary table. Lines with Arabic are never headers.
pub fn parse_vocabulary_headers(line: &str) -> Option<Vec<VocabHeader>> {
    let line = line.trim();
    if line.is_empty() || contains_arabic_text(line) {
        return None;
    }

    use VocabHeader::*;
    if VERB_HEADER_RE.is_match(line) {
        Some(vec![Perfect, Imperfect, VerbalNoun])
    } else if NOUN3_HEADER_RE.is_match(line) {
        Some(vec![Singular, Dual, Plural])
    } else if NOUN2_HEADER_RE.is_match(line) {
        Some(vec![Singular, Plural])
    } else if NOUN1_HEADER_RE.is_match(line) {
        Some(vec![Singular])
    } else if IDIOM_HEADER_RE.is_match(line) {
        Some(vec![Idioms])
    } else {
        None
    }
}

fn vocab_type_for(headers: &[VocabHeader]) -> PartOfSpeech {
    if headers.contains(&VocabHeader::Perfect) {
        PartOfSpeech::Verb
    } else if headers.contains(&VocabHeader::Idioms) {
        PartOfSpeech::Idiom
    } else {
        PartOfSpeech::Noun
    }
}

fn starts_lowercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_lowercase)
}

/// Split a vocabulary line into Arabic columns, English and transliteration.
pub fn parse_vocabulary_line(line: &str, cursor: &ScanCursor) -> Option<OcrVocabularyLine> {
    let mut line = line.trim().to_string();
    if line.is_empty() || !contains_arabic_text(&line) {
        return None;
    }

    let mut verb_form = String::new();
    if cursor.vocab_type == PartOfSpeech::Verb {
        if let Some(caps) = VERB_FORM_RE.captures(&line) {
            verb_form = caps[1].to_string();
            line = VERB_FORM_RE.replace_all(&line, " ").to_string();
        }
    }

    let has_singular_marker = line.contains("(s.)");
    let has_plural_marker = PLURAL_MARKER_RE.is_match(&line);

    let line = SLASH_RE.replace_all(&line, "/");
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }

    let mut arabic: Vec<&str> = Vec::new();
    let mut english: Vec<&str> = Vec::new();
    let mut transliterations: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];
        i += 1;

        if !contains_arabic_text(part) {
            english.push(part);
            continue;
        }

        // Arabic after two English words is a note inside the meaning,
        // e.g. `to look at (إِلَىٰ), into (فِي)`.
        if english.len() < 2 || cursor.vocab_type == PartOfSpeech::Idiom {
            arabic.push(part);
        } else {
            english.push(part);
        }

        if cursor.chapter <= LAST_TRANSLITERATED_CHAPTER
            && i < parts.len()
            && !contains_arabic_text(parts[i])
            && starts_lowercase(parts[i])
        {
            transliterations.push(parts[i]);
            i += 1;
        }
    }

    if arabic.is_empty() {
        return None;
    }

    let mut english_text = english.join(" ");
    if english_text.is_empty() {
        warn(&format!("No English text found in vocabulary line: {}", line));
    }

    let (forms, extra) = assign_columns(&arabic, cursor, has_singular_marker, has_plural_marker);

    if !extra.is_empty() {
        warn(&format!(
            "More Arabic words than columns, moving '{}' to English: {}",
            extra.join(" "),
            line
        ));
        english_text.push_str(";; ");
        english_text.push_str(&extra.join(" "));
    }

    Some(OcrVocabularyLine {
        page: cursor.page,
        chapter: cursor.chapter,
        forms,
        english: english_text,
        verb_form,
        part_of_speech: cursor.vocab_type,
        transliteration: transliterations.join(" "),
    })
}

/// Place Arabic tokens in columns. Returns the forms and the tokens that didn't fit.
fn assign_columns<'a>(
    arabic: &[&'a str],
    cursor: &ScanCursor,
    has_singular_marker: bool,
    has_plural_marker: bool,
) -> (ArabicForms, Vec<&'a str>) {
    let mut cols = [""; 3];

    let slots: Vec<usize> = match cursor.vocab_type {
        PartOfSpeech::Idiom => {
            let phrase = arabic.join(" ");
            return (ArabicForms::new(&phrase, "", ""), Vec::new());
        }
        PartOfSpeech::Verb => vec![0, 1, 2],
        PartOfSpeech::Noun => {
            let from_headers: Vec<usize> = cursor.headers.iter().filter_map(|h| h.noun_column()).collect();
            if from_headers.is_empty() { vec![0, 1, 2] } else { from_headers }
        }
    };

    // A lone word marked plural (and not singular) belongs in the plural column.
    if cursor.vocab_type == PartOfSpeech::Noun
        && arabic.len() == 1
        && slots.len() > 1
        && !has_singular_marker
        && has_plural_marker
    {
        debug(&format!("Plural marker without singular, using plural column: {}", arabic[0]));
        cols[2] = arabic[0];
        return (ArabicForms::new(cols[0], cols[1], cols[2]), Vec::new());
    }

    for (word, slot) in arabic.iter().zip(slots.iter()) {
        cols[*slot] = word;
    }
    let extra = arabic.iter().skip(slots.len()).copied().collect();

    (ArabicForms::new(cols[0], cols[1], cols[2]), extra)
}

/// `12. <Arabic text> [2:255]`. The reference is cut out of the text and validated.
pub fn parse_exercise_line(line: &str, cursor: &ScanCursor) -> Option<ExerciseEntry> {
    let line = line.trim();
    let caps = EXERCISE_LINE_RE.captures(line)?;
    let exercise_number: u32 = caps[1].parse().ok()?;
    let mut text = caps[2].to_string();

    let mut surah = 0;
    let mut ayah = 0;
    let mut validation_warning = None;

    if let Some(r) = REFERENCE_RE.captures(&text) {
        surah = r[1].parse().unwrap_or(0);
        ayah = r[2].parse().unwrap_or(0);
        validation_warning = reference_warning(surah, ayah).or_else(|| {
            (surah == 0 || ayah == 0).then(|| format!("Reference [{}:{}] is incomplete", surah, ayah))
        });
        text = REFERENCE_RE.replace_all(&text, "").trim().to_string();
    }

    if let Some(w) = &validation_warning {
        warn(&format!("Lesson {} exercise {}: {}", cursor.chapter, exercise_number, w));
    }

    Some(ExerciseEntry {
        chapter: cursor.chapter,
        exercise_number,
        arabic_text: text,
        surah,
        ayah,
        quranic_reference: quranic_reference(surah, ayah),
        validation_warning,
        page: Some(cursor.page),
        quranic_sources: Vec::new(),
        context_lines: Vec::new(),
    })
}

/// Whether a line inside an exercise list starts new content.
pub fn leaves_exercise_section(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && !EXERCISE_NUMBER_RE.is_match(trimmed)
        && !line.starts_with("###")
        && !contains_arabic_text(line)
        && trimmed.chars().count() > SECTION_BREAK_MIN_CHARS
}

/// A wrapped meaning continuing the previous vocabulary row.
fn is_continuation_line(line: &str) -> bool {
    let trimmed = line.trim();
    !contains_arabic_text(trimmed) && starts_lowercase(trimmed)
}

#[derive(Debug, Default)]
pub struct OcrParser {
    cursor: ScanCursor,
    pending: Option<OcrVocabularyLine>,
    output: OcrOutput,
}

impl OcrParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> &ScanCursor {
        &self.cursor
    }

    fn flush_pending(&mut self) {
        if let Some(entry) = self.pending.take() {
            self.output.vocabulary.push(entry);
        }
    }

    fn close_exercises(&mut self) {
        if self.cursor.section == Section::Exercises {
            self.output.transcript.push(TranscriptItem::ExercisesEnd);
        }
    }

    fn tally_words(&mut self, line: &str) {
        for word in arabic_words(line) {
            let clean = remove_arabic_marks(word);
            if clean.is_empty() {
                continue;
            }
            let stats = self.output.word_frequencies.entry(clean).or_default();
            stats.count += 1;
            stats.pages.insert(self.cursor.page);
        }
    }

    pub fn process_line(&mut self, raw: &str) {
        let line = raw.trim_end();

        if let Some(page) = parse_metadata_line(line, self.cursor.page) {
            self.cursor.page = page;
            return;
        }

        if let Some((chapter, header)) = detect_chapter_start(line) {
            self.flush_pending();
            self.close_exercises();
            self.cursor.chapter = chapter;
            self.cursor.chapter_header = header.clone();
            self.cursor.section = Section::Body;
            self.output.transcript.push(TranscriptItem::Chapter(header));
            return;
        }

        if self.cursor.section == Section::Body {
            if let Some(n) = detect_vocabulary_section(line) {
                if n != self.cursor.chapter {
                    warn(&format!("Vocabulary section {} does not match chapter {}", n, self.cursor.chapter));
                }
                self.cursor.section = Section::Vocabulary;
                self.output.transcript.push(TranscriptItem::SectionStart(Section::Vocabulary));
                return;
            }
        }

        if self.cursor.section == Section::Vocabulary {
            if let Some(n) = detect_exercise_section(line) {
                if n != self.cursor.chapter {
                    warn(&format!("Exercise section {} does not match chapter {}", n, self.cursor.chapter));
                }
                self.flush_pending();
                self.cursor.section = Section::Exercises;
                self.output.transcript.push(TranscriptItem::SectionStart(Section::Exercises));
                return;
            }

            if let Some(headers) = parse_vocabulary_headers(line) {
                self.flush_pending();
                self.cursor.vocab_type = vocab_type_for(&headers);
                self.cursor.headers = headers;
                debug(&format!(
                    "Vocabulary headers on page {}: {:?}",
                    self.cursor.page, self.cursor.headers
                ));
                return;
            }

            if let Some(entry) = parse_vocabulary_line(line, &self.cursor) {
                self.flush_pending();
                self.pending = Some(entry);
                return;
            }

            // Continuations extend the pending entry and are still printed and tallied below.
            if is_continuation_line(line) {
                if let Some(pending) = self.pending.as_mut() {
                    if !pending.english.is_empty() {
                        pending.english.push(' ');
                    }
                    pending.english.push_str(line.trim());
                }
            }
        }

        if self.cursor.section == Section::Exercises {
            if let Some(exercise) = parse_exercise_line(line, &self.cursor) {
                self.output.transcript.push(TranscriptItem::Exercise {
                    text: exercise.arabic_text.clone(),
                    reference: exercise.quranic_reference.clone(),
                    warning: exercise.validation_warning.clone(),
                });
                self.output.exercises.push(exercise);
                return;
            }

            if leaves_exercise_section(line) {
                self.close_exercises();
                self.cursor.section = Section::Body;
            }
        }

        // Generic content, including the line that ended an exercise list.
        if line.trim().is_empty() || line.starts_with("###") {
            return;
        }

        self.tally_words(line);

        if line.starts_with('#') {
            let level = line.len() - line.trim_start_matches('#').len();
            let text = line.trim_start_matches(['#', ' ']).trim().to_string();
            self.output.transcript.push(TranscriptItem::Heading { level, text });
        } else {
            self.output.transcript.push(TranscriptItem::Text(line.to_string()));
        }
    }

    pub fn finish(mut self) -> OcrOutput {
        self.flush_pending();
        self.close_exercises();
        self.output
    }
}

pub fn parse_ocr_text(text: &str) -> OcrOutput {
    let mut parser = OcrParser::new();
    for line in text.lines() {
        parser.process_line(line);
    }
    parser.finish()
}

pub fn parse_ocr_file(path: &Path) -> Result<OcrOutput> {
    if !path.exists() {
        return Err(IngestError::MissingInput(path.to_path_buf()).into());
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(parse_ocr_text(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(vocab_type: PartOfSpeech, headers: Vec<VocabHeader>, chapter: u32) -> ScanCursor {
        ScanCursor {
            page: 10,
            chapter,
            section: Section::Vocabulary,
            headers,
            vocab_type,
            ..Default::default()
        }
    }

    #[test]
    fn test_metadata_line() {
        assert_eq!(parse_metadata_line("### START FILE 10, Extracted Page 112", 5), Some(112));
        assert_eq!(parse_metadata_line("### START FILE 11, Extracted Page", 112), Some(113));
        assert_eq!(parse_metadata_line("### START FILE x", 112), None);
    }

    #[test]
    fn test_section_detection() {
        assert_eq!(detect_vocabulary_section("VOCABULARY TWELVE"), Some(12));
        assert_eq!(detect_vocabulary_section("Vocabulary twenty-one"), Some(21));
        assert_eq!(detect_exercise_section("EXERCISE 7"), Some(7));
        assert_eq!(detect_exercise_section("EXERCISES and notes"), None);
        assert_eq!(detect_chapter_start("## CHAPTER 3 "), Some((3, "## CHAPTER 3".to_string())));
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            parse_vocabulary_headers("PERFECT | IMPERFECT | VERBAL NOUN"),
            Some(vec![VocabHeader::Perfect, VocabHeader::Imperfect, VocabHeader::VerbalNoun])
        );
        assert_eq!(
            parse_vocabulary_headers("SINGULAR   PLURAL"),
            Some(vec![VocabHeader::Singular, VocabHeader::Plural])
        );
        assert_eq!(parse_vocabulary_headers("Idioms"), Some(vec![VocabHeader::Idioms]));
        assert_eq!(parse_vocabulary_headers("كِتَاب singular"), None);
    }

    #[test]
    fn test_single_plural_token_goes_to_column_three() {
        use VocabHeader::*;
        let c = cursor(PartOfSpeech::Noun, vec![Singular, Dual, Plural], 8);
        let v = parse_vocabulary_line("أَصْحَابٌ (pl.) companions", &c).unwrap();
        assert_eq!(v.forms.col1, "");
        assert_eq!(v.forms.col3, "أَصْحَابٌ");
        assert_eq!(v.english, "(pl.) companions");
    }

    #[test]
    fn test_singular_marker_keeps_column_one() {
        use VocabHeader::*;
        let c = cursor(PartOfSpeech::Noun, vec![Singular, Dual, Plural], 8);
        let v = parse_vocabulary_line("صَاحِبٌ (s.) (pl. أَصْحَابٌ) companion", &c).unwrap();
        assert_eq!(v.forms.col1, "صَاحِبٌ");
    }

    #[test]
    fn test_verb_line_with_form() {
        let c = cursor(PartOfSpeech::Verb, vec![], 12);
        let v = parse_vocabulary_line("قَاتَلَ يُقَاتِلُ قِتَالٌ {3} to fight", &c).unwrap();
        assert_eq!(v.verb_form, "3");
        assert_eq!(v.forms.col1, "قَاتَلَ");
        assert_eq!(v.forms.col2, "يُقَاتِلُ");
        assert_eq!(v.forms.col3, "قِتَالٌ");
        assert_eq!(v.english, "to fight");
        assert_eq!(v.transliteration, "");
    }

    #[test]
    fn test_extra_arabic_is_moved_to_english() {
        let c = cursor(PartOfSpeech::Verb, vec![], 12);
        let v = parse_vocabulary_line("نَظَرَ يَنْظُرُ نَظَرٌ مَنْظَرٌ to look", &c).unwrap();
        assert_eq!(v.forms.col3, "نَظَرٌ");
        assert_eq!(v.english, "to look;; مَنْظَرٌ");
    }

    #[test]
    fn test_arabic_note_inside_meaning() {
        let c = cursor(PartOfSpeech::Verb, vec![], 11);
        let v = parse_vocabulary_line("نَظَرَ يَنْظُرُ نَظَرٌ to look at (إِلَىٰ), into (فِي)", &c).unwrap();
        assert_eq!(v.forms.col1, "نَظَرَ");
        assert!(v.english.contains("(إِلَىٰ),"));
    }

    #[test]
    fn test_transliteration_only_in_early_chapters() {
        let early = cursor(PartOfSpeech::Noun, vec![], 1);
        let v = parse_vocabulary_line("اَللهُ allāhu God", &early).unwrap();
        assert_eq!(v.transliteration, "allāhu");
        assert_eq!(v.english, "God");

        let late = cursor(PartOfSpeech::Noun, vec![], 9);
        let v = parse_vocabulary_line("اَللهُ allāhu God", &late).unwrap();
        assert_eq!(v.transliteration, "");
        assert_eq!(v.english, "allāhu God");
    }

    #[test]
    fn test_exercise_line() {
        let c = ScanCursor { chapter: 2, page: 30, ..Default::default() };
        let ex = parse_exercise_line("4. ذَٰلِكَ ٱلْكِتَٰبُ [2:2]", &c).unwrap();
        assert_eq!(ex.exercise_number, 4);
        assert_eq!(ex.arabic_text, "ذَٰلِكَ ٱلْكِتَٰبُ");
        assert_eq!(ex.quranic_reference, "2:2");
        assert_eq!(ex.validation_warning, None);
        assert_eq!(ex.page, Some(30));

        let bad = parse_exercise_line("5. قُلْ [2:300]", &c).unwrap();
        assert_eq!(
            bad.validation_warning.as_deref(),
            Some("Verse 300 is invalid for chapter 2 (valid range: 1-286)")
        );

        assert!(parse_exercise_line("6. no arabic here", &c).is_none());
    }

    #[test]
    fn test_leaves_exercise_section() {
        assert!(leaves_exercise_section("This is a new paragraph of notes."));
        assert!(!leaves_exercise_section("7. more"));
        assert!(!leaves_exercise_section("### START FILE 3"));
        assert!(!leaves_exercise_section("short"));
    }
}
