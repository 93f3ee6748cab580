use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use thiserror::Error;

/// Source name stamped on entries built from the spreadsheet/CSV path.
pub const SOURCE_TEXTBOOK: &str = "textbook_jones";
/// Source name stamped on entries built from OCR markdown.
pub const SOURCE_OCR: &str = "textbook_llm_ocr";

fn is_zero(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartOfSpeech {
    #[serde(rename = "noun")]
    Noun,
    #[serde(rename = "verb")]
    Verb,
    #[serde(rename = "idiom")]
    Idiom,
}

impl PartOfSpeech {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Idiom => "idiom",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid part of speech: {0}")]
pub struct ParsePartOfSpeechError(String);

impl FromStr for PartOfSpeech {
    type Err = ParsePartOfSpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "noun" => Ok(PartOfSpeech::Noun),
            "verb" => Ok(PartOfSpeech::Verb),
            "idiom" => Ok(PartOfSpeech::Idiom),
            _ => Err(ParsePartOfSpeechError(s.to_string())),
        }
    }
}

/// The three Arabic columns of a vocabulary entry.
///
/// For verbs: perfect / imperfect / verbal noun.
/// For nouns: singular / dual / plural.
/// For idioms the whole phrase sits in `col1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArabicForms {
    #[serde(default)]
    pub col1: String,
    #[serde(default)]
    pub col2: String,
    #[serde(default)]
    pub col3: String,
}

impl ArabicForms {
    pub fn new(col1: &str, col2: &str, col3: &str) -> Self {
        ArabicForms {
            col1: col1.trim().to_string(),
            col2: col2.trim().to_string(),
            col3: col3.trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.col1.is_empty() && self.col2.is_empty() && self.col3.is_empty()
    }

    pub fn all_present(&self) -> bool {
        !self.col1.is_empty() && !self.col2.is_empty() && !self.col3.is_empty()
    }

    /// First non-empty column, in column order.
    pub fn first_non_empty(&self) -> Option<&str> {
        [&self.col1, &self.col2, &self.col3]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| s.as_str())
    }
}

/// One comma-separated meaning of an entry, with its own sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub text: String,
    #[serde(default)]
    pub sort_letter: String,
    #[serde(default)]
    pub sort_start_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextType {
    #[serde(rename = "indopak")]
    Indopak,
    #[serde(rename = "uthmani")]
    Uthmani,
    #[serde(rename = "imlaei")]
    Imlaei,
    #[serde(rename = "translation")]
    Translation,
}

/// A fetched verse text or translation attached to an entry. Never mutated after attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseSource {
    pub source_name: String,
    pub source_url: String,
    pub text_type: TextType,
    pub language: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_resource_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_resource_name: Option<String>,
}

impl VerseSource {
    /// Identity used when de-duplicating repeated attachments.
    pub fn identity(&self) -> (&str, TextType, Option<u32>) {
        (self.source_name.as_str(), self.text_type, self.translation_resource_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub chapter: u32,
    pub part_of_speech: PartOfSpeech,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb_form: Option<String>,
    pub arabic_forms: ArabicForms,
    #[serde(default)]
    pub arabic_sort_letter: String,
    #[serde(default)]
    pub arabic_sort_start_index: usize,
    #[serde(default)]
    pub english_meanings: String,
    #[serde(default)]
    pub english_meanings_sort_letter: String,
    #[serde(default)]
    pub english_meanings_sort_start_index: usize,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub surah: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ayah: u32,
    #[serde(default)]
    pub quranic_sources: Vec<VerseSource>,
}

/// A neighbouring verse shown as context for an exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    pub surah: u32,
    pub ayah: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quranic_sources: Vec<VerseSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    pub chapter: u32,
    pub exercise_number: u32,
    pub arabic_text: String,
    #[serde(default)]
    pub surah: u32,
    #[serde(default)]
    pub ayah: u32,
    /// "surah:ayah", or empty when either number is zero.
    #[serde(default)]
    pub quranic_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default)]
    pub quranic_sources: Vec<VerseSource>,
    #[serde(default)]
    pub context_lines: Vec<ContextLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonMeta {
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_date: Option<String>,
    /// Keys we don't model are carried through untouched.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl LessonMeta {
    pub fn from_source(source: &str) -> Self {
        LessonMeta {
            source: source.to_string(),
            ..Default::default()
        }
    }
}

/// The persisted document between ingestion/enrichment and rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextbookDocument {
    pub lesson: LessonMeta,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyEntry>,
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

/// A vocabulary row as it comes out of ingestion, before any guessing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyRow {
    pub page: String,
    pub chapter: String,
    pub sing_perf: String,
    pub dual_imperf: String,
    pub plural_vn: String,
    pub english: String,
    pub verb_form: String,
}

/// An exercise row as it comes out of ingestion. Numbers are still raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseRow {
    pub page: String,
    pub chapter: String,
    pub exercise_number: String,
    /// Non-empty "Arabic Text" cell. Otherwise the text is taken from the
    /// first Arabic column.
    pub arabic_text: Option<String>,
    pub sing_perf: String,
    pub plural_vn: String,
    pub surah: String,
    pub ayah: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRow {
    Vocabulary(VocabularyRow),
    Exercise(ExerciseRow),
}
