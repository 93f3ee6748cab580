//! Glossary ordering: vocabulary grouped by Arabic initial letter and by
//! English initial letter, each group sorted on its entries' sort keys.
//!
//! Both views use stable sorts, so entries with equal keys keep document order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::classify::english_sort_text;
use crate::logger::debug;
use crate::types::{Definition, PartOfSpeech, VocabularyEntry};

/// Letter order of the Arabic glossary. Letters outside this list follow it.
pub const ARABIC_ALPHABET: [&str; 31] = [
    "ا", "إ", "آ", "أ", "ب", "ت", "ث", "ج", "ح", "خ", "د", "ذ", "ر", "ز", "س", "ش", "ص", "ض", "ط", "ظ", "ع", "غ",
    "ف", "ق", "ك", "ل", "م", "ن", "ه", "و", "ي",
];

lazy_static! {
    /// Regex for splitting strings into text and numeric segments
    static ref NATURAL_SORT_REGEX: Regex = Regex::new(r"(\d+|[^\d]+)").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
enum StringSegment {
    Text(String),
    Number(u64),
}

fn parse_natural_segments(s: &str) -> Vec<StringSegment> {
    NATURAL_SORT_REGEX
        .find_iter(s)
        .map(|mat| {
            let segment = mat.as_str();
            match segment.parse::<u64>() {
                Ok(num) => StringSegment::Number(num),
                Err(_) => StringSegment::Text(segment.to_lowercase()),
            }
        })
        .collect()
}

fn compare_segments(a: &StringSegment, b: &StringSegment) -> Ordering {
    match (a, b) {
        (StringSegment::Text(s1), StringSegment::Text(s2)) => s1.cmp(s2),
        (StringSegment::Number(n1), StringSegment::Number(n2)) => n1.cmp(n2),
        // Numbers come before text
        (StringSegment::Number(_), StringSegment::Text(_)) => Ordering::Less,
        (StringSegment::Text(_), StringSegment::Number(_)) => Ordering::Greater,
    }
}

/// Alphanumeric comparison where embedded numbers compare by value.
pub fn natural_sort_compare(a: &str, b: &str) -> Ordering {
    let a_segments = parse_natural_segments(a);
    let b_segments = parse_natural_segments(b);

    for (seg_a, seg_b) in a_segments.iter().zip(b_segments.iter()) {
        match compare_segments(seg_a, seg_b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    a_segments.len().cmp(&b_segments.len())
}

/// One glossary line. English rows carry the definition they are listed under.
#[derive(Debug, Clone, PartialEq)]
pub struct GlossaryRow<'a> {
    pub entry: &'a VocabularyEntry,
    pub definition: Option<&'a Definition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlossaryGroup<'a> {
    pub letter: String,
    pub rows: Vec<GlossaryRow<'a>>,
}

fn is_usable_letter(letter: &str) -> bool {
    !matches!(letter.trim(), "" | "(" | ")")
}

fn is_arabic_block(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

/// The form an entry is sorted and grouped by: the imperfect for verbs, the
/// singular otherwise. Entries missing that form use their first non-empty one.
fn arabic_sort_word(entry: &VocabularyEntry) -> &str {
    let forms = &entry.arabic_forms;
    let preferred = match entry.part_of_speech {
        PartOfSpeech::Verb => forms.col2.as_str(),
        _ => forms.col1.as_str(),
    };
    if !preferred.is_empty() {
        return preferred;
    }
    forms.first_non_empty().unwrap_or("")
}

/// First Arabic-block character of the sort word, skipping a leading `(f.)` style marker.
fn fallback_arabic_letter(entry: &VocabularyEntry) -> Option<String> {
    let word = arabic_sort_word(entry);
    let word = match (word.starts_with('('), word.find(')')) {
        (true, Some(close)) if close > 0 => word[close + 1..].trim(),
        _ => word,
    };
    word.chars().find(|c| is_arabic_block(*c)).map(|c| c.to_string())
}

fn arabic_sort_substring(entry: &VocabularyEntry) -> String {
    let word = arabic_sort_word(entry);
    if entry.arabic_sort_start_index < word.chars().count() {
        word.chars().skip(entry.arabic_sort_start_index).collect()
    } else {
        word.to_string()
    }
}

/// Position of a group letter: canonical letters first, in alphabet order.
fn compare_arabic_letters(a: &str, b: &str) -> Ordering {
    let pos = |l: &str| ARABIC_ALPHABET.iter().position(|x| *x == l);
    match (pos(a), pos(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => natural_sort_compare(a, b),
    }
}

/// Entries grouped by Arabic sort letter, groups in alphabet order.
///
/// Entries with no usable letter, even after scanning the word itself, are left out.
pub fn arabic_glossary(vocabulary: &[VocabularyEntry]) -> Vec<GlossaryGroup<'_>> {
    let mut grouped: BTreeMap<String, Vec<&VocabularyEntry>> = BTreeMap::new();

    for entry in vocabulary {
        let letter = if is_usable_letter(&entry.arabic_sort_letter) {
            Some(entry.arabic_sort_letter.clone())
        } else {
            fallback_arabic_letter(entry)
        };

        match letter {
            Some(letter) => grouped.entry(letter).or_default().push(entry),
            None => debug(&format!("No Arabic sort letter for entry: {}", entry.english_meanings)),
        }
    }

    let mut groups: Vec<GlossaryGroup> = grouped
        .into_iter()
        .map(|(letter, mut entries)| {
            entries.sort_by_cached_key(|e| arabic_sort_substring(e));
            GlossaryGroup {
                letter,
                rows: entries
                    .into_iter()
                    .map(|entry| GlossaryRow { entry, definition: None })
                    .collect(),
            }
        })
        .collect();

    groups.sort_by(|a, b| compare_arabic_letters(&a.letter, &b.letter));
    groups
}

/// One row per definition, grouped by uppercased English sort letter, groups A to Z.
///
/// Entries without definitions get a single row keyed on their whole meaning string.
pub fn english_glossary(vocabulary: &[VocabularyEntry]) -> Vec<GlossaryGroup<'_>> {
    let mut grouped: BTreeMap<String, Vec<(GlossaryRow, String)>> = BTreeMap::new();

    for entry in vocabulary {
        let keyed: Vec<(GlossaryRow, &str, &str, usize)> = if entry.definitions.is_empty() {
            vec![(
                GlossaryRow { entry, definition: None },
                entry.english_meanings_sort_letter.as_str(),
                entry.english_meanings.as_str(),
                entry.english_meanings_sort_start_index,
            )]
        } else {
            entry
                .definitions
                .iter()
                .map(|d| {
                    (
                        GlossaryRow { entry, definition: Some(d) },
                        d.sort_letter.as_str(),
                        d.text.as_str(),
                        d.sort_start_index,
                    )
                })
                .collect()
        };

        for (row, letter, text, start) in keyed {
            let letter = letter.to_uppercase();
            if letter.is_empty() {
                debug(&format!("No English sort letter for: {}", text));
                continue;
            }
            let sort_key = english_sort_text(text, start);
            grouped.entry(letter).or_default().push((row, sort_key));
        }
    }

    grouped
        .into_iter()
        .map(|(letter, mut rows)| {
            rows.sort_by(|a, b| a.1.cmp(&b.1));
            GlossaryGroup {
                letter,
                rows: rows.into_iter().map(|(row, _)| row).collect(),
            }
        })
        .collect()
}
