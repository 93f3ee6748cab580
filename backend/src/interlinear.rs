//! Reading sessions: Quran passages assigned per session, printed verse by
//! verse with their translations and the Uthmani text.
//!
//! As with enrichment, every chapter and verse is fetched at most once, and
//! the document is only rendered once fetching is done.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{InterlinearOptions, RenderOptions};
use crate::enrich::progress_bar;
use crate::errors::IngestError;
use crate::logger::{debug, error, info, warn};
use crate::quran_api::{translation_name, ChapterData, TranslationText, VerseData, VerseFetcher};
use crate::quran_data::{ayah_count, VerseKey};
use crate::tex_render::document_head;
use crate::tex_utils::{remove_arabic_marks, tex_cleanup_text};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub chapter: u32,
    /// `[n]` for one verse, `[first, last]` for a span, empty or null for the whole surah.
    #[serde(default)]
    pub verse: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSession {
    pub session_number: u32,
    #[serde(default)]
    pub readings: Vec<Reading>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerseSelection {
    Single(u32),
    Span(u32, u32),
    Complete,
}

impl Reading {
    pub fn selection(&self) -> VerseSelection {
        match self.verse.as_deref() {
            None | Some([]) => VerseSelection::Complete,
            Some([n]) => VerseSelection::Single(*n),
            Some([first, last, ..]) => VerseSelection::Span(*first, *last),
        }
    }
}

impl VerseSelection {
    /// Verse numbers in a surah of `count` verses. Numbers past the end are dropped.
    pub fn verses(&self, count: u32) -> Vec<u32> {
        let (first, last) = match *self {
            VerseSelection::Single(n) => (n, n),
            VerseSelection::Span(first, last) => (first, last),
            VerseSelection::Complete => (1, count),
        };
        (first.max(1)..=last.min(count)).collect()
    }
}

/// One reading with everything needed to print it.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub chapter: ChapterData,
    pub selection: VerseSelection,
    pub verses: Vec<(VerseKey, VerseData)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionPassages {
    pub session_number: u32,
    pub passages: Vec<Passage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterlinearBook {
    /// Sessions with at least one reading, in input order.
    pub sessions: Vec<SessionPassages>,
    pub fetched: usize,
    pub failed: usize,
}

pub fn read_sessions(path: &Path) -> Result<Vec<ReadingSession>> {
    if !path.exists() {
        return Err(IngestError::MissingInput(path.to_path_buf()).into());
    }
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let sessions = serde_json::from_str(&text)
        .with_context(|| format!("Invalid reading sessions JSON in {}", path.display()))?;
    Ok(sessions)
}

/// `None` for surah numbers outside 1-114. A failed request falls back to the
/// local verse count without names.
fn chapter_info<F: VerseFetcher + ?Sized>(fetcher: &F, token: &str, surah: u32) -> Option<ChapterData> {
    let local_count = ayah_count(surah)?;

    match fetcher.fetch_chapter(token, surah) {
        Ok(mut chapter) => {
            chapter.id = surah;
            if chapter.verses_count == 0 {
                chapter.verses_count = local_count;
            }
            Some(chapter)
        }
        Err(e) => {
            warn(&format!("Chapter {} details unavailable, using verse count only: {}", surah, e));
            Some(ChapterData {
                id: surah,
                verses_count: local_count,
                ..Default::default()
            })
        }
    }
}

/// Fetch the chapters and verses of every reading.
///
/// A failed verse is logged and left out of its passage. Only a failed token
/// request aborts.
pub fn collect_readings<F: VerseFetcher + ?Sized>(sessions: &[ReadingSession], fetcher: &F) -> Result<InterlinearBook> {
    let mut book = InterlinearBook::default();

    if sessions.iter().all(|s| s.readings.is_empty()) {
        info("No readings in any session");
        return Ok(book);
    }

    let token = fetcher.access_token()?;

    let mut chapters: BTreeMap<u32, Option<ChapterData>> = BTreeMap::new();
    let mut verses: BTreeMap<VerseKey, Option<VerseData>> = BTreeMap::new();

    let pb = progress_bar(sessions.len());

    for session in sessions {
        pb.set_message(format!("Session {}", session.session_number));

        if session.readings.is_empty() {
            debug(&format!("Session {} has no readings", session.session_number));
            pb.inc(1);
            continue;
        }

        let mut passages = Vec::new();
        for reading in &session.readings {
            let chapter = chapters
                .entry(reading.chapter)
                .or_insert_with(|| chapter_info(fetcher, &token, reading.chapter))
                .clone();

            let Some(chapter) = chapter else {
                warn(&format!(
                    "Skipping reading of invalid chapter {} in session {}",
                    reading.chapter, session.session_number
                ));
                continue;
            };

            let selection = reading.selection();
            let numbers = selection.verses(chapter.verses_count);
            if numbers.is_empty() {
                warn(&format!(
                    "No verses of chapter {} selected by {:?} in session {}",
                    reading.chapter, selection, session.session_number
                ));
            }

            let mut passage_verses = Vec::new();
            for ayah in numbers {
                let key = VerseKey::new(reading.chapter, ayah);
                let verse = verses.entry(key).or_insert_with(|| match fetcher.fetch_verse(&token, key) {
                    Ok(response) => {
                        book.fetched += 1;
                        Some(response.verse)
                    }
                    Err(e) => {
                        error(&format!("Failed to fetch verse {}: {}", key, e));
                        book.failed += 1;
                        None
                    }
                });
                if let Some(verse) = verse {
                    passage_verses.push((key, verse.clone()));
                }
            }

            passages.push(Passage {
                chapter,
                selection,
                verses: passage_verses,
            });
        }

        book.sessions.push(SessionPassages {
            session_number: session.session_number,
            passages,
        });
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(book)
}

/// `1st`, `2nd`, `3rd`, `11th`, `22nd` ...
pub fn ordinal(n: u32) -> String {
    let suffix = if (11..=13).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{}{}", n, suffix)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn passage_heading(passage: &Passage) -> String {
    let chapter = &passage.chapter;

    let mut title = format!("Surah {}", chapter.id);
    if !chapter.name_complex.is_empty() {
        title.push_str(&format!(", {}", tex_cleanup_text(&chapter.name_complex)));
    }
    if !chapter.translated_name.name.is_empty() {
        title.push_str(&format!(" ({})", tex_cleanup_text(&chapter.translated_name.name)));
    }

    let verses = match passage.selection {
        VerseSelection::Single(n) => format!("Verse {}", n),
        VerseSelection::Span(first, last) => format!("Verses {} -- {}", first, last),
        VerseSelection::Complete => format!("All Verses (1 -- {})", chapter.verses_count),
    };

    let mut out = format!("\\section{{{} {}}}\n", title, verses);
    if chapter.revelation_order > 0 {
        out.push_str(&format!(
            "\nThe {} revealed Surah. Revealed in {}\n",
            ordinal(chapter.revelation_order),
            tex_cleanup_text(&capitalize(&chapter.revelation_place))
        ));
    }
    out
}

/// Translations in the configured order. With no configured ids, all of them as returned.
fn selected_translations<'a>(verse: &'a VerseData, translation_ids: &[u32]) -> Vec<&'a TranslationText> {
    if translation_ids.is_empty() {
        return verse.translations.iter().collect();
    }
    translation_ids
        .iter()
        .flat_map(move |id| verse.translations.iter().filter(move |t| t.resource_id == *id))
        .collect()
}

fn render_verse(key: VerseKey, verse: &VerseData, translation_ids: &[u32]) -> String {
    let mut out = format!("\n\n\\noindent[\\textbf{{{}}}]\n", key);

    for translation in selected_translations(verse, translation_ids) {
        let name = translation_name(translation.resource_id);
        let text = tex_cleanup_text(&translation.text);
        if name.is_empty() {
            out.push_str(&format!("{}\n\n", text));
        } else {
            out.push_str(&format!("\\textit{{{}}}: {}\n\n", tex_cleanup_text(name), text));
        }
    }

    // Arabic after the translations keeps the verse number at the left of the block.
    if let Some(uthmani) = verse.text_uthmani.as_deref().filter(|t| !t.trim().is_empty()) {
        out.push_str("{\\Large\n\\begin{Arabic}\n");
        out.push_str(&tex_cleanup_text(&remove_arabic_marks(uthmani)));
        out.push_str("\n\\end{Arabic}\n}\n\\vspace{0.5ex}\n\n");
    }

    out
}

/// One chapter per session, one section per reading.
pub fn render_interlinear(book: &InterlinearBook, options: &InterlinearOptions) -> Result<String> {
    let head_options = RenderOptions {
        title: options.title.clone(),
        author: options.author.clone(),
        ..Default::default()
    };
    let mut out = document_head(&head_options)?;

    for session in &book.sessions {
        out.push_str(&format!("\\chapter{{Session {}}}\n", session.session_number));

        for passage in &session.passages {
            out.push_str(&passage_heading(passage));
            for (key, verse) in &passage.verses {
                out.push_str(&render_verse(*key, verse, &options.translation_ids));
            }
        }
    }

    out.push_str("\\end{document}\n");
    Ok(out)
}
