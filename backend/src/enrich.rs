//! Attaching Quran verse texts and translations to document entries.
//!
//! All referenced verses, including the context window around each exercise,
//! are collected first and fetched once each. Attachment happens after every
//! fetch has finished.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::EnrichOptions;
use crate::logger::{error, info};
use crate::quran_api::{translation_name, verse_url, VerseData, VerseFetcher, SOURCE_NAME};
use crate::quran_data::{sequential_ayah, VerseKey};
use crate::types::{ContextLine, TextType, TextbookDocument, VerseSource};

/// Counts from one enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub unique_keys: usize,
    pub fetched: usize,
    pub failed: usize,
    /// Number of verse sources appended across all entries.
    pub attached: usize,
}

/// Verses from `before` ayahs before to `after` ayahs after `key`, including
/// `key` itself. Runs across surah boundaries, stops at the ends of the Quran.
pub fn context_window(key: VerseKey, before: u32, after: u32) -> Vec<VerseKey> {
    (-(before as i64)..=after as i64)
        .filter_map(|offset| sequential_ayah(key.surah, key.ayah, offset))
        .collect()
}

/// Set the context lines of each exercise and collect every verse key in the document.
pub fn collect_verse_keys(doc: &mut TextbookDocument, options: &EnrichOptions) -> BTreeSet<VerseKey> {
    let mut keys = BTreeSet::new();

    for vocab in &doc.vocabulary {
        if let Some(key) = VerseKey::from_nonzero(vocab.surah, vocab.ayah) {
            keys.insert(key);
        }
    }

    for exercise in doc.exercises.iter_mut() {
        let Some(key) = VerseKey::from_nonzero(exercise.surah, exercise.ayah) else {
            continue;
        };
        keys.insert(key);

        for ctx in context_window(key, options.context_before, options.context_after) {
            keys.insert(ctx);
            let known = exercise
                .context_lines
                .iter()
                .any(|l| l.surah == ctx.surah && l.ayah == ctx.ayah);
            if !known {
                exercise.context_lines.push(ContextLine {
                    surah: ctx.surah,
                    ayah: ctx.ayah,
                    quranic_sources: Vec::new(),
                });
            }
        }
    }

    keys
}

/// One source per text variant present, then one per translation.
pub fn verse_sources(key: VerseKey, verse: &VerseData) -> Vec<VerseSource> {
    let url = verse_url(key);
    let mut sources = Vec::new();

    let variants = [
        (TextType::Indopak, &verse.text_indopak),
        (TextType::Uthmani, &verse.text_uthmani),
        (TextType::Imlaei, &verse.text_imlaei),
    ];
    for (text_type, text) in variants {
        if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
            sources.push(VerseSource {
                source_name: SOURCE_NAME.to_string(),
                source_url: url.clone(),
                text_type,
                language: "arabic".to_string(),
                text: text.to_string(),
                translation_resource_id: None,
                translation_resource_name: None,
            });
        }
    }

    for translation in &verse.translations {
        sources.push(VerseSource {
            source_name: SOURCE_NAME.to_string(),
            source_url: url.clone(),
            text_type: TextType::Translation,
            language: "english".to_string(),
            text: translation.text.clone(),
            translation_resource_id: Some(translation.resource_id),
            translation_resource_name: Some(translation_name(translation.resource_id).to_string()),
        });
    }

    sources
}

/// Append `new` to `existing`. With `dedupe`, sources whose identity is
/// already present are skipped. Returns how many were appended.
pub fn attach_sources(existing: &mut Vec<VerseSource>, new: &[VerseSource], dedupe: bool) -> usize {
    let mut count = 0;
    for source in new {
        if dedupe && existing.iter().any(|s| s.identity() == source.identity()) {
            continue;
        }
        existing.push(source.clone());
        count += 1;
    }
    count
}

pub(crate) fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}") {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Fetch every referenced verse once and attach the results.
///
/// A failed fetch is logged and leaves the affected entries without sources.
/// Only a failed token request aborts the run.
pub fn enrich_document<F: VerseFetcher + ?Sized>(
    doc: &mut TextbookDocument,
    fetcher: &F,
    options: &EnrichOptions,
) -> Result<EnrichReport> {
    let keys = collect_verse_keys(doc, options);
    let mut report = EnrichReport {
        unique_keys: keys.len(),
        ..Default::default()
    };

    if keys.is_empty() {
        info("No verse references to enrich");
        return Ok(report);
    }

    let token = fetcher.access_token()?;

    let mut cache: BTreeMap<VerseKey, Vec<VerseSource>> = BTreeMap::new();
    let pb = progress_bar(keys.len());
    pb.set_message("Fetching verses");

    for key in &keys {
        match fetcher.fetch_verse(&token, *key) {
            Ok(response) => {
                cache.insert(*key, verse_sources(*key, &response.verse));
                report.fetched += 1;
            }
            Err(e) => {
                error(&format!("Failed to fetch verse {}: {}", key, e));
                report.failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    let dedupe = options.dedupe_sources;

    for vocab in doc.vocabulary.iter_mut() {
        if let Some(sources) = VerseKey::from_nonzero(vocab.surah, vocab.ayah).and_then(|k| cache.get(&k)) {
            report.attached += attach_sources(&mut vocab.quranic_sources, sources, dedupe);
        }
    }

    for exercise in doc.exercises.iter_mut() {
        if let Some(sources) = VerseKey::from_nonzero(exercise.surah, exercise.ayah).and_then(|k| cache.get(&k)) {
            report.attached += attach_sources(&mut exercise.quranic_sources, sources, dedupe);
        }
        for line in exercise.context_lines.iter_mut() {
            if let Some(sources) = VerseKey::from_nonzero(line.surah, line.ayah).and_then(|k| cache.get(&k)) {
                report.attached += attach_sources(&mut line.quranic_sources, sources, dedupe);
            }
        }
    }

    info(&format!(
        "Enriched {} verses ({} failed), attached {} sources",
        report.fetched, report.failed, report.attached
    ));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quran_api::TranslationText;

    #[test]
    fn test_context_window_crosses_surahs() {
        let window = context_window(VerseKey::new(2, 286), 1, 1);
        assert_eq!(window, vec![VerseKey::new(2, 285), VerseKey::new(2, 286), VerseKey::new(3, 1)]);

        let start = context_window(VerseKey::new(1, 1), 1, 1);
        assert_eq!(start, vec![VerseKey::new(1, 1), VerseKey::new(1, 2)]);
    }

    #[test]
    fn test_verse_sources() {
        let verse = VerseData {
            text_indopak: None,
            text_uthmani: Some("قُلْ هُوَ ٱللَّهُ أَحَدٌ".to_string()),
            text_imlaei: Some("قُلْ هُوَ اللَّهُ أَحَدٌ".to_string()),
            translations: vec![
                TranslationText { resource_id: 19, text: "Say: He is Allah, the One!".to_string() },
                TranslationText { resource_id: 4242, text: "?".to_string() },
            ],
        };
        let sources = verse_sources(VerseKey::new(112, 1), &verse);
        assert_eq!(sources.len(), 4);
        assert_eq!(sources[0].text_type, TextType::Uthmani);
        assert_eq!(sources[0].source_url, "https://quran.com/112?startingVerse=1");
        assert_eq!(sources[2].translation_resource_name.as_deref(), Some("M. Pickthall"));
        assert_eq!(sources[3].translation_resource_name.as_deref(), Some(""));
    }

    #[test]
    fn test_attach_sources_dedupe() {
        let verse = VerseData {
            text_uthmani: Some("نص".to_string()),
            ..Default::default()
        };
        let new = verse_sources(VerseKey::new(1, 1), &verse);
        let mut existing = Vec::new();

        assert_eq!(attach_sources(&mut existing, &new, false), 1);
        assert_eq!(attach_sources(&mut existing, &new, false), 1);
        assert_eq!(existing.len(), 2);

        assert_eq!(attach_sources(&mut existing, &new, true), 0);
        assert_eq!(existing.len(), 2);
    }
}
