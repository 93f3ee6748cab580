//! LaTeX output for a textbook document and for an OCR transcript.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::config::RenderOptions;
use crate::glossary::{arabic_glossary, english_glossary, GlossaryGroup, GlossaryRow};
use crate::logger::debug;
use crate::ocr_parser::{OcrOutput, Section, TranscriptItem};
use crate::tex_utils::{
    contains_arabic_text, format_arabic_for_tex, markdown_to_tex, remove_arabic_marks, tex_cleanup_text,
    tex_escape_text,
};
use crate::types::{ExerciseEntry, PartOfSpeech, TextType, TextbookDocument, VerseSource};

static PREAMBLE_TEX: &str = include_str!("../assets/templates/preamble.tex");

static TITLE_TEX: &str = "\\title{title_arg}\n\\author{author_arg}\n\n";

static DOCUMENT_START_TEX: &str = "\\begin{document}\n\\maketitle\n\\tableofcontents\n\\clearpage\n\n";

const TRANSLITERATION_NAME: &str = "Transliteration";

#[derive(Serialize)]
struct TitleContext {
    title_arg: String,
    author_arg: String,
}

fn title_block(options: &RenderOptions) -> Result<String> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("title_tex", TITLE_TEX)
        .map_err(|e| anyhow!("Template error in title block: {}", e))?;

    let ctx = TitleContext {
        title_arg: format!("{{{}}}", tex_cleanup_text(&options.title)),
        author_arg: format!("{{{}}}", tex_cleanup_text(&options.author)),
    };

    tt.render("title_tex", &ctx)
        .map_err(|e| anyhow!("Failed to render title block: {}", e))
}

pub(crate) fn document_head(options: &RenderOptions) -> Result<String> {
    let mut out = String::from(PREAMBLE_TEX);
    out.push_str(&title_block(options)?);
    out.push_str(DOCUMENT_START_TEX);
    Ok(out)
}

/// The full document: exercises by chapter, then the Arabic and English glossaries.
pub fn render_document(doc: &TextbookDocument, options: &RenderOptions) -> Result<String> {
    let mut out = document_head(options)?;

    if let Some(name) = doc.lesson.name.as_deref().filter(|n| !n.trim().is_empty()) {
        out.push_str(&format!("\\section{{{}}}\n\n", tex_cleanup_text(name)));
    }

    out.push_str(&render_exercises(&doc.exercises, options));

    if !doc.vocabulary.is_empty() {
        out.push_str("\\section{Glossary - Arabic Alphabetical Order}\n\n");
        out.push_str(&render_glossary_table(&arabic_glossary(&doc.vocabulary), true));

        out.push_str("\\section{Glossary - English Alphabetical Order}\n\n");
        out.push_str(&render_glossary_table(&english_glossary(&doc.vocabulary), false));
    }

    out.push_str("\\end{document}\n");
    Ok(out)
}

/// Exercises grouped by chapter. Exercises without a chapter are left out.
pub fn render_exercises(exercises: &[ExerciseEntry], options: &RenderOptions) -> String {
    let mut chapters: BTreeMap<u32, Vec<&ExerciseEntry>> = BTreeMap::new();
    for exercise in exercises {
        if exercise.chapter == 0 {
            debug(&format!("Skipping exercise {} without a chapter", exercise.exercise_number));
            continue;
        }
        chapters.entry(exercise.chapter).or_default().push(exercise);
    }

    let mut out = String::new();
    for (chapter, mut items) in chapters {
        items.sort_by_key(|e| e.exercise_number);

        out.push_str(&format!("\\chapter{{Chapter {} Exercises}}\n\n", chapter));
        out.push_str("\\begin{enumerate}\n");
        for exercise in items {
            out.push_str(&render_exercise_item(exercise, options));
        }
        out.push_str("\\end{enumerate}\n\n");
    }
    out
}

fn render_reference(reference: &str) -> String {
    let parsed = reference
        .split_once(':')
        .and_then(|(s, a)| Some((s.trim().parse::<u32>().ok()?, a.trim().parse::<u32>().ok()?)));

    match parsed {
        Some((surah, ayah)) => format!(
            "\n\\textbf{{[{s}:{a}]}}\n\\href{{https://quran.com/{s}?startingVerse={a}}}{{Quran.com}}\n\\href{{https://quranwbw.com/morphology?word={s}:{a}}}{{QuranWBW.com}}\n\n",
            s = surah,
            a = ayah
        ),
        None => format!("({})\n\n", tex_escape_text(reference)),
    }
}

fn translation_name(source: &VerseSource) -> &str {
    source.translation_resource_name.as_deref().unwrap_or("")
}

fn render_context(exercise: &ExerciseEntry, translation: &str) -> String {
    let mut out = String::from("\\textbf{Context:} ");
    for line in &exercise.context_lines {
        for source in &line.quranic_sources {
            if source.text_type == TextType::Translation && translation_name(source) == translation {
                out.push_str(&format!("\\textbf{{[{}]:}} {} ", line.ayah, tex_cleanup_text(&source.text)));
            }
        }
    }
    out
}

fn render_exercise_item(exercise: &ExerciseEntry, options: &RenderOptions) -> String {
    let text = exercise.arabic_text.trim();
    let reference = exercise.quranic_reference.trim();
    if text.is_empty() && reference.is_empty() {
        return String::new();
    }

    let mut out = String::from("\\item ");
    if !text.is_empty() {
        out.push_str(&format!("\\arL{{\n{}\n}}", tex_cleanup_text(text)));
    }
    if !reference.is_empty() {
        out.push_str(&render_reference(reference));
    }

    let imlaei = exercise
        .quranic_sources
        .iter()
        .find(|s| s.text_type == TextType::Imlaei && !s.text.trim().is_empty());
    if let Some(source) = imlaei {
        out.push_str(&format!(
            "\\arpar{{\n{}\n}}\n\n",
            tex_cleanup_text(&remove_arabic_marks(&source.text))
        ));
    }

    let mut translations = String::new();
    for source in &exercise.quranic_sources {
        if source.text_type != TextType::Translation || source.text.trim().is_empty() {
            continue;
        }
        let name = translation_name(source);
        let label = format!("\\textit{{{}}}: ", tex_escape_text(name));

        if name == TRANSLITERATION_NAME {
            if options.show_transliteration {
                translations.insert_str(0, &format!("{}{}\n\n", label, tex_cleanup_text(&source.text)));
            }
        } else if options.context_translation.as_deref() == Some(name) {
            translations.push_str(&format!("{}{}\n\n", label, render_context(exercise, name)));
        } else {
            translations.push_str(&format!("{}{}\n\n", label, tex_cleanup_text(&source.text)));
        }
    }
    out.push_str(&translations);

    out
}

fn render_glossary_table(groups: &[GlossaryGroup], arabic_headers: bool) -> String {
    let mut out = String::new();
    out.push_str("\\renewcommand{\\arraystretch}{1.3}\n");
    out.push_str("\\begin{longtable}{p{2.75cm}p{2.75cm}p{2.75cm}p{5.25cm}p{0.5cm}}\n");
    out.push_str("\\textbf{Sing./Perf.} & \\textbf{Dual/Imperf.} & \\textbf{Pl./Verbal N.} & \\textbf{English} & \\textbf{Ch \\#} \\\\\n");
    out.push_str("\\hline\n");
    out.push_str("\\endhead\n");

    for group in groups {
        if group.rows.is_empty() {
            continue;
        }
        let letter = if arabic_headers {
            format!("\\ar{{{}}}", group.letter)
        } else {
            tex_escape_text(&group.letter)
        };
        out.push_str("\\multicolumn{5}{c}{} \\\\\n");
        out.push_str(&format!("\\multicolumn{{5}}{{c}}{{\\Huge \\textbf{{--- {} ---}}}} \\\\\n", letter));
        out.push_str("\\multicolumn{5}{c}{} \\\\\n");

        for row in &group.rows {
            out.push_str(&render_glossary_row(row));
        }
    }

    out.push_str("\\end{longtable}\n\n");
    out
}

fn arabic_cell(text: &str) -> String {
    if text.trim().is_empty() {
        String::new()
    } else {
        format!("\\arL{{{}}}", tex_cleanup_text(&remove_arabic_marks(text)))
    }
}

/// English cell of a glossary row. A row listed under one of several
/// definitions points to the others in a footnote.
fn english_cell(row: &GlossaryRow) -> String {
    let entry = row.entry;
    let Some(definition) = row.definition else {
        return tex_cleanup_text(&entry.english_meanings);
    };

    let mut out = tex_cleanup_text(&definition.text);
    if entry.definitions.len() > 1 {
        let others: Vec<&str> = entry
            .definitions
            .iter()
            .filter(|d| *d != definition && !d.text.is_empty())
            .map(|d| d.text.as_str())
            .collect();
        if !others.is_empty() {
            out.push_str(&format!("\\footnote{{see also: {}}}", tex_cleanup_text(&others.join(", "))));
        }
    }
    out
}

fn render_glossary_row(row: &GlossaryRow) -> String {
    let entry = row.entry;
    let forms = &entry.arabic_forms;

    let mut english = english_cell(row);
    if entry.part_of_speech == PartOfSpeech::Verb {
        if let Some(verb_form) = entry.verb_form.as_deref().filter(|f| !f.is_empty()) {
            english.push_str(&format!(" ({})", tex_cleanup_text(verb_form)));
        }
    }

    let chapter = if entry.chapter > 0 {
        entry.chapter.to_string()
    } else {
        String::new()
    };

    format!(
        "{} & {} & {} & {} & {} \\\\\n",
        arabic_cell(&forms.col1),
        arabic_cell(&forms.col2),
        arabic_cell(&forms.col3),
        english,
        chapter
    )
}

/// Standalone document for the running text of an OCR scan.
pub fn render_transcript(output: &OcrOutput, options: &RenderOptions) -> Result<String> {
    let mut lines: Vec<String> = Vec::new();

    for item in &output.transcript {
        match item {
            TranscriptItem::Chapter(header) => {
                lines.push(format!("\\chapter{{{}}}", tex_cleanup_text(header)));
                lines.push(String::new());
            }
            TranscriptItem::SectionStart(Section::Vocabulary) => {
                lines.push("\\section{Vocabulary}".to_string());
                lines.push(String::new());
            }
            TranscriptItem::SectionStart(Section::Exercises) => {
                lines.push("\\section{Exercises}".to_string());
                lines.push("\\begin{enumerate}".to_string());
            }
            TranscriptItem::SectionStart(Section::Body) => {}
            TranscriptItem::Exercise { text, reference, warning } => {
                let mut line = format!("\\item {}", format_arabic_for_tex(text));
                if !reference.is_empty() {
                    line.push_str(&format!(" [{}]", reference));
                }
                if let Some(warning) = warning {
                    line.push_str(&format!(" % WARNING: {}", warning));
                }
                lines.push(line);
            }
            TranscriptItem::ExercisesEnd => lines.push("\\end{enumerate}".to_string()),
            TranscriptItem::Heading { level, text } => {
                let command = match level {
                    1 => "chapter",
                    2 => "section",
                    3 => "subsection",
                    _ => "subsubsection",
                };
                lines.push(format!("\\{}{{{}}}", command, tex_cleanup_text(text)));
            }
            TranscriptItem::Text(text) => {
                let line = if contains_arabic_text(text) {
                    format_arabic_for_tex(text)
                } else {
                    markdown_to_tex(text)
                };
                let is_command = line.starts_with('\\');
                lines.push(line);
                if !is_command {
                    lines.push(String::new());
                }
            }
        }
    }

    let mut out = document_head(options)?;
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("\\end{document}\n");
    Ok(out)
}
