use std::fs;

use textbook_backend::config::RenderOptions;
use textbook_backend::document_io::write_text_atomic;
use textbook_backend::ingest_document;
use textbook_backend::tex_render::render_document;
use textbook_backend::types::TextbookDocument;

const LESSON_CSV: &str = "\
Page Number,Lesson Number,Ex/Voc,Sing. / Perf.,Dual / Imperf.,Plural / Verbal N.,English Translations,Verb Form,Arabic Text,Exercise Number,Quran Chapter/Surah,Quran Verse/Ayah
20,4,Vocabulary,ثَوْبٌ,,ثِيَابٌ,garment,,,,,
20,4,Vocabulary,بَابٌ,,أَبْوَابٌ,\"door, gate\",,,,,
20,4,Vocabulary,أَمْرٌ,,أُمُورٌ,matter & affair,,,,,
21,4,Exercise,,,,,,وَٱللَّهُ عَلِيمٌ,2,2,282
21,4,Exercise,,,,,,إِنَّ ٱللَّهَ غَفُورٌ,1,2,173
21,3,Exercise,,,,,,قُلْ,1,112,1
";

fn render_lesson() -> String {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lesson4.csv");
    fs::write(&path, LESSON_CSV).unwrap();

    let doc = ingest_document(&path).unwrap();
    render_document(&doc, &RenderOptions::default()).unwrap()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("missing from output: {}", needle))
}

#[test]
fn test_chapters_and_exercise_order() {
    let tex = render_lesson();

    let ch3 = position(&tex, "\\chapter{Chapter 3 Exercises}");
    let ch4 = position(&tex, "\\chapter{Chapter 4 Exercises}");
    assert!(ch3 < ch4);

    let first = position(&tex, "\\textbf{[2:173]}");
    let second = position(&tex, "\\textbf{[2:282]}");
    assert!(ch4 < first && first < second);
}

#[test]
fn test_arabic_glossary_letter_order() {
    let tex = render_lesson();

    let glossary = position(&tex, "\\section{Glossary - Arabic Alphabetical Order}");
    let alif = position(&tex, "--- \\ar{أ} ---");
    let ba = position(&tex, "--- \\ar{ب} ---");
    let tha = position(&tex, "--- \\ar{ث} ---");
    assert!(glossary < alif && alif < ba && ba < tha);
}

#[test]
fn test_english_glossary_rows() {
    let tex = render_lesson();
    let english = &tex[position(&tex, "\\section{Glossary - English Alphabetical Order}")..];

    let d = position(english, "--- D ---");
    let g = position(english, "--- G ---");
    let m = position(english, "--- M ---");
    assert!(d < g && g < m);

    assert!(english.contains("door\\footnote{see also: gate}"));
    assert!(english.contains("gate\\footnote{see also: door}"));
    assert!(english.contains("matter \\& affair"));
    // garment sorts before gate
    assert!(position(english, "& garment &") < position(english, "gate\\footnote"));
}

#[test]
fn test_empty_document_renders() {
    let tex = render_document(&TextbookDocument::default(), &RenderOptions::default()).unwrap();
    assert!(tex.contains("\\begin{document}"));
    assert!(!tex.contains("longtable}{"));
    assert!(tex.ends_with("\\end{document}\n"));
}

#[test]
fn test_written_tex_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("book.tex");
    write_text_atomic(&out, &render_lesson()).unwrap();
    assert!(fs::read_to_string(&out).unwrap().starts_with("\\documentclass"));
}
