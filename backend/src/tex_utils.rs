//! Text helpers for LaTeX output: escaping, Arabic mark removal, inline markdown.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Inline Arabic is wrapped in `\ar{}` below this many characters, `\arpar{}` from it.
pub const INLINE_ARABIC_MAX_CHARS: usize = 50;

lazy_static! {
    static ref FOOTNOTE_RE: Regex = Regex::new(r"<sup foot_note=\d+>\d+</sup>").unwrap();
    static ref ARABIC_RE: Regex = Regex::new(r"\p{scx=Arabic}").unwrap();
    static ref ARABIC_WORD_RE: Regex = Regex::new(r"\p{scx=Arabic}+").unwrap();
    static ref MARKDOWN_RE: Regex =
        Regex::new(r"\*\*(?P<b1>.+?)\*\*|__(?P<b2>.+?)__|\*(?P<i1>.+?)\*|_(?P<i2>.+?)_|`(?P<code>.+?)`").unwrap();
}

/// Quranic annotation marks that clutter printed text (small high ligatures and signs).
pub fn is_arabic_mark(c: char) -> bool {
    matches!(c, '\u{06D6}'..='\u{06DC}' | '\u{06E0}'..='\u{06E8}')
}

pub fn remove_arabic_marks(text: &str) -> String {
    text.chars().filter(|c| !is_arabic_mark(*c)).collect()
}

pub fn contains_arabic_text(text: &str) -> bool {
    ARABIC_RE.is_match(text)
}

/// Maximal runs of Arabic-script characters.
pub fn arabic_words(text: &str) -> impl Iterator<Item = &str> {
    ARABIC_WORD_RE.find_iter(text).map(|m| m.as_str())
}

/// Drop footnote tags and escape LaTeX special characters.
pub fn tex_escape_text(text: &str) -> String {
    let text = FOOTNOTE_RE.replace_all(text, "");

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape, then set the ﷺ ligature in the Arabic font.
pub fn tex_cleanup_text(text: &str) -> String {
    tex_escape_text(text).replace('ﷺ', r"(\ar{ﷺ})")
}

/// Arabic text inline when short, as a paragraph when long. Non-Arabic text is only escaped.
pub fn format_arabic_for_tex(text: &str) -> String {
    if !contains_arabic_text(text) {
        return tex_cleanup_text(text);
    }

    if text.chars().count() < INLINE_ARABIC_MAX_CHARS {
        format!(r"\ar{{{}}}", tex_cleanup_text(text))
    } else {
        format!("\\arpar{{\n{}\n}}", tex_cleanup_text(&remove_arabic_marks(text)))
    }
}

/// Convert `**bold**`, `__bold__`, `*italic*`, `_italic_` and `` `code` `` to
/// LaTeX, escaping everything else.
pub fn markdown_to_tex(line: &str) -> String {
    let mut out = String::new();
    let mut last = 0;

    for caps in MARKDOWN_RE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&tex_cleanup_text(&line[last..whole.start()]));
        out.push_str(&markdown_span(&caps));
        last = whole.end();
    }
    out.push_str(&tex_cleanup_text(&line[last..]));

    out
}

fn markdown_span(caps: &Captures) -> String {
    let wrap = |cmd: &str, name: &str| caps.name(name).map(|m| format!(r"\{}{{{}}}", cmd, tex_cleanup_text(m.as_str())));

    wrap("textbf", "b1")
        .or_else(|| wrap("textbf", "b2"))
        .or_else(|| wrap("textit", "i1"))
        .or_else(|| wrap("textit", "i2"))
        .or_else(|| wrap("texttt", "code"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tex_escape_text() {
        assert_eq!(tex_escape_text("50% & $5 #1 a_b"), r"50\% \& \$5 \#1 a\_b");
        assert_eq!(tex_escape_text(r"a\b{c}"), r"a\textbackslash{}b\{c\}");
        assert_eq!(tex_escape_text("x^2 ~y"), r"x\textasciicircum{}2 \textasciitilde{}y");
        assert_eq!(tex_escape_text("God<sup foot_note=12>12</sup> is"), "God is");
    }

    #[test]
    fn test_tex_cleanup_text() {
        assert_eq!(tex_cleanup_text("Muhammad ﷺ said"), r"Muhammad (\ar{ﷺ}) said");
    }

    #[test]
    fn test_remove_arabic_marks() {
        let text = "ٱلرَّحِيمِ\u{06D6} ذَٰلِكَ\u{06E2}";
        assert_eq!(remove_arabic_marks(text), "ٱلرَّحِيمِ ذَٰلِكَ");
    }

    #[test]
    fn test_contains_arabic_text() {
        assert!(contains_arabic_text("the word كِتَاب"));
        assert!(!contains_arabic_text("kitāb, a book"));
    }

    #[test]
    fn test_format_arabic_for_tex() {
        assert_eq!(format_arabic_for_tex("kitab"), "kitab");
        assert_eq!(format_arabic_for_tex("كِتَاب"), r"\ar{كِتَاب}");

        let long = "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ ٱلْحَمْدُ لِلَّهِ رَبِّ ٱلْعَٰلَمِينَ";
        let out = format_arabic_for_tex(long);
        assert!(out.starts_with("\\arpar{\n"));
        assert!(out.ends_with("\n}"));
    }

    #[test]
    fn test_markdown_to_tex() {
        assert_eq!(markdown_to_tex("a **bold** word"), r"a \textbf{bold} word");
        assert_eq!(markdown_to_tex("an _italic_ 100%"), r"an \textit{italic} 100\%");
        assert_eq!(markdown_to_tex("`x_y`"), r"\texttt{x\_y}");
        assert_eq!(markdown_to_tex("no markup"), "no markup");
    }

    #[test]
    fn test_arabic_words() {
        let words: Vec<&str> = arabic_words("1. قُلْ هُوَ [112:1]").collect();
        assert_eq!(words, vec!["قُلْ", "هُوَ"]);
    }
}
