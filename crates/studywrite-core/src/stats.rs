/// Document statistics for the writing surface.
use std::sync::OnceLock;

use regex::Regex;

use crate::text::PlainText;

/// Words per minute assumed for the reading-time estimate.
const READING_WPM: usize = 200;

/// Counts shown alongside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentStats {
    pub words: usize,
    pub chars: usize,
    pub lines: usize,
    pub sentences: usize,
    /// Estimated reading time in whole minutes, at least 1 for any
    /// non-empty document.
    pub reading_minutes: usize,
}

fn sentence_end() -> &'static Regex {
    static SENTENCE_END: OnceLock<Regex> = OnceLock::new();
    SENTENCE_END.get_or_init(|| Regex::new(r"[.!?]+(\s|$)").expect("fixed pattern"))
}

/// Computes stats from the current text. Cheap enough to run on demand.
pub fn compute(text: &PlainText) -> DocumentStats {
    let body = text.to_string();
    let words = body.split_whitespace().count();
    let chars = text.len_chars();
    let lines = if text.is_empty() { 0 } else { text.len_lines() };

    let mut sentences = sentence_end().find_iter(&body).count();
    if sentences == 0 && words > 0 {
        sentences = 1;
    }

    let reading_minutes = if words == 0 {
        0
    } else {
        words.div_ceil(READING_WPM).max(1)
    };

    DocumentStats {
        words,
        chars,
        lines,
        sentences,
        reading_minutes,
    }
}
