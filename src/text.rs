//! Page text cleanup and paragraph segmentation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::BookInfo;

/// Fallback chunk size when a page has no sentence boundaries at all.
const WORDS_PER_CHUNK: usize = 150;

/// Bare "N/M" page-counter lines left behind by text extraction.
static PAGE_COUNTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+/\d+$").unwrap());

/// Footer of the form "Page 12/340 http://example.com/...".
static PAGE_FOOTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\w+\s+\d+/\d+\s+https?://\S+").unwrap());

/// Stray URLs injected by the source site.
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+").unwrap());

/// Clean one page of raw extracted text.
///
/// Drops blank lines, page-counter lines, and running-header lines that
/// repeat the book title or creator; strips footer URLs; removes characters
/// outside letters, digits, whitespace, and basic punctuation; and collapses
/// all whitespace to single spaces. Total over any input.
pub fn normalize_page(text: &str, info: &BookInfo) -> String {
    let mut kept: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || PAGE_COUNTER.is_match(line) {
            continue;
        }
        if !info.title.is_empty() && line.contains(&info.title) {
            continue;
        }
        if !info.creator.is_empty() && line.contains(&info.creator) {
            continue;
        }

        let line = PAGE_FOOTER.replace_all(line, "");
        let line = URL.replace_all(&line, "");
        let filtered: String = line.chars().filter(|&c| is_allowed(c)).collect();
        if !filtered.trim().is_empty() {
            kept.push(filtered);
        }
    }

    kept.join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || ".,!?;:()-\"'".contains(c)
}

/// Split cleaned text into paragraphs of roughly `sentences_per_paragraph`
/// sentences each.
///
/// Sentences end at `.`, `!`, or `?` followed by whitespace. When the text
/// has no sentence boundaries at all it is chunked by word count instead, so
/// any non-empty input yields at least one non-empty paragraph.
pub fn split_paragraphs(text: &str, sentences_per_paragraph: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let per_paragraph = sentences_per_paragraph.max(1);

    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for sentence in split_sentences(text) {
        current.push(sentence);
        if current.len() >= per_paragraph {
            paragraphs.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    if paragraphs.is_empty() {
        let words: Vec<&str> = text.split_whitespace().collect();
        for chunk in words.chunks(WORDS_PER_CHUNK) {
            paragraphs.push(chunk.join(" "));
        }
    }

    paragraphs
}

/// Split at sentence terminators followed by whitespace. The trailing
/// fragment is kept even without a terminator.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?')
            && chars.peek().is_some_and(|&(_, next)| next.is_whitespace())
        {
            let end = index + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BookInfo {
        BookInfo::new("The Perfect Spy").with_creator("L. Berman")
    }

    #[test]
    fn drops_page_counters_and_running_headers() {
        let raw = "The Perfect Spy\n12/657\nActual content line.\nL. Berman\n";
        assert_eq!(normalize_page(raw, &info()), "Actual content line.");
    }

    #[test]
    fn strips_urls_and_footers() {
        let raw = "Some text https://example.com/book more\nPage 3/10 http://mirror.example/x\n";
        assert_eq!(normalize_page(raw, &info()), "Some text more");
    }

    #[test]
    fn removes_disallowed_characters() {
        let raw = "Text with №strange• glyphs — kept: punctuation, (parens)!";
        let cleaned = normalize_page(raw, &info());
        assert!(!cleaned.contains('№'));
        assert!(!cleaned.contains('•'));
        assert!(cleaned.contains("(parens)!"));
    }

    #[test]
    fn collapses_whitespace_across_lines() {
        let raw = "first   part\nsecond\tpart\n";
        assert_eq!(normalize_page(raw, &info()), "first part second part");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        let raw = "Thành Cát Tư Hãn được nhắc đến.";
        assert_eq!(normalize_page(raw, &info()), raw);
    }

    #[test]
    fn groups_sentences_per_paragraph() {
        let text = "One. Two. Three. Four. Five.";
        let paragraphs = split_paragraphs(text, 2);
        assert_eq!(paragraphs, vec!["One. Two.", "Three. Four.", "Five."]);
    }

    #[test]
    fn text_without_terminators_is_one_paragraph() {
        let paragraphs = split_paragraphs("no sentence boundary here", 4);
        assert_eq!(paragraphs, vec!["no sentence boundary here"]);
    }

    #[test]
    fn long_unpunctuated_text_falls_back_to_word_chunks() {
        let word = "word ";
        let text = word.repeat(320);
        let mut paragraphs = split_paragraphs(&text, 4);
        // One unbroken "sentence" survives as a single paragraph; the chunk
        // fallback only engages when sentence splitting yields nothing.
        assert_eq!(paragraphs.len(), 1);

        paragraphs = split_paragraphs("...", 4);
        assert_eq!(paragraphs, vec!["..."]);
    }

    #[test]
    fn empty_input_yields_no_paragraphs() {
        assert!(split_paragraphs("", 4).is_empty());
        assert!(split_paragraphs("   ", 4).is_empty());
    }

    #[test]
    fn consecutive_terminators_split_once() {
        let paragraphs = split_paragraphs("Really?! Yes. Fine.", 1);
        assert_eq!(paragraphs, vec!["Really?!", "Yes.", "Fine."]);
    }
}
