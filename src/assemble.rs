//! Page-by-page document assembly.
//!
//! The assembler walks a paginated text stream once, tracking its position in
//! the outline with a cursor that only ever moves forward. Matching an
//! earlier section again (in a running header, say) can therefore never send
//! content backward in the document.

use crate::document::{Block, BookInfo, Document, SectionId};
use crate::outline::{Outline, match_section};
use crate::text::{normalize_page, split_paragraphs};

/// Knobs for one assembly run.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Number of leading pages (cover, imprint) to drop.
    pub skip_leading_pages: usize,
    /// Last page to process; everything after is dropped.
    pub skip_trailing_after_page: Option<usize>,
    /// Sentences grouped into each output paragraph.
    pub sentences_per_paragraph: usize,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            skip_leading_pages: 0,
            skip_trailing_after_page: None,
            sentences_per_paragraph: 4,
        }
    }
}

/// Builds a [`Document`] from a stream of raw page texts.
pub struct Assembler {
    outline: Outline,
    options: AssembleOptions,
}

impl Assembler {
    pub fn new(outline: Outline, options: AssembleOptions) -> Self {
        Self { outline, options }
    }

    /// Assemble pages into a document tree.
    ///
    /// Pages are 1-indexed by iteration order. The loop is total: a malformed
    /// page contributes zero or more paragraphs, never an error. With an
    /// empty outline every page lands in a single default body section.
    pub fn assemble<I, S>(&self, info: BookInfo, pages: I) -> Document
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut doc = Document::new(info);
        let entries = self.outline.entries();
        let two_level = self.outline.is_two_level();

        // Level-1 sections exist up front, pre-populated with their headings;
        // level-2 sections are created on first match.
        let mut section_nodes: Vec<Option<SectionId>> = vec![None; entries.len()];
        for (index, entry) in entries.iter().enumerate() {
            if entry.level == 1 {
                let parent = doc.matter(entry.matter);
                section_nodes[index] =
                    Some(doc.add_section(parent, 1, entry.id.clone(), entry.title.clone()));
            }
        }

        // Cursor state. Flat outlines start positioned at the first entry;
        // two-level outlines start before any entry, with content flowing
        // into the body container until the first match.
        let (mut current_index, mut current_node): (isize, SectionId) =
            match section_nodes.first().copied().flatten() {
                Some(first) if !two_level => (0, first),
                _ if entries.is_empty() => {
                    (-1, doc.add_section(doc.body(), 1, "sec_1", String::new()))
                }
                _ => (-1, doc.body()),
            };

        for (ordinal, page) in pages.into_iter().enumerate() {
            let number = ordinal + 1;
            if number <= self.options.skip_leading_pages {
                continue;
            }
            if let Some(last) = self.options.skip_trailing_after_page
                && number > last
            {
                break;
            }

            let text = normalize_page(page.as_ref(), &doc.info);
            if text.is_empty() {
                continue;
            }

            let floor = current_index.max(0) as usize;
            let matched = match_section(&text, entries, floor);

            if let Some((index, entry)) = matched
                && index as isize > current_index
            {
                current_index = index as isize;
                current_node = match section_nodes[index] {
                    Some(existing) => existing,
                    None => {
                        let parent = entry
                            .parent_id
                            .as_deref()
                            .and_then(|pid| self.outline.position_of(pid))
                            .and_then(|pos| section_nodes[pos])
                            .unwrap_or_else(|| doc.body());
                        let created =
                            doc.add_section(parent, entry.level, entry.id.clone(), entry.title.clone());
                        section_nodes[index] = Some(created);
                        created
                    }
                };
            }

            doc.push_block(
                current_node,
                Block::PageMarker {
                    id: format!("page_{number}"),
                    number,
                },
            );

            let content = match matched {
                Some((_, entry)) => strip_title_prefix(&text, &entry.title),
                None => text.as_str(),
            };
            for paragraph in split_paragraphs(content, self.options.sentences_per_paragraph) {
                doc.push_block(current_node, Block::Paragraph(paragraph));
            }
        }

        doc
    }
}

/// When the page opens with the matched heading, drop the heading so it is
/// not duplicated as a paragraph. Case-insensitive, char by char.
fn strip_title_prefix<'a>(text: &'a str, title: &str) -> &'a str {
    let title = title.trim();
    if title.is_empty() {
        return text;
    }

    let mut text_chars = text.char_indices();
    for title_char in title.chars() {
        match text_chars.next() {
            Some((_, c)) if chars_match(c, title_char) => {}
            _ => return text,
        }
    }

    match text_chars.next() {
        // Heading must end at a boundary, not inside a word.
        Some((index, c)) if !c.is_alphanumeric() => text[index..].trim_start(),
        None => "",
        Some(_) => text,
    }
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
