//! Outline model and section matching.
//!
//! An [`Outline`] is the ordered list of headings a paginated source is
//! expected to contain, usually taken from the source's table of contents.
//! [`match_section`] decides whether a page's text marks the start of one of
//! those headings.

use crate::error::{Error, Result};

/// Heading tokens that qualify a title for the loose numbered-heading rule
/// even though they do not start with a digit.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "PART",
    "PREFACE",
    "FOREWORD",
    "PROLOGUE",
    "INTRODUCTION",
    "EPILOGUE",
    "AFTERWORD",
];

/// DTBook container a section is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Matter {
    Front,
    #[default]
    Body,
    Back,
}

/// One expected section heading.
#[derive(Debug, Clone)]
pub struct OutlineEntry {
    /// Heading text as it should appear in the output document.
    pub title: String,
    /// Nesting level, 1 or 2.
    pub level: u8,
    /// Stable element id, unique within the outline.
    pub id: String,
    /// For level-2 entries, the id of the owning level-1 entry.
    pub parent_id: Option<String>,
    /// Container the section lands in. Defaults to [`Matter::Body`].
    pub matter: Matter,
}

impl OutlineEntry {
    pub fn new(title: impl Into<String>, level: u8, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level,
            id: id.into(),
            parent_id: None,
            matter: Matter::Body,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn in_matter(mut self, matter: Matter) -> Self {
        self.matter = matter;
        self
    }
}

/// Ordered, immutable sequence of expected sections.
///
/// Built once before assembly and read-only afterwards. Entries form a
/// forest in document order: every level-2 entry names a level-1 parent that
/// precedes it in the sequence.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    entries: Vec<OutlineEntry>,
}

impl Outline {
    /// Validate and wrap an entry sequence.
    ///
    /// Fails with [`Error::Configuration`] on duplicate ids, unsupported
    /// levels, or a level-2 entry whose parent is missing, later in the
    /// sequence, or not level 1.
    pub fn new(entries: Vec<OutlineEntry>) -> Result<Self> {
        for (index, entry) in entries.iter().enumerate() {
            if entries[..index].iter().any(|e| e.id == entry.id) {
                return Err(Error::Configuration(format!(
                    "duplicate outline id: {}",
                    entry.id
                )));
            }
            match entry.level {
                1 => {}
                2 => {
                    let parent_id = entry.parent_id.as_deref().ok_or_else(|| {
                        Error::Configuration(format!(
                            "level-2 entry {} has no parent_id",
                            entry.id
                        ))
                    })?;
                    let parent_is_earlier = entries[..index]
                        .iter()
                        .any(|e| e.id == parent_id && e.level == 1);
                    if !parent_is_earlier {
                        return Err(Error::Configuration(format!(
                            "entry {} names parent {} which is not an earlier level-1 entry",
                            entry.id, parent_id
                        )));
                    }
                }
                other => {
                    return Err(Error::Configuration(format!(
                        "entry {} has unsupported level {}",
                        entry.id, other
                    )));
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when any entry nests below another.
    pub fn is_two_level(&self) -> bool {
        self.entries.iter().any(|e| e.level > 1)
    }

    /// Sequence position of the entry with the given id.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

/// Decide whether `page_text` marks the start of an outline entry.
///
/// Entries are scanned in sequence order and the first eligible match wins,
/// never the best textual match. Only entries at `min_allowed_index` or later
/// are eligible, which keeps the section cursor from jumping backward when an
/// earlier title reappears in a running header or a cross-reference.
///
/// An entry matches when its title occurs in the page text
/// (case-insensitively). Titles led by a digit or a structural keyword such
/// as "Part" also match under a looser rule: the leading token opens the
/// page text and at least one other significant title word (longer than two
/// characters) occurs in it. The loose rule can misfire on prose that cites a
/// chapter number; that is an accepted trade-off, kept deterministic by the
/// first-match policy.
pub fn match_section<'a>(
    page_text: &str,
    entries: &'a [OutlineEntry],
    min_allowed_index: usize,
) -> Option<(usize, &'a OutlineEntry)> {
    let text = page_text.trim().to_uppercase();
    if text.is_empty() {
        return None;
    }

    for (index, entry) in entries.iter().enumerate().skip(min_allowed_index) {
        let title = entry.title.trim().to_uppercase();
        if title.is_empty() {
            continue;
        }

        if text.contains(&title) {
            return Some((index, entry));
        }

        if let Some(token) = loose_heading_token(&title)
            && opens_text(&text, token)
            && title
                .split_whitespace()
                .skip(1)
                .any(|word| word.chars().count() > 2 && text.contains(word))
        {
            return Some((index, entry));
        }
    }

    None
}

/// First title token when the title qualifies for the loose rule.
fn loose_heading_token(title: &str) -> Option<&str> {
    let token = title.split_whitespace().next()?;
    let numbered = token.chars().next().is_some_and(|c| c.is_ascii_digit());
    if numbered || STRUCTURAL_KEYWORDS.contains(&token) {
        Some(token)
    } else {
        None
    }
}

/// True when `text` begins with `token` followed by a word boundary.
fn opens_text(text: &str, token: &str) -> bool {
    match text.strip_prefix(token) {
        Some(rest) => rest.chars().next().is_none_or(|c| !c.is_alphanumeric()),
        None => false,
    }
}
