//! In-memory DTBook document tree.
//!
//! Sections live in an arena indexed by [`SectionId`]; the tree is built
//! append-only during assembly and only read afterwards.

use crate::outline::Matter;

/// Handle to a section in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionId(usize);

/// Book-level descriptive metadata, emitted as DTBook head metas.
#[derive(Debug, Clone, Default)]
pub struct BookInfo {
    pub title: String,
    pub creator: String,
    pub subject: String,
    pub description: String,
    pub publisher: String,
    pub date: String,
    pub identifier: String,
    pub language: String,
}

impl BookInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }
}

/// A child of a section, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Marker carrying a page's 1-based ordinal.
    PageMarker { id: String, number: usize },
    Paragraph(String),
    Section(SectionId),
}

/// A section node: a matter container (level 0) or a leveled heading with
/// its content.
#[derive(Debug, Clone)]
pub struct Section {
    pub level: u8,
    pub id: String,
    /// Heading text; empty for containers and heading-less sections.
    pub title: String,
    pub blocks: Vec<Block>,
}

/// The assembled document: metadata plus a tree of sections rooted in the
/// three matter containers.
#[derive(Debug, Clone)]
pub struct Document {
    pub info: BookInfo,
    sections: Vec<Section>,
    front: SectionId,
    body: SectionId,
    back: SectionId,
}

impl Document {
    pub fn new(info: BookInfo) -> Self {
        let mut doc = Self {
            info,
            sections: Vec::new(),
            front: SectionId(0),
            body: SectionId(0),
            back: SectionId(0),
        };
        doc.front = doc.alloc(0, "frontmatter", String::new());
        doc.body = doc.alloc(0, "bodymatter", String::new());
        doc.back = doc.alloc(0, "backmatter", String::new());
        doc
    }

    pub fn front(&self) -> SectionId {
        self.front
    }

    pub fn body(&self) -> SectionId {
        self.body
    }

    pub fn back(&self) -> SectionId {
        self.back
    }

    pub fn matter(&self, matter: Matter) -> SectionId {
        match matter {
            Matter::Front => self.front,
            Matter::Body => self.body,
            Matter::Back => self.back,
        }
    }

    /// Create a section and append it as a child of `parent`.
    pub fn add_section(
        &mut self,
        parent: SectionId,
        level: u8,
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> SectionId {
        let child = self.alloc(level, id, title.into());
        self.sections[parent.0].blocks.push(Block::Section(child));
        child
    }

    pub fn push_block(&mut self, section: SectionId, block: Block) {
        self.sections[section.0].blocks.push(block);
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }

    /// Find a non-container section by its element id.
    pub fn find_section(&self, id: &str) -> Option<SectionId> {
        self.sections
            .iter()
            .position(|s| s.level > 0 && s.id == id)
            .map(SectionId)
    }

    /// Number of sections, containers excluded.
    pub fn section_count(&self) -> usize {
        self.sections.iter().filter(|s| s.level > 0).count()
    }

    pub fn paragraph_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.blocks)
            .filter(|b| matches!(b, Block::Paragraph(_)))
            .count()
    }

    pub fn page_marker_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.blocks)
            .filter(|b| matches!(b, Block::PageMarker { .. }))
            .count()
    }

    /// Heading texts of all titled sections, in document order.
    pub fn headings(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for container in [self.front, self.body, self.back] {
            self.collect_headings(container, &mut out);
        }
        out
    }

    fn collect_headings<'a>(&'a self, id: SectionId, out: &mut Vec<&'a str>) {
        let section = &self.sections[id.0];
        if section.level > 0 && !section.title.is_empty() {
            out.push(&section.title);
        }
        for block in &section.blocks {
            if let Block::Section(child) = block {
                self.collect_headings(*child, out);
            }
        }
    }

    fn alloc(&mut self, level: u8, id: impl Into<String>, title: String) -> SectionId {
        let next = SectionId(self.sections.len());
        self.sections.push(Section {
            level,
            id: id.into(),
            title,
            blocks: Vec::new(),
        });
        next
    }
}
