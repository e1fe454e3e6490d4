//! DTBook XML serialization.

use std::io;
use std::path::Path;

use crate::document::{Block, Document, SectionId};
use crate::xml::escape_xml;

const DTBOOK_NS: &str = "http://www.daisy.org/z3986/2005/dtbook/";

/// Serialize a [`Document`] to DAISY 3.0 DTBook XML.
///
/// Produces a `dtbook` root with a `head` of `dc:` metas and a `book` body
/// of `frontmatter`/`bodymatter`/`backmatter` containers holding nested
/// `level1`/`level2` sections, `pagenum` markers, and `p` paragraphs in
/// insertion order.
pub fn write_dtbook(doc: &Document) -> String {
    let info = &doc.info;
    let language = if info.language.is_empty() {
        "en"
    } else {
        &info.language
    };

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<dtbook xmlns=\"{}\" version=\"2005-3\" xml:lang=\"{}\">\n",
        DTBOOK_NS,
        escape_xml(language)
    ));

    out.push_str("  <head>\n");
    for (name, content) in [
        ("dc:Title", info.title.as_str()),
        ("dc:Creator", info.creator.as_str()),
        ("dc:Subject", info.subject.as_str()),
        ("dc:Description", info.description.as_str()),
        ("dc:Publisher", info.publisher.as_str()),
        ("dc:Date", info.date.as_str()),
        ("dc:Format", "DAISY 3.0"),
        ("dc:Identifier", info.identifier.as_str()),
        ("dc:Language", language),
    ] {
        out.push_str(&format!(
            "    <meta name=\"{}\" content=\"{}\"/>\n",
            name,
            escape_xml(content)
        ));
    }
    out.push_str("  </head>\n");

    out.push_str("  <book>\n");
    for (container, always) in [(doc.front(), false), (doc.body(), true), (doc.back(), false)] {
        let section = doc.section(container);
        if section.blocks.is_empty() && !always {
            continue;
        }
        out.push_str(&format!("    <{0} id=\"{0}\">\n", section.id));
        for block in &section.blocks {
            write_block(&mut out, doc, block, 3);
        }
        out.push_str(&format!("    </{}>\n", section.id));
    }
    out.push_str("  </book>\n");

    out.push_str("</dtbook>\n");
    out
}

/// Serialize and write to disk.
pub fn write_dtbook_file<P: AsRef<Path>>(doc: &Document, path: P) -> io::Result<()> {
    std::fs::write(path, write_dtbook(doc))
}

fn write_block(out: &mut String, doc: &Document, block: &Block, depth: usize) {
    let indent = "  ".repeat(depth);
    match block {
        Block::PageMarker { id, number } => {
            out.push_str(&format!(
                "{indent}<pagenum id=\"{}\">{number}</pagenum>\n",
                escape_xml(id)
            ));
        }
        Block::Paragraph(text) => {
            out.push_str(&format!("{indent}<p>{}</p>\n", escape_xml(text)));
        }
        Block::Section(child) => write_section(out, doc, *child, depth),
    }
}

fn write_section(out: &mut String, doc: &Document, id: SectionId, depth: usize) {
    let indent = "  ".repeat(depth);
    let section = doc.section(id);
    let level = section.level;

    out.push_str(&format!(
        "{indent}<level{level} id=\"{}\">\n",
        escape_xml(&section.id)
    ));
    if !section.title.is_empty() {
        out.push_str(&format!(
            "{indent}  <h{level} id=\"h{level}_{}\">{}</h{level}>\n",
            escape_xml(&section.id),
            escape_xml(&section.title)
        ));
    }
    for block in &section.blocks {
        write_block(out, doc, block, depth + 1);
    }
    out.push_str(&format!("{indent}</level{level}>\n"));
}
