//! Post-hoc structural check of serialized DTBook files.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::Result;
use crate::xml::{local_name, resolve_entity};

/// Element counts and headings found in a serialized DTBook document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// `level1` + `level2` elements.
    pub sections: usize,
    /// `p` elements.
    pub paragraphs: usize,
    /// `pagenum` elements.
    pub page_markers: usize,
    /// `h1`/`h2` text, in document order.
    pub headings: Vec<String>,
}

/// Parse a DTBook document and report its structure.
///
/// A failure here is a report for the caller to surface, never a reason to
/// discard the file that was produced.
pub fn validate_dtbook(content: &str) -> Result<ValidationReport> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut report = ValidationReport::default();
    let mut heading_text: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"level1" | b"level2" => report.sections += 1,
                b"p" => report.paragraphs += 1,
                b"pagenum" => report.page_markers += 1,
                b"h1" | b"h2" => heading_text = Some(String::new()),
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"level1" | b"level2" => report.sections += 1,
                b"p" => report.paragraphs += 1,
                b"pagenum" => report.page_markers += 1,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(text) = heading_text.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(text) = heading_text.as_mut()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    text.push_str(&resolved);
                }
            }
            Ok(Event::End(e)) => {
                if matches!(local_name(e.name().as_ref()), b"h1" | b"h2")
                    && let Some(text) = heading_text.take()
                {
                    report.headings.push(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(report)
}

/// Read and validate a DTBook file on disk.
pub fn validate_dtbook_file<P: AsRef<Path>>(path: P) -> Result<ValidationReport> {
    let content = std::fs::read_to_string(path)?;
    validate_dtbook(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_elements_and_collects_headings() {
        let xml = r#"<?xml version="1.0"?>
<dtbook xmlns="http://www.daisy.org/z3986/2005/dtbook/" version="2005-3">
  <book>
    <bodymatter id="bodymatter">
      <level1 id="sec_1">
        <h1 id="h1_sec_1">First &amp; Last</h1>
        <pagenum id="page_1">1</pagenum>
        <p>One.</p>
        <level2 id="ch_1">
          <h2 id="h2_ch_1">Nested</h2>
          <p>Two.</p>
        </level2>
      </level1>
    </bodymatter>
  </book>
</dtbook>"#;

        let report = validate_dtbook(xml).unwrap();
        assert_eq!(report.sections, 2);
        assert_eq!(report.paragraphs, 2);
        assert_eq!(report.page_markers, 1);
        assert_eq!(report.headings, vec!["First & Last", "Nested"]);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(validate_dtbook("<dtbook><book></dtbook>").is_err());
    }
}
