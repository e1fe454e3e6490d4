//! OPF package parsing and merged-package serialization.
//!
//! Two packaging dialects are in the wild for DAISY parts: the legacy OEB
//! 1.2 package and OPF 2.0. The dialect is sniffed once from the first
//! part's root namespace and carried through the merge explicitly.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::xml::{escape_xml, local_name};

use super::MergedBook;

const OEB_NS: &str = "http://openebook.org/namespaces/oeb-package/1.0/";
const OPF_NS: &str = "http://www.idpf.org/2007/opf";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

const OEB_DOCTYPE: &str = "<!DOCTYPE package PUBLIC \"+//ISBN 0-9673008-1-9//DTD OEB 1.2 Package//EN\" \"http://openebook.org/dtds/oeb-1.2/oebpkg12.dtd\">";

/// Packaging dialect of a part, detected from its package namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagingDialect {
    /// OEB 1.2, which requires a doctype preamble.
    Oeb,
    /// OPF 2.0.
    Opf,
}

impl PackagingDialect {
    fn from_namespace(uri: &str) -> Self {
        if uri == OEB_NS {
            PackagingDialect::Oeb
        } else {
            PackagingDialect::Opf
        }
    }

    pub fn namespace(self) -> &'static str {
        match self {
            PackagingDialect::Oeb => OEB_NS,
            PackagingDialect::Opf => OPF_NS,
        }
    }
}

/// One manifest item with the attributes the merge preserves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub fallback: Option<String>,
    pub properties: Option<String>,
}

/// A parsed package document.
#[derive(Debug, Clone)]
pub struct PackageDoc {
    pub dialect: PackagingDialect,
    pub unique_identifier: String,
    /// Inner XML of the metadata block, verbatim.
    pub metadata_xml: String,
    pub manifest: Vec<ManifestItem>,
    pub spine: Vec<String>,
}

/// Parse an OPF/OEB package document.
///
/// Fails with [`Error::Configuration`] when the manifest or spine element is
/// missing; a part without them cannot be merged.
pub fn read_package(content: &str) -> Result<PackageDoc> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut dialect = PackagingDialect::Opf;
    let mut unique_identifier = String::from("uid");
    let mut metadata_xml = String::new();
    let mut manifest = Vec::new();
    let mut spine = Vec::new();
    let mut saw_manifest = false;
    let mut saw_spine = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"package" => {
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"xmlns" => {
                                dialect = PackagingDialect::from_namespace(
                                    &String::from_utf8_lossy(attr.value.as_ref()),
                                );
                            }
                            b"unique-identifier" => {
                                unique_identifier = String::from_utf8(attr.value.to_vec())?;
                            }
                            _ => {}
                        }
                    }
                }
                b"metadata" => {
                    // Capture the block verbatim; it is spliced, not merged.
                    let span = reader.read_to_end(e.name())?;
                    metadata_xml = content[span.start as usize..span.end as usize]
                        .trim()
                        .to_string();
                }
                b"manifest" => saw_manifest = true,
                b"spine" => saw_spine = true,
                b"item" => {
                    if let Some(item) = parse_item(&e)? {
                        manifest.push(item);
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attribute(&e, b"idref")? {
                        spine.push(idref);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"manifest" => saw_manifest = true,
                b"spine" => saw_spine = true,
                b"metadata" => {}
                b"item" => {
                    if let Some(item) = parse_item(&e)? {
                        manifest.push(item);
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attribute(&e, b"idref")? {
                        spine.push(idref);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    if !saw_manifest || !saw_spine {
        return Err(Error::Configuration(
            "package is missing its manifest or spine".into(),
        ));
    }

    Ok(PackageDoc {
        dialect,
        unique_identifier,
        metadata_xml,
        manifest,
        spine,
    })
}

fn parse_item(e: &quick_xml::events::BytesStart<'_>) -> Result<Option<ManifestItem>> {
    let mut id = String::new();
    let mut href = String::new();
    let mut media_type = String::new();
    let mut fallback = None;
    let mut properties = None;

    for attr in e.attributes().flatten() {
        let value = String::from_utf8(attr.value.to_vec())?;
        match attr.key.as_ref() {
            b"id" => id = value,
            b"href" => href = value,
            b"media-type" => media_type = value,
            b"fallback" => fallback = Some(value),
            b"properties" => properties = Some(value),
            _ => {}
        }
    }

    // Items without an id or href cannot be referenced; skip them.
    if id.is_empty() || href.is_empty() {
        return Ok(None);
    }
    Ok(Some(ManifestItem {
        id,
        href,
        media_type,
        fallback,
        properties,
    }))
}

fn attribute(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(String::from_utf8(attr.value.to_vec())?));
        }
    }
    Ok(None)
}

/// Serialize the merged package in the dialect of the first part, with the
/// OEB 1.2 doctype preamble when that dialect requires one.
pub fn write_package(merged: &MergedBook) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    if merged.dialect == PackagingDialect::Oeb {
        out.push_str(OEB_DOCTYPE);
        out.push('\n');
    }

    out.push_str(&format!(
        "<package xmlns=\"{}\" xmlns:dc=\"{}\" unique-identifier=\"{}\">\n",
        merged.dialect.namespace(),
        DC_NS,
        escape_xml(&merged.unique_identifier)
    ));

    out.push_str("  <metadata>\n");
    if !merged.metadata_xml.is_empty() {
        out.push_str("    ");
        out.push_str(&merged.metadata_xml);
        out.push('\n');
    }
    out.push_str("  </metadata>\n");

    out.push_str("  <manifest>\n");
    for item in &merged.manifest {
        out.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\"",
            escape_xml(&item.id),
            escape_xml(&item.href)
        ));
        if !item.media_type.is_empty() {
            out.push_str(&format!(" media-type=\"{}\"", escape_xml(&item.media_type)));
        }
        if let Some(ref fallback) = item.fallback {
            out.push_str(&format!(" fallback=\"{}\"", escape_xml(fallback)));
        }
        if let Some(ref properties) = item.properties {
            out.push_str(&format!(" properties=\"{}\"", escape_xml(properties)));
        }
        out.push_str("/>\n");
    }
    out.push_str("  </manifest>\n");

    out.push_str(&format!("  <spine toc=\"{}\">\n", super::MERGED_NAV_ID));
    for idref in &merged.spine {
        out.push_str(&format!(
            "    <itemref idref=\"{}\"/>\n",
            escape_xml(idref)
        ));
    }
    out.push_str("  </spine>\n</package>\n");
    out
}
