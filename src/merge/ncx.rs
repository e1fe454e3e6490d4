//! NCX navigation parsing, remapping, and merged-map serialization.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::Result;
use crate::xml::{escape_xml, local_name, resolve_entity};

use super::MergedBook;

const NCX_NS: &str = "http://www.daisy.org/z3986/2005/ncx/";

/// One navigation point: label, target, and nested children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub id: String,
    pub label: String,
    pub src: String,
    /// Global reading-order position, assigned when the merged tree is
    /// complete.
    pub play_order: usize,
    pub children: Vec<NavPoint>,
}

/// Parse an NCX document into its top-level navigation points.
///
/// Points missing an id, label, or content target are dropped along with
/// their subtrees.
pub fn read_nav(content: &str) -> Result<Vec<NavPoint>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    struct NavPointState {
        id: Option<String>,
        text: Option<String>,
        src: Option<String>,
        play_order: usize,
        children: Vec<NavPoint>,
    }

    let mut stack: Vec<NavPointState> = vec![NavPointState {
        id: None,
        text: None,
        src: None,
        play_order: 0,
        children: Vec::new(),
    }];
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navPoint" => {
                    let mut id = None;
                    let mut play_order = 0;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"id" => id = Some(String::from_utf8(attr.value.to_vec())?),
                            b"playOrder" => {
                                play_order = String::from_utf8_lossy(attr.value.as_ref())
                                    .parse()
                                    .unwrap_or(0);
                            }
                            _ => {}
                        }
                    }
                    stack.push(NavPointState {
                        id,
                        text: None,
                        src: None,
                        play_order,
                        children: Vec::new(),
                    });
                }
                b"text" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"content" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"src"
                            && let Some(state) = stack.last_mut()
                        {
                            state.src = Some(String::from_utf8(attr.value.to_vec())?);
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text && let Some(state) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    match &mut state.text {
                        Some(existing) => existing.push_str(&raw),
                        None => state.text = Some(raw.into_owned()),
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                    && let Some(state) = stack.last_mut()
                {
                    match &mut state.text {
                        Some(existing) => existing.push_str(&resolved),
                        None => state.text = Some(resolved),
                    }
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"text" => in_text = false,
                b"navPoint" => {
                    if let Some(state) = stack.pop()
                        && let (Some(id), Some(label), Some(src)) =
                            (state.id, state.text, state.src)
                        && let Some(parent) = stack.last_mut()
                    {
                        parent.children.push(NavPoint {
                            id,
                            label,
                            src,
                            play_order: state.play_order,
                            children: state.children,
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
    }

    Ok(stack.pop().map(|s| s.children).unwrap_or_default())
}

/// Clone a navigation subtree for part `ordinal`, remapping every id and
/// rewriting every content path into the part's copy subdirectory. Fragment
/// identifiers survive unchanged. Returns a new owned tree; the source is
/// untouched.
pub fn clone_and_remap(point: &NavPoint, ordinal: usize) -> NavPoint {
    let (base, fragment) = match point.src.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (point.src.as_str(), None),
    };
    let base = base.replace('\\', "/");
    let src = match fragment {
        Some(fragment) => format!("parts/part_{ordinal:02}/{base}#{fragment}"),
        None => format!("parts/part_{ordinal:02}/{base}"),
    };

    NavPoint {
        id: format!("p{}_{}", ordinal, point.id),
        label: point.label.clone(),
        src,
        play_order: 0,
        children: point
            .children
            .iter()
            .map(|child| clone_and_remap(child, ordinal))
            .collect(),
    }
}

/// Number points 1..K in depth-first pre-order, the same order in which they
/// serialize.
pub(super) fn assign_play_order(points: &mut [NavPoint], next: &mut usize) {
    for point in points {
        *next += 1;
        point.play_order = *next;
        assign_play_order(&mut point.children, next);
    }
}

/// Serialize the merged navigation map.
pub fn write_nav(merged: &MergedBook, title: &str) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<ncx xmlns=\"{}\" version=\"2005-1\">\n",
        NCX_NS
    ));

    out.push_str("  <head>\n");
    for (name, content) in [
        ("dtb:uid", "uid-merged"),
        ("dtb:depth", "2"),
        ("dtb:totalPageCount", "0"),
        ("dtb:maxPageNumber", "0"),
    ] {
        out.push_str(&format!(
            "    <meta name=\"{name}\" content=\"{content}\"/>\n"
        ));
    }
    out.push_str("  </head>\n");

    out.push_str(&format!(
        "  <docTitle>\n    <text>{}</text>\n  </docTitle>\n",
        escape_xml(title)
    ));

    out.push_str("  <navMap>\n");
    for point in &merged.nav {
        write_nav_point(&mut out, point, 2);
    }
    out.push_str("  </navMap>\n</ncx>\n");
    out
}

fn write_nav_point(out: &mut String, point: &NavPoint, indent: usize) {
    let pad = "  ".repeat(indent);
    out.push_str(&format!(
        "{pad}<navPoint id=\"{}\" playOrder=\"{}\">\n",
        escape_xml(&point.id),
        point.play_order
    ));
    out.push_str(&format!(
        "{pad}  <navLabel>\n{pad}    <text>{}</text>\n{pad}  </navLabel>\n",
        escape_xml(&point.label)
    ));
    out.push_str(&format!(
        "{pad}  <content src=\"{}\"/>\n",
        escape_xml(&point.src)
    ));
    for child in &point.children {
        write_nav_point(out, child, indent + 1);
    }
    out.push_str(&format!("{pad}</navPoint>\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED_NCX: &str = r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="x"/></head>
  <docTitle><text>Part</text></docTitle>
  <navMap>
    <navPoint id="sec_1" playOrder="1">
      <navLabel><text>Part I</text></navLabel>
      <content src="book.xml#sec_1"/>
      <navPoint id="ch_1" playOrder="2">
        <navLabel><text>Chapter 1</text></navLabel>
        <content src="book.xml#ch_1"/>
      </navPoint>
    </navPoint>
    <navPoint id="sec_2" playOrder="3">
      <navLabel><text>Part II</text></navLabel>
      <content src="book.xml#sec_2"/>
    </navPoint>
  </navMap>
</ncx>"#;

    #[test]
    fn parses_nested_nav_points_with_ids() {
        let nav = read_nav(NESTED_NCX).unwrap();
        assert_eq!(nav.len(), 2);
        assert_eq!(nav[0].id, "sec_1");
        assert_eq!(nav[0].label, "Part I");
        assert_eq!(nav[0].children.len(), 1);
        assert_eq!(nav[0].children[0].id, "ch_1");
        assert_eq!(nav[1].src, "book.xml#sec_2");
    }

    #[test]
    fn clone_and_remap_prefixes_ids_and_paths() {
        let nav = read_nav(NESTED_NCX).unwrap();
        let cloned = clone_and_remap(&nav[0], 3);
        assert_eq!(cloned.id, "p3_sec_1");
        assert_eq!(cloned.src, "parts/part_03/book.xml#sec_1");
        assert_eq!(cloned.children[0].id, "p3_ch_1");
        assert_eq!(cloned.children[0].src, "parts/part_03/book.xml#ch_1");
        // The source tree is untouched.
        assert_eq!(nav[0].id, "sec_1");
    }

    #[test]
    fn play_order_is_depth_first_and_contiguous() {
        let mut nav = read_nav(NESTED_NCX).unwrap();
        let mut next = 0;
        assign_play_order(&mut nav, &mut next);
        assert_eq!(nav[0].play_order, 1);
        assert_eq!(nav[0].children[0].play_order, 2);
        assert_eq!(nav[1].play_order, 3);
        assert_eq!(next, 3);
    }

    #[test]
    fn nav_points_missing_parts_are_dropped() {
        let ncx = r#"<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/">
  <navMap>
    <navPoint id="only_id"><navLabel><text>No target</text></navLabel></navPoint>
    <navPoint id="ok"><navLabel><text>Ok</text></navLabel><content src="a.xml"/></navPoint>
  </navMap>
</ncx>"#;
        let nav = read_nav(ncx).unwrap();
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].id, "ok");
    }
}
