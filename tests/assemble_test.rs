use bindery::{
    AssembleOptions, Assembler, Block, BookInfo, Document, Matter, Outline, OutlineEntry,
    validate_dtbook, write_dtbook,
};
use proptest::prelude::*;

fn assembler(entries: Vec<OutlineEntry>) -> Assembler {
    Assembler::new(Outline::new(entries).unwrap(), AssembleOptions::default())
}

fn marker_numbers(doc: &Document, section_id: &str) -> Vec<usize> {
    let id = doc
        .find_section(section_id)
        .unwrap_or_else(|| panic!("section {section_id} missing"));
    doc.section(id)
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::PageMarker { number, .. } => Some(*number),
            _ => None,
        })
        .collect()
}

#[test]
fn flat_outline_tracks_sections_monotonically() {
    let assembler = assembler(vec![
        OutlineEntry::new("Alpha", 1, "sec_a"),
        OutlineEntry::new("Beta", 1, "sec_b"),
    ]);
    let pages = [
        "foo",
        "Alpha heading text",
        "more Alpha text",
        "Beta heading text",
    ];
    let doc = assembler.assemble(BookInfo::new("Monotonic"), pages);

    // Pages 1-3 stay on the first section (page 3 re-matches Alpha without
    // moving); page 4 advances to Beta.
    assert_eq!(marker_numbers(&doc, "sec_a"), vec![1, 2, 3]);
    assert_eq!(marker_numbers(&doc, "sec_b"), vec![4]);
}

#[test]
fn earlier_title_reappearing_does_not_rewind() {
    let assembler = assembler(vec![
        OutlineEntry::new("Alpha", 1, "sec_a"),
        OutlineEntry::new("Beta", 1, "sec_b"),
    ]);
    let pages = [
        "Alpha heading text",
        "Beta heading text",
        "as Alpha showed earlier, this belongs to Beta",
    ];
    let doc = assembler.assemble(BookInfo::new("No Rewind"), pages);

    assert_eq!(marker_numbers(&doc, "sec_a"), vec![1]);
    assert_eq!(marker_numbers(&doc, "sec_b"), vec![2, 3]);
}

#[test]
fn level2_section_created_on_first_match_under_existing_parent() {
    let assembler = assembler(vec![
        OutlineEntry::new("Part One", 1, "part_1"),
        OutlineEntry::new("1 The Clot", 2, "ch_1").with_parent("part_1"),
    ]);
    let pages = [
        "Part One and the story begins",
        "middle prose without any heading",
        "1 The Clot finally appears on the steppe",
    ];
    let doc = assembler.assemble(BookInfo::new("Two Level"), pages);

    let part = doc.find_section("part_1").unwrap();
    let chapter = doc.find_section("ch_1").unwrap();

    // Parent kept its early pages and gained exactly one child section.
    assert_eq!(marker_numbers(&doc, "part_1"), vec![1, 2]);
    assert_eq!(marker_numbers(&doc, "ch_1"), vec![3]);
    assert_eq!(doc.section_count(), 2);
    assert!(
        doc.section(part)
            .blocks
            .iter()
            .any(|b| matches!(b, Block::Section(id) if *id == chapter))
    );
    assert_eq!(doc.section(chapter).level, 2);
}

#[test]
fn two_level_outline_starts_before_any_section() {
    let assembler = assembler(vec![
        OutlineEntry::new("Part One", 1, "part_1"),
        OutlineEntry::new("1 The Clot", 2, "ch_1").with_parent("part_1"),
    ]);
    let pages = ["nothing resembling a heading", "Part One begins here"];
    let doc = assembler.assemble(BookInfo::new("Preamble"), pages);

    // The pre-match page lands directly in the body container.
    let body_markers: Vec<usize> = doc
        .section(doc.body())
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::PageMarker { number, .. } => Some(*number),
            _ => None,
        })
        .collect();
    assert_eq!(body_markers, vec![1]);
    assert_eq!(marker_numbers(&doc, "part_1"), vec![2]);
}

#[test]
fn empty_outline_degrades_to_single_default_section() {
    let assembler = Assembler::new(
        Outline::new(Vec::new()).unwrap(),
        AssembleOptions::default(),
    );
    let pages = ["first page of prose", "second page of prose"];
    let doc = assembler.assemble(BookInfo::new("Default"), pages);

    assert_eq!(doc.section_count(), 1);
    assert_eq!(marker_numbers(&doc, "sec_1"), vec![1, 2]);
}

#[test]
fn leading_and_trailing_pages_are_skipped() {
    let options = AssembleOptions {
        skip_leading_pages: 2,
        skip_trailing_after_page: Some(3),
        sentences_per_paragraph: 4,
    };
    let assembler = Assembler::new(
        Outline::new(vec![OutlineEntry::new("Alpha", 1, "sec_a")]).unwrap(),
        options,
    );
    let pages = ["one", "two", "three", "four", "five"];
    let doc = assembler.assemble(BookInfo::new("Skips"), pages);

    assert_eq!(marker_numbers(&doc, "sec_a"), vec![3]);
}

#[test]
fn heading_text_is_not_duplicated_as_a_paragraph() {
    let assembler = assembler(vec![OutlineEntry::new(
        "Chapter 1 The Beginning",
        1,
        "ch_1",
    )]);
    let pages = ["Chapter 1 The Beginning Once upon a time. And so it went."];
    let doc = assembler.assemble(BookInfo::new("Strip"), pages);

    let id = doc.find_section("ch_1").unwrap();
    let paragraphs: Vec<&str> = doc
        .section(id)
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(paragraphs, vec!["Once upon a time. And so it went."]);
}

#[test]
fn blank_pages_contribute_no_nodes() {
    let assembler = assembler(vec![OutlineEntry::new("Alpha", 1, "sec_a")]);
    let pages = ["Alpha starts", "   \n 12/300 \n", "Alpha continues"];
    let doc = assembler.assemble(BookInfo::new("Blank"), pages);

    assert_eq!(marker_numbers(&doc, "sec_a"), vec![1, 3]);
}

#[test]
fn matter_routes_sections_into_containers() {
    let assembler = assembler(vec![
        OutlineEntry::new("Preface", 1, "pre").in_matter(Matter::Front),
        OutlineEntry::new("Alpha", 1, "sec_a"),
        OutlineEntry::new("Acknowledgements", 1, "ack").in_matter(Matter::Back),
    ]);
    let pages = ["Preface text", "Alpha text", "Acknowledgements text"];
    let doc = assembler.assemble(BookInfo::new("Matter"), pages);

    let xml = write_dtbook(&doc);
    let front = xml.find("<frontmatter").unwrap();
    let body = xml.find("<bodymatter").unwrap();
    let back = xml.find("<backmatter").unwrap();
    assert!(front < body && body < back);
    assert!(xml[front..body].contains("<h1 id=\"h1_pre\">Preface</h1>"));
    assert!(xml[back..].contains("<h1 id=\"h1_ack\">Acknowledgements</h1>"));
}

// Known limitation, kept on purpose: a page that merely cites a chapter
// number in prose can satisfy the loose numbered-heading rule and advance
// the cursor early.
#[test]
fn numbered_heading_rule_can_false_positive_on_citations() {
    let assembler = assembler(vec![
        OutlineEntry::new("Intro", 1, "intro"),
        OutlineEntry::new("2 The End Of Things", 1, "ch_2"),
    ]);
    let pages = [
        "Intro text lays the groundwork",
        "2 things happened near the end of town",
    ];
    let doc = assembler.assemble(BookInfo::new("Citation"), pages);

    assert_eq!(marker_numbers(&doc, "ch_2"), vec![2]);
}

#[test]
fn round_trip_preserves_element_counts() {
    let assembler = assembler(vec![
        OutlineEntry::new("Alpha", 1, "sec_a"),
        OutlineEntry::new("Beta", 1, "sec_b"),
    ]);
    let pages = [
        "Alpha begins. It was morning. The road was long. Nobody spoke. Then it rained.",
        "Beta begins. A second stretch of prose follows here.",
    ];
    let doc = assembler.assemble(
        BookInfo::new("Round Trip").with_creator("Tester"),
        pages,
    );

    let report = validate_dtbook(&write_dtbook(&doc)).unwrap();
    assert_eq!(report.sections, doc.section_count());
    assert_eq!(report.paragraphs, doc.paragraph_count());
    assert_eq!(report.page_markers, doc.page_marker_count());
    assert_eq!(report.headings, doc.headings());
}

const PAGE_POOL: &[&str] = &[
    "Alpha heading text",
    "Beta heading text",
    "Gamma heading text",
    "plain prose with nothing to match",
    "more plain prose",
    "Alpha cited again much later",
    "a reference back to Beta in passing",
];

proptest! {
    // Monotonic-advance invariant: in outline order, every page a later
    // section received comes after every page an earlier section received.
    #[test]
    fn page_markers_never_move_backward(
        pages in proptest::collection::vec(prop::sample::select(PAGE_POOL.to_vec()), 0..30)
    ) {
        let assembler = Assembler::new(
            Outline::new(vec![
                OutlineEntry::new("Alpha", 1, "sec_a"),
                OutlineEntry::new("Beta", 1, "sec_b"),
                OutlineEntry::new("Gamma", 1, "sec_c"),
            ])
            .unwrap(),
            AssembleOptions::default(),
        );
        let doc = assembler.assemble(BookInfo::new("Prop"), pages);

        let mut last_seen = 0usize;
        for section_id in ["sec_a", "sec_b", "sec_c"] {
            for number in marker_numbers(&doc, section_id) {
                prop_assert!(number > last_seen);
                last_seen = number;
            }
        }
    }

    // Segmentation is total: any non-blank text yields at least one
    // non-empty paragraph, even with no sentence boundaries at all.
    #[test]
    fn segmenter_always_yields_a_paragraph(
        text in "[a-zA-Z,;: .!?]{1,300}",
        per_paragraph in 1usize..12,
    ) {
        prop_assume!(!text.trim().is_empty());
        let paragraphs = bindery::split_paragraphs(&text, per_paragraph);
        prop_assert!(!paragraphs.is_empty());
        prop_assert!(paragraphs.iter().all(|p| !p.trim().is_empty()));
    }
}
