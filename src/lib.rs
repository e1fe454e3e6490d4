//! # bindery
//!
//! A library for building and merging DAISY 3.0 digital talking books.
//!
//! ## Features
//!
//! - Assemble paginated text into a hierarchical DTBook document, tracking
//!   sections against an expected outline
//! - Serialize and structurally validate DTBook XML
//! - Merge independently built book parts (OPF package + NCX navigation)
//!   into one navigable book with globally unique ids and a recomputed
//!   play order
//!
//! ## Quick Start
//!
//! ```
//! use bindery::{AssembleOptions, Assembler, BookInfo, Outline, OutlineEntry, write_dtbook};
//!
//! let outline = Outline::new(vec![
//!     OutlineEntry::new("Chapter 1", 1, "ch_1"),
//!     OutlineEntry::new("Chapter 2", 1, "ch_2"),
//! ])
//! .unwrap();
//!
//! let assembler = Assembler::new(outline, AssembleOptions::default());
//! let pages = ["Chapter 1 It begins.", "More of the first chapter.", "Chapter 2 It ends."];
//! let doc = assembler.assemble(BookInfo::new("Example").with_language("en"), pages);
//!
//! let xml = write_dtbook(&doc);
//! assert!(xml.contains("<h1 id=\"h1_ch_1\">Chapter 1</h1>"));
//! ```
//!
//! ## Merging parts
//!
//! ```no_run
//! use std::path::Path;
//!
//! let summary = bindery::merge_directory(Path::new("chapters"), Path::new("merged"))?;
//! println!("merged {} parts", summary.copied.len());
//! # Ok::<(), bindery::Error>(())
//! ```

pub mod assemble;
pub mod document;
pub mod dtbook;
pub mod error;
pub mod merge;
pub mod outline;
pub mod text;
pub(crate) mod xml;

pub use assemble::{AssembleOptions, Assembler};
pub use document::{Block, BookInfo, Document, Section, SectionId};
pub use dtbook::{
    ValidationReport, validate_dtbook, validate_dtbook_file, write_dtbook, write_dtbook_file,
};
pub use error::{Error, Result};
pub use merge::{
    MergeSummary, MergedBook, NavPoint, PackagingDialect, PartDescriptor, discover_parts,
    merge_directory, merge_parts,
};
pub use outline::{Matter, Outline, OutlineEntry, match_section};
pub use text::{normalize_page, split_paragraphs};
