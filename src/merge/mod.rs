//! Multi-part DAISY book merging.
//!
//! Each part is an independently built book directory holding a `book.opf`
//! package and a `navigation.ncx` map. Merging folds every part into one
//! output directory: verbatim per-part copies under `parts/part_NN/`, plus a
//! combined package and navigation map whose ids are remapped with a
//! per-part prefix and whose play order is recomputed globally.

mod ncx;
mod opf;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub use ncx::{NavPoint, clone_and_remap, read_nav, write_nav};
pub use opf::{ManifestItem, PackageDoc, PackagingDialect, read_package, write_package};

/// Package file each part must contain.
pub const PACKAGE_FILE: &str = "book.opf";
/// Navigation file each part must contain.
pub const NAV_FILE: &str = "navigation.ncx";
/// Media type marking a part's own navigation document in its manifest.
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Manifest id of the merged navigation document.
const MERGED_NAV_ID: &str = "ncx_merged";

/// One part, loaded and positioned for merging.
#[derive(Debug, Clone)]
pub struct PartDescriptor {
    /// 1-based position after natural sort of the part directory names.
    pub ordinal: usize,
    pub dir: PathBuf,
    pub package: PackageDoc,
    pub nav: Vec<NavPoint>,
}

/// The merged package and navigation tree.
#[derive(Debug, Clone)]
pub struct MergedBook {
    pub dialect: PackagingDialect,
    pub unique_identifier: String,
    /// Verbatim metadata block of the first part; later parts' metadata is
    /// discarded.
    pub metadata_xml: String,
    pub manifest: Vec<ManifestItem>,
    pub spine: Vec<String>,
    /// One synthetic top-level point per part.
    pub nav: Vec<NavPoint>,
}

/// What a [`merge_directory`] run produced, for reporting.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    /// (source part dir, destination copy) pairs in merge order.
    pub copied: Vec<(PathBuf, PathBuf)>,
    pub manifest_items: usize,
    pub spine_refs: usize,
    pub nav_points: usize,
}

/// Subdirectory a part's copy lands in, relative to the output root.
fn part_subdir(ordinal: usize) -> String {
    format!("parts/part_{ordinal:02}")
}

/// Discover part directories under `parent`, ordered by natural sort of
/// their names (`part2` before `part10`).
///
/// A directory qualifies when it contains both [`PACKAGE_FILE`] and
/// [`NAV_FILE`]. Zero qualifying directories is [`Error::NotFound`].
pub fn discover_parts(parent: &Path) -> Result<Vec<PathBuf>> {
    let mut parts = Vec::new();
    for dir_entry in fs::read_dir(parent)? {
        let path = dir_entry?.path();
        if path.is_dir()
            && path.join(PACKAGE_FILE).is_file()
            && path.join(NAV_FILE).is_file()
        {
            parts.push(path);
        }
    }

    parts.sort_by_key(|path| {
        natural_key(
            &path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    });

    if parts.is_empty() {
        return Err(Error::NotFound(format!(
            "no DAISY parts found in: {}",
            parent.display()
        )));
    }
    Ok(parts)
}

/// Load one part's package and navigation map.
pub fn load_part(ordinal: usize, dir: &Path) -> Result<PartDescriptor> {
    let package = read_package(&fs::read_to_string(dir.join(PACKAGE_FILE))?)?;
    let nav = read_nav(&fs::read_to_string(dir.join(NAV_FILE))?)?;
    Ok(PartDescriptor {
        ordinal,
        dir: dir.to_path_buf(),
        package,
        nav,
    })
}

/// Merge loaded parts into one package and navigation tree.
///
/// Ids are remapped as `p{ordinal}_{id}`, hrefs are rewritten under the
/// part's copy subdirectory, each part's own navigation document is dropped
/// from the manifest, and play order is reassigned 1..K depth-first across
/// the finished tree. Metadata and the packaging dialect come from the first
/// part alone.
pub fn merge_parts(parts: &[PartDescriptor]) -> Result<MergedBook> {
    let first = parts
        .first()
        .ok_or_else(|| Error::Configuration("no parts to merge".into()))?;

    let mut manifest = vec![ManifestItem {
        id: MERGED_NAV_ID.to_string(),
        href: NAV_FILE.to_string(),
        media_type: NCX_MEDIA_TYPE.to_string(),
        fallback: None,
        properties: None,
    }];
    let mut spine = Vec::new();
    let mut nav = Vec::new();

    for part in parts {
        let subdir = part_subdir(part.ordinal);

        for item in &part.package.manifest {
            if item.media_type == NCX_MEDIA_TYPE {
                continue;
            }
            manifest.push(ManifestItem {
                id: format!("p{}_{}", part.ordinal, item.id),
                href: format!("{subdir}/{}", item.href.replace('\\', "/")),
                media_type: item.media_type.clone(),
                fallback: item.fallback.clone(),
                properties: item.properties.clone(),
            });
        }

        for idref in &part.package.spine {
            spine.push(format!("p{}_{}", part.ordinal, idref));
        }

        nav.push(NavPoint {
            id: format!("part_{:02}", part.ordinal),
            label: format!("Part {:02}", part.ordinal),
            src: format!("{subdir}/{PACKAGE_FILE}"),
            play_order: 0,
            children: part
                .nav
                .iter()
                .map(|point| clone_and_remap(point, part.ordinal))
                .collect(),
        });
    }

    let mut next_order = 0;
    ncx::assign_play_order(&mut nav, &mut next_order);

    Ok(MergedBook {
        dialect: first.package.dialect,
        unique_identifier: first.package.unique_identifier.clone(),
        metadata_xml: first.package.metadata_xml.clone(),
        manifest,
        spine,
        nav,
    })
}

/// Discover, copy, and merge all parts under `parent` into `dest`.
///
/// Part directories are copied verbatim before the merged files are
/// written; on a later failure the copies are left in place.
pub fn merge_directory(parent: &Path, dest: &Path) -> Result<MergeSummary> {
    let dirs = discover_parts(parent)?;

    let mut parts = Vec::with_capacity(dirs.len());
    for (index, dir) in dirs.iter().enumerate() {
        parts.push(load_part(index + 1, dir)?);
    }

    let mut copied = Vec::with_capacity(parts.len());
    for part in &parts {
        let target = dest.join(part_subdir(part.ordinal));
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        copy_dir_recursive(&part.dir, &target)?;
        copied.push((part.dir.clone(), target));
    }

    let merged = merge_parts(&parts)?;
    fs::write(dest.join(NAV_FILE), write_nav(&merged, "Merged"))?;
    fs::write(dest.join(PACKAGE_FILE), write_package(&merged))?;

    Ok(MergeSummary {
        copied,
        manifest_items: merged.manifest.len(),
        spine_refs: merged.spine.len(),
        nav_points: count_nav_points(&merged.nav),
    })
}

fn count_nav_points(points: &[NavPoint]) -> usize {
    points
        .iter()
        .map(|p| 1 + count_nav_points(&p.children))
        .sum()
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for dir_entry in fs::read_dir(src)? {
        let dir_entry = dir_entry?;
        let target = dst.join(dir_entry.file_name());
        if dir_entry.file_type()?.is_dir() {
            copy_dir_recursive(&dir_entry.path(), &target)?;
        } else {
            fs::copy(dir_entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Sort key that compares digit runs numerically: `part2` < `part10`.
fn natural_key(name: &str) -> Vec<NaturalToken> {
    let mut tokens = Vec::new();
    let mut run = String::new();
    let mut run_is_digits = false;

    for c in name.chars() {
        let is_digit = c.is_ascii_digit();
        if !run.is_empty() && is_digit != run_is_digits {
            tokens.push(NaturalToken::from_run(run, run_is_digits));
            run = String::new();
        }
        run_is_digits = is_digit;
        run.push(c);
    }
    if !run.is_empty() {
        tokens.push(NaturalToken::from_run(run, run_is_digits));
    }
    tokens
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalToken {
    Number(u64),
    Text(String),
}

impl NaturalToken {
    fn from_run(run: String, is_digits: bool) -> Self {
        if is_digits && let Ok(value) = run.parse() {
            NaturalToken::Number(value)
        } else {
            NaturalToken::Text(run.to_lowercase())
        }
    }
}
