//! Collection of candidate source files under a root directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::types::{is_main_path, SampleSourceFile};
use crate::error::Result;
use crate::language::LanguageProfile;

/// Collect the files under `root` whose path relative to `root` satisfies
/// `predicate`.
///
/// A missing root or a predicate matching nothing yields an empty set.
pub fn scan<P, F>(root: P, predicate: F) -> Result<BTreeSet<PathBuf>>
where
    P: AsRef<Path>,
    F: Fn(&Path) -> bool,
{
    let root = root.as_ref();
    let mut files = BTreeSet::new();

    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "scan root does not exist");
        return Ok(files);
    }

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            // Skip hidden directories
            let name = e.file_name().to_string_lossy();
            !(e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.'))
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if predicate(relative) {
            files.insert(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Collect sample source files from every root, in path order.
pub fn scan_sample_sources(roots: &[PathBuf]) -> Result<Vec<SampleSourceFile>> {
    let mut samples = Vec::new();
    for root in roots {
        let files = scan(root, |rel| SampleSourceFile::new(root, rel).is_some())?;
        samples.extend(files.iter().filter_map(|path| {
            let relative = path.strip_prefix(root).ok()?;
            SampleSourceFile::new(root, relative)
        }));
    }
    Ok(samples)
}

/// Main source files found under one root.
#[derive(Debug, Clone)]
pub struct MainSources {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Collect main source files from every root.
pub fn scan_main_sources(roots: &[PathBuf]) -> Result<Vec<MainSources>> {
    roots
        .iter()
        .map(|root| {
            let files = scan(root, |rel| {
                is_main_path(rel) && LanguageProfile::for_path(rel).is_some()
            })?;
            Ok(MainSources {
                root: root.clone(),
                files: files.into_iter().collect(),
            })
        })
        .collect()
}
