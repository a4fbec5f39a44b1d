//! Compatibility mode: one level of scenario folders, identical names only.
//!
//! Every immediate subdirectory of the merge root is a scenario. Files pair
//! up only when the same name exists in the expected scenario folder; no
//! fuzzy matching, no recursion, no conflict classification.

use crate::error::ScanError;
use crate::models::{Correspondence, FileEntry};
use crate::scanner::Scanner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyResolution {
    /// Exact-name pairs, all of kind `exact_match`.
    pub pairs: Vec<Correspondence>,
    pub unmatched_merge: Vec<FileEntry>,
    pub unmatched_expected: Vec<FileEntry>,
    /// Merge scenario folders with no expected counterpart.
    pub missing_dirs: Vec<String>,
}

pub fn resolve<S: AsRef<str>>(
    merge_root: &Path,
    expected_root: &Path,
    extensions: &[S],
) -> Result<LegacyResolution, ScanError> {
    let scanner = Scanner::new(extensions, &[])?;
    let mut out = LegacyResolution::default();

    for scenario in subdirs(merge_root)? {
        let expected_dir = expected_root.join(&scenario);
        if !expected_dir.is_dir() {
            warn!("Expected directory not found: {scenario}");
            out.missing_dirs.push(scenario);
            continue;
        }
        let merge_files = files(&merge_root.join(&scenario), &scanner)?;
        let expected_files = files(&expected_dir, &scanner)?;

        for file in &merge_files {
            if expected_files.contains(file) {
                out.pairs.push(Correspondence::exact(&scenario, file, &scenario));
            } else {
                warn!("{scenario}/{file} has no expected counterpart");
                out.unmatched_merge.push(FileEntry::new(scenario.as_str(), file.as_str()));
            }
        }
        for file in expected_files.difference(&merge_files) {
            warn!("Expected {scenario}/{file} not found in merge output");
            out.unmatched_expected.push(FileEntry::new(scenario.as_str(), file.as_str()));
        }
    }

    info!(
        "Legacy pairing: {} pairs, {} unmatched merge files, {} unmatched expected files",
        out.pairs.len(),
        out.unmatched_merge.len(),
        out.unmatched_expected.len()
    );
    Ok(out)
}

/// Sorted names of the immediate subdirectories of `root`.
fn subdirs(root: &Path) -> Result<Vec<String>, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let mut names: Vec<String> = list(root)?
        .into_iter()
        .filter(|(_, is_dir)| *is_dir)
        .map(|(name, _)| name)
        .collect();
    names.sort();
    Ok(names)
}

fn files(dir: &Path, scanner: &Scanner) -> Result<BTreeSet<String>, ScanError> {
    Ok(list(dir)?
        .into_iter()
        .filter(|(name, is_dir)| !is_dir && scanner.accepts(name))
        .map(|(name, _)| name)
        .collect())
}

/// `(name, is_dir)` for each UTF-8 named entry of `dir`.
fn list(dir: &Path) -> Result<Vec<(String, bool)>, ScanError> {
    let io_err = |source| ScanError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let is_dir = entry.file_type().map_err(io_err)?.is_dir();
        if let Ok(name) = entry.file_name().into_string() {
            out.push((name, is_dir));
        }
    }
    Ok(out)
}
