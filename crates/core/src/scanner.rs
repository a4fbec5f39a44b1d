//! Walks a tree and indexes the source files in each directory.

use crate::config::{normalize_extensions, ScanConfig};
use crate::error::ScanError;
use crate::models::DirectoryIndex;
use crate::names::is_temp_file;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct Scanner {
    extensions: Vec<String>,
    excludes: GlobSet,
}

impl Scanner {
    pub fn new<S: AsRef<str>>(extensions: &[S], excludes: &[String]) -> Result<Self, ScanError> {
        Ok(Self {
            extensions: normalize_extensions(extensions),
            excludes: build_globset(excludes)?,
        })
    }

    pub fn from_config(cfg: &ScanConfig) -> Result<Self, ScanError> {
        Self::new(&cfg.extensions, &cfg.exclude)
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Indexes every directory under `root` that holds at least one file
    /// with an allowed extension. Any unreadable directory fails the scan.
    pub fn scan(&self, root: &Path) -> Result<DirectoryIndex, ScanError> {
        if !root.exists() {
            return Err(ScanError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }
        info!("Scanning {}", root.display());

        let mut index = DirectoryIndex::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !self.is_excluded(relative(root, e.path()).as_str())
            });

        for entry in walker {
            let entry = entry.map_err(|source| ScanError::Unreadable {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                source,
            })?;
            // Linked files count; linked directories are not descended into.
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                debug!("Skipping non UTF-8 name {:?}", entry.path());
                continue;
            };
            if !self.accepts(name) {
                continue;
            }
            let dir = entry
                .path()
                .parent()
                .map(|p| relative(root, p))
                .unwrap_or_default();
            index.insert(dir, name);
        }

        info!(
            "Indexed {} files in {} directories under {}",
            index.file_count(),
            index.dir_count(),
            root.display()
        );
        Ok(index)
    }

    /// Allowed extension and not an editor temp file.
    pub fn accepts(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str())) && !is_temp_file(name)
    }

    fn is_excluded(&self, rel: &str) -> bool {
        !rel.is_empty() && self.excludes.is_match(rel)
    }
}

/// Scans `root` with the given extension allow-list and no excludes.
pub fn scan<S: AsRef<str>>(root: &Path, extensions: &[S]) -> Result<DirectoryIndex, ScanError> {
    Scanner::new(extensions, &[])?.scan(root)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}

/// `path` relative to `root`, `/`-separated; the root itself is `""`.
fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EXTENSIONS;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x\n").unwrap();
    }

    #[test]
    fn indexes_nested_directories() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "Root.java");
        touch(temp.path(), "scenario_1/Person.java");
        touch(temp.path(), "scenario_1/notes.txt");
        touch(temp.path(), "scenario_1/deep/Util.py");
        touch(temp.path(), "scenario_2/readme.md");

        let index = scan(temp.path(), DEFAULT_EXTENSIONS).unwrap();
        let dirs: Vec<&str> = index.iter().map(|(p, _)| p).collect();
        assert_eq!(dirs, vec!["", "scenario_1", "scenario_1/deep"]);
        assert!(index.get("scenario_1").unwrap().contains("Person.java"));
        assert!(index.get("scenario_2").is_none());
        assert_eq!(index.file_count(), 3);
    }

    #[test]
    fn skips_temp_files_but_keeps_conflict_files() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), ".#Person.java");
        touch(temp.path(), "Person.BASE.java");
        touch(temp.path(), "Person.java");

        let index = scan(temp.path(), &[".java"]).unwrap();
        let files: Vec<&String> = index.get("").unwrap().iter().collect();
        assert_eq!(files, vec!["Person.BASE.java", "Person.java"]);
    }

    #[test]
    fn exclude_globs_prune_directories() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "src/A.java");
        touch(temp.path(), "build/gen/B.java");

        let scanner = Scanner::new(&["java"], &["build".to_string()]).unwrap();
        let index = scanner.scan(temp.path()).unwrap();
        assert!(index.get("src").is_some());
        assert!(index.get("build/gen").is_none());
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = scan(&temp.path().join("nope"), DEFAULT_EXTENSIONS).unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }

    #[test]
    fn empty_tree_yields_empty_index() {
        let temp = tempfile::tempdir().unwrap();
        let index = scan(temp.path(), DEFAULT_EXTENSIONS).unwrap();
        assert!(index.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn linked_files_are_indexed_but_linked_dirs_are_not_walked() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        touch(outside.path(), "Shared.java");
        touch(outside.path(), "lib/Lib.java");
        touch(temp.path(), "s1/A.java");
        symlink(outside.path().join("Shared.java"), temp.path().join("s1/Shared.java")).unwrap();
        symlink(outside.path().join("lib"), temp.path().join("s1/lib")).unwrap();

        let index = scan(temp.path(), &[".java"]).unwrap();
        let files: Vec<&String> = index.get("s1").unwrap().iter().collect();
        assert_eq!(files, vec!["A.java", "Shared.java"]);
        assert!(index.get("s1/lib").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_fails_the_scan() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "locked/A.java");
        let locked = temp.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Root ignores permission bits; nothing to assert there.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = scan(temp.path(), DEFAULT_EXTENSIONS);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(ScanError::Unreadable { .. })));
    }
}
