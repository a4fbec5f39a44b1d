use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A file located by its directory (relative to a scan root) and name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub filename: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filename: filename.into(),
        }
    }

    pub fn scenario(&self) -> String {
        scenario_key(&self.path, &self.filename)
    }
}

/// `path/filename`, or the bare filename at the root.
pub fn scenario_key(path: &str, filename: &str) -> String {
    if path.is_empty() {
        filename.to_string()
    } else {
        format!("{path}/{filename}")
    }
}

/// Relative directory path -> filenames found there. The root is keyed by
/// the empty string; directories without qualifying files are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryIndex {
    dirs: BTreeMap<String, BTreeSet<String>>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, filename: impl Into<String>) {
        self.dirs
            .entry(path.into())
            .or_default()
            .insert(filename.into());
    }

    pub fn get(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.dirs.get(path)
    }

    pub fn get_entry(&self, path: &str) -> Option<(&str, &BTreeSet<String>)> {
        self.dirs
            .get_key_value(path)
            .map(|(path, files)| (path.as_str(), files))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.dirs.iter().map(|(path, files)| (path.as_str(), files))
    }

    pub fn entries(&self) -> impl Iterator<Item = FileEntry> + '_ {
        self.iter()
            .flat_map(|(path, files)| files.iter().map(move |f| FileEntry::new(path, f.as_str())))
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    pub fn file_count(&self) -> usize {
        self.dirs.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

impl<P: Into<String>, F: Into<String>> FromIterator<(P, F)> for DirectoryIndex {
    fn from_iter<T: IntoIterator<Item = (P, F)>>(iter: T) -> Self {
        let mut index = DirectoryIndex::new();
        for (path, filename) in iter {
            index.insert(path, filename);
        }
        index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactMatch,
    FuzzyMatch,
    ConflictFile,
    NoMatch,
    MissingInMerge,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::ExactMatch => "exact_match",
            MatchKind::FuzzyMatch => "fuzzy_match",
            MatchKind::ConflictFile => "conflict_file",
            MatchKind::NoMatch => "no_match",
            MatchKind::MissingInMerge => "missing_in_merge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    NameMismatch,
    ConflictFile,
    MissingCorrespondence,
    MissingInMerge,
}

impl QualityIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityIssue::NameMismatch => "name_mismatch",
            QualityIssue::ConflictFile => "conflict_file",
            QualityIssue::MissingCorrespondence => "missing_correspondence",
            QualityIssue::MissingInMerge => "missing_in_merge",
        }
    }
}

/// One file from either tree paired with zero or one file from the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub scenario: String,
    pub merge_file: Option<String>,
    pub expected_file: Option<String>,
    /// Directory of `merge_file` relative to the merge root.
    pub merge_dir: Option<String>,
    /// Directory of `expected_file` relative to the expected root. Differs
    /// from `merge_dir` when the resolver fell back to a similar path.
    pub expected_dir: Option<String>,
    pub match_score: f64,
    pub quality_issues: Vec<QualityIssue>,
}

impl Correspondence {
    pub fn exact(path: &str, file: &str, expected_dir: &str) -> Self {
        Self {
            kind: MatchKind::ExactMatch,
            scenario: scenario_key(path, file),
            merge_file: Some(file.to_string()),
            expected_file: Some(file.to_string()),
            merge_dir: Some(path.to_string()),
            expected_dir: Some(expected_dir.to_string()),
            match_score: 1.0,
            quality_issues: Vec::new(),
        }
    }

    pub fn fuzzy(
        path: &str,
        file: &str,
        expected_dir: &str,
        expected_file: &str,
        score: f64,
        issues: Vec<QualityIssue>,
    ) -> Self {
        Self {
            kind: MatchKind::FuzzyMatch,
            scenario: scenario_key(path, file),
            merge_file: Some(file.to_string()),
            expected_file: Some(expected_file.to_string()),
            merge_dir: Some(path.to_string()),
            expected_dir: Some(expected_dir.to_string()),
            match_score: score,
            quality_issues: issues,
        }
    }

    pub fn conflict(path: &str, file: &str) -> Self {
        Self::merge_only(MatchKind::ConflictFile, path, file, QualityIssue::ConflictFile)
    }

    pub fn unmatched(path: &str, file: &str) -> Self {
        Self::merge_only(
            MatchKind::NoMatch,
            path,
            file,
            QualityIssue::MissingCorrespondence,
        )
    }

    pub fn missing_in_merge(path: &str, file: &str) -> Self {
        Self {
            kind: MatchKind::MissingInMerge,
            scenario: scenario_key(path, file),
            merge_file: None,
            expected_file: Some(file.to_string()),
            merge_dir: None,
            expected_dir: Some(path.to_string()),
            match_score: 0.0,
            quality_issues: vec![QualityIssue::MissingInMerge],
        }
    }

    fn merge_only(kind: MatchKind, path: &str, file: &str, issue: QualityIssue) -> Self {
        Self {
            kind,
            scenario: scenario_key(path, file),
            merge_file: Some(file.to_string()),
            expected_file: None,
            merge_dir: Some(path.to_string()),
            expected_dir: None,
            match_score: 0.0,
            quality_issues: vec![issue],
        }
    }

    /// Both sides present and paired by name, so content can be compared.
    pub fn is_comparable(&self) -> bool {
        matches!(self.kind, MatchKind::ExactMatch | MatchKind::FuzzyMatch)
            && self.merge_file.is_some()
            && self.expected_file.is_some()
    }

    pub fn merge_entry(&self) -> Option<FileEntry> {
        Some(FileEntry::new(
            self.merge_dir.clone()?,
            self.merge_file.clone()?,
        ))
    }

    pub fn expected_entry(&self) -> Option<FileEntry> {
        Some(FileEntry::new(
            self.expected_dir.clone()?,
            self.expected_file.clone()?,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub no_matches: usize,
    pub conflict_files: usize,
}

/// Line-level quality metrics for one merge/expected pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSet {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub line_order_accuracy: f64,
    pub similarity_ratio: f64,
    pub error_rate: f64,
    /// Distinct normalized lines on the expected side.
    pub total_expected_lines: usize,
    /// Distinct normalized lines on the merge side.
    pub total_merge_lines: usize,
    pub correct_lines: usize,
    pub extra_lines: usize,
    pub missing_lines: usize,
}
