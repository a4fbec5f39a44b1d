//! Pairs every merge-side file with its expected counterpart.
//!
//! Merge directories are visited in index order. A directory absent from
//! the expected tree borrows the file list of the first expected directory
//! whose path is similar enough. Inside a directory each file is, in order:
//! a conflict artifact, an exact name hit, a fuzzy name hit, or unmatched.
//! A final pass reports expected files nothing claimed; that pass looks at
//! exact paths only.

use crate::config::MatchingConfig;
use crate::matcher::best_match;
use crate::models::{Correspondence, DirectoryIndex, MatchKind, MatchStats, QualityIssue};
use crate::names::is_conflict_file;
use crate::similarity::text_ratio;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub correspondences: Vec<Correspondence>,
    pub stats: MatchStats,
}

impl Resolution {
    pub fn comparable(&self) -> impl Iterator<Item = &Correspondence> {
        self.correspondences.iter().filter(|c| c.is_comparable())
    }

    pub fn count(&self, kind: MatchKind) -> usize {
        self.correspondences.iter().filter(|c| c.kind == kind).count()
    }
}

pub fn resolve(
    merge: &DirectoryIndex,
    expected: &DirectoryIndex,
    opts: &MatchingConfig,
) -> Resolution {
    let mut resolution = Resolution::default();

    for (merge_path, merge_files) in merge.iter() {
        let candidates = candidate_dir(merge_path, expected, opts.path_threshold);
        for file in merge_files {
            let corr = classify(merge_path, file, candidates, opts);
            match corr.kind {
                MatchKind::ExactMatch => resolution.stats.exact_matches += 1,
                MatchKind::FuzzyMatch => resolution.stats.fuzzy_matches += 1,
                MatchKind::NoMatch => resolution.stats.no_matches += 1,
                MatchKind::ConflictFile => resolution.stats.conflict_files += 1,
                MatchKind::MissingInMerge => {}
            }
            debug!(
                "{} -> {} ({:.3})",
                corr.scenario,
                corr.kind.as_str(),
                corr.match_score
            );
            resolution.correspondences.push(corr);
        }
    }

    let missing = missing_in_merge(expected, &resolution.correspondences);
    resolution.correspondences.extend(missing);
    resolution
}

/// Expected directory (path and files) to match `merge_path` against.
fn candidate_dir<'a>(
    merge_path: &str,
    expected: &'a DirectoryIndex,
    path_threshold: f64,
) -> Option<(&'a str, &'a BTreeSet<String>)> {
    if let Some(found) = expected.get_entry(merge_path).filter(|(_, f)| !f.is_empty()) {
        return Some(found);
    }
    let fallback = expected
        .iter()
        .find(|(exp_path, _)| text_ratio(merge_path, exp_path) > path_threshold);
    if let Some((exp_path, _)) = fallback {
        debug!("No expected dir {merge_path:?}, falling back to {exp_path:?}");
    }
    fallback
}

fn classify(
    merge_path: &str,
    file: &str,
    candidates: Option<(&str, &BTreeSet<String>)>,
    opts: &MatchingConfig,
) -> Correspondence {
    if is_conflict_file(file) {
        return Correspondence::conflict(merge_path, file);
    }
    let Some((exp_path, exp_files)) = candidates else {
        return Correspondence::unmatched(merge_path, file);
    };
    if exp_files.contains(file) {
        return Correspondence::exact(merge_path, file, exp_path);
    }
    match best_match(file, exp_files.iter().map(String::as_str), opts.name_threshold) {
        Some(m) => {
            let mut issues = Vec::new();
            if m.score < opts.clean_match_threshold {
                issues.push(QualityIssue::NameMismatch);
            }
            Correspondence::fuzzy(merge_path, file, exp_path, m.name, m.score, issues)
        }
        None => Correspondence::unmatched(merge_path, file),
    }
}

/// Expected files never claimed by a merge-side correspondence whose
/// scenario key starts with the expected file's directory.
fn missing_in_merge(expected: &DirectoryIndex, found: &[Correspondence]) -> Vec<Correspondence> {
    let mut missing = Vec::new();
    for (exp_path, exp_files) in expected.iter() {
        for exp_file in exp_files {
            let claimed = found.iter().any(|c| {
                c.expected_file.as_deref() == Some(exp_file.as_str())
                    && c.scenario.starts_with(exp_path)
            });
            if !claimed {
                missing.push(Correspondence::missing_in_merge(exp_path, exp_file));
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(&str, &str)]) -> DirectoryIndex {
        entries.iter().copied().collect()
    }

    fn run(merge: &[(&str, &str)], expected: &[(&str, &str)]) -> Resolution {
        resolve(&index(merge), &index(expected), &MatchingConfig::default())
    }

    #[test]
    fn single_exact_match() {
        let r = run(&[("s1", "A.java")], &[("s1", "A.java")]);
        assert_eq!(r.correspondences.len(), 1);
        assert_eq!(r.correspondences[0].kind, MatchKind::ExactMatch);
        assert_eq!(r.correspondences[0].scenario, "s1/A.java");
        assert_eq!(r.correspondences[0].match_score, 1.0);
        assert_eq!(
            r.stats,
            MatchStats {
                exact_matches: 1,
                fuzzy_matches: 0,
                no_matches: 0,
                conflict_files: 0
            }
        );
    }

    #[test]
    fn extra_expected_file_is_missing_in_merge() {
        let r = run(&[("s1", "A.java")], &[("s1", "A.java"), ("s1", "B.java")]);
        assert_eq!(r.correspondences.len(), 2);
        let missing = &r.correspondences[1];
        assert_eq!(missing.kind, MatchKind::MissingInMerge);
        assert_eq!(missing.scenario, "s1/B.java");
        assert_eq!(missing.match_score, 0.0);
        assert_eq!(missing.quality_issues, vec![QualityIssue::MissingInMerge]);
    }

    #[test]
    fn conflict_file_beside_its_resolution() {
        let r = run(&[("", "A.java"), ("", "A.java.orig")], &[("", "A.java")]);
        let kinds: Vec<MatchKind> = r.correspondences.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![MatchKind::ExactMatch, MatchKind::ConflictFile]);
        let conflict = &r.correspondences[1];
        assert_eq!(conflict.scenario, "A.java.orig");
        assert_eq!(conflict.expected_file, None);
        assert_eq!(conflict.match_score, 0.0);
        assert_eq!(r.comparable().count(), 1);
        assert_eq!(r.stats.conflict_files, 1);
    }

    #[test]
    fn fuzzy_match_below_clean_threshold_flags_name() {
        let r = run(&[("s", "Account_v2.java")], &[("s", "Account.java")]);
        let c = &r.correspondences[0];
        assert_eq!(c.kind, MatchKind::FuzzyMatch);
        assert_eq!(c.expected_file.as_deref(), Some("Account.java"));
        assert!(c.match_score >= 0.6 && c.match_score < 0.9);
        assert_eq!(c.quality_issues, vec![QualityIssue::NameMismatch]);
        assert_eq!(r.correspondences.len(), 1, "expected file was claimed");
    }

    #[test]
    fn close_fuzzy_match_carries_no_issue() {
        let r = run(&[("s", "PersonControllers.java")], &[("s", "PersonController.java")]);
        let c = &r.correspondences[0];
        assert_eq!(c.kind, MatchKind::FuzzyMatch);
        assert!(c.match_score >= 0.9);
        assert!(c.quality_issues.is_empty());
    }

    #[test]
    fn score_equal_to_clean_threshold_is_clean() {
        let opts = MatchingConfig {
            name_threshold: 0.5,
            clean_match_threshold: 0.5,
            ..MatchingConfig::default()
        };
        let r = resolve(&index(&[("s", "abcd.java")]), &index(&[("s", "abxy.java")]), &opts);
        let c = &r.correspondences[0];
        assert_eq!(c.kind, MatchKind::FuzzyMatch);
        assert_eq!(c.match_score, 0.5);
        assert!(c.quality_issues.is_empty());

        let strict = MatchingConfig {
            clean_match_threshold: 0.51,
            ..opts
        };
        let r = resolve(&index(&[("s", "abcd.java")]), &index(&[("s", "abxy.java")]), &strict);
        assert_eq!(r.correspondences[0].quality_issues, vec![QualityIssue::NameMismatch]);
    }

    #[test]
    fn case_change_is_fuzzy_with_full_score() {
        let r = run(&[("s", "person.java")], &[("s", "Person.java")]);
        let c = &r.correspondences[0];
        assert_eq!(c.kind, MatchKind::FuzzyMatch);
        assert_eq!(c.match_score, 1.0);
        assert!(c.quality_issues.is_empty());
    }

    #[test]
    fn unrelated_name_is_no_match_and_expected_is_missing() {
        let r = run(&[("s", "Zebra.java")], &[("s", "Account.java")]);
        assert_eq!(r.correspondences[0].kind, MatchKind::NoMatch);
        assert_eq!(
            r.correspondences[0].quality_issues,
            vec![QualityIssue::MissingCorrespondence]
        );
        assert_eq!(r.correspondences[1].kind, MatchKind::MissingInMerge);
        assert_eq!(r.stats.no_matches, 1);
    }

    #[test]
    fn similar_directory_is_used_as_fallback() {
        let r = run(
            &[("scenario_12", "Person.java")],
            &[("scenario_1", "Other.java"), ("scenario_12x", "Person.java")],
        );
        // "scenario_1" already clears the path threshold and comes first.
        let c = &r.correspondences[0];
        assert_eq!(c.kind, MatchKind::NoMatch);

        let r = run(
            &[("workspace/scenario_12", "Person.java")],
            &[("workspace/scenario_12b", "Person.java")],
        );
        let c = &r.correspondences[0];
        assert_eq!(c.kind, MatchKind::ExactMatch);
        assert_eq!(c.merge_dir.as_deref(), Some("workspace/scenario_12"));
        assert_eq!(c.expected_dir.as_deref(), Some("workspace/scenario_12b"));
    }

    #[test]
    fn completeness_pass_ignores_fallback_paths() {
        let r = run(
            &[("workspace/scenario_12", "Person.java")],
            &[("workspace/scenario_12b", "Person.java")],
        );
        // The scenario key does not start with the expected directory, so the
        // expected file is still reported as missing.
        assert_eq!(r.correspondences.len(), 2);
        assert_eq!(r.correspondences[1].kind, MatchKind::MissingInMerge);
        assert_eq!(r.correspondences[1].scenario, "workspace/scenario_12b/Person.java");
    }

    #[test]
    fn conflict_files_never_claim_expected_files() {
        let r = run(&[("s", "A.BASE.java")], &[("s", "A.java")]);
        assert_eq!(r.correspondences[0].kind, MatchKind::ConflictFile);
        assert_eq!(r.correspondences[1].kind, MatchKind::MissingInMerge);
    }

    #[test]
    fn empty_indexes_resolve_to_nothing() {
        let r = run(&[], &[]);
        assert!(r.correspondences.is_empty());
        assert_eq!(r.stats, MatchStats::default());
    }
}
