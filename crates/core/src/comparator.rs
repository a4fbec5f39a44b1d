//! Line-level comparison of a merge result against its expected file.

use crate::error::LoadError;
use crate::models::MetricSet;
use crate::similarity::{sequence_ratio, unified_diff};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const DIFF_CONTEXT: usize = 3;

/// Collapses whitespace runs to one space and trims the ends.
pub fn normalize_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized, non-empty lines of `text`. `\n`, `\r\n` and `\r` all end a
/// line.
pub fn normalize_text(text: &str) -> Vec<String> {
    text.split(['\n', '\r'])
        .map(normalize_line)
        .filter(|l| !l.is_empty())
        .collect()
}

pub fn load_lines(path: &Path) -> Result<Vec<String>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| LoadError::Decode(path.to_path_buf()))?;
    Ok(normalize_text(&text))
}

/// Loads both sides; either failing fails the pair.
pub fn load(merge: &Path, expected: &Path) -> Result<(Vec<String>, Vec<String>), LoadError> {
    Ok((load_lines(merge)?, load_lines(expected)?))
}

/// Metrics for merge lines against expected lines (the ground truth).
pub fn metrics<S: AsRef<str>>(merge: &[S], expected: &[S]) -> MetricSet {
    let merge: Vec<&str> = merge.iter().map(|l| l.as_ref()).collect();
    let expected: Vec<&str> = expected.iter().map(|l| l.as_ref()).collect();
    let merge_set: HashSet<&str> = merge.iter().copied().collect();
    let expected_set: HashSet<&str> = expected.iter().copied().collect();

    let correct = merge_set.intersection(&expected_set).count();
    let extra = merge_set.difference(&expected_set).count();
    let missing = expected_set.difference(&merge_set).count();

    let precision = ratio(correct, correct + extra);
    let recall = ratio(correct, correct + missing);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    let in_place = merge
        .iter()
        .zip(&expected)
        .filter(|(m, e)| m == e)
        .count();
    let line_order_accuracy = ratio(in_place, merge.len().max(expected.len()));

    MetricSet {
        precision,
        recall,
        f1_score,
        line_order_accuracy,
        similarity_ratio: sequence_ratio(&merge, &expected),
        error_rate: 1.0 - precision,
        total_expected_lines: expected_set.len(),
        total_merge_lines: merge_set.len(),
        correct_lines: correct,
        extra_lines: extra,
        missing_lines: missing,
    }
}

/// Unified diff from the expected lines to the merge lines.
pub fn diff_report<S: AsRef<str>>(expected: &[S], merge: &[S]) -> String {
    unified_diff(expected, merge, "expected", "merge", DIFF_CONTEXT)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        normalize_text(text)
    }

    #[test]
    fn normalizes_whitespace_and_drops_blank_lines() {
        let got = lines("  public   class\tA {\r\n\n   \n  int x;  \r}");
        assert_eq!(got, vec!["public class A {", "int x;", "}"]);
    }

    #[test]
    fn identical_inputs_score_perfectly() {
        let a = lines("a\nb\nc\n");
        let m = metrics(&a, &a);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
        assert_eq!(m.similarity_ratio, 1.0);
        assert_eq!(m.line_order_accuracy, 1.0);
        assert_eq!(m.error_rate, 0.0);
        assert_eq!(m.extra_lines, 0);
        assert_eq!(m.missing_lines, 0);
        assert_eq!(m.correct_lines, 3);
    }

    #[test]
    fn disjoint_inputs_score_zero() {
        let m = metrics(&lines("a\nb"), &lines("c\nd"));
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_eq!(m.error_rate, 1.0);
        assert_eq!(m.correct_lines, 0);
        assert_eq!(m.extra_lines, 2);
        assert_eq!(m.missing_lines, 2);
    }

    #[test]
    fn both_empty_is_all_zero_except_similarity() {
        let empty: Vec<String> = Vec::new();
        let m = metrics(&empty, &empty);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
        assert_eq!(m.line_order_accuracy, 0.0);
        assert_eq!(m.error_rate, 1.0);
        assert_eq!(m.similarity_ratio, 1.0);
    }

    #[test]
    fn duplicates_collapse_in_set_metrics() {
        let merge = lines("x\nx\ny");
        let expected = lines("x\ny");
        let m = metrics(&merge, &expected);
        assert_eq!(m.total_merge_lines, 2);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        // Order and sequence metrics still see the duplicate.
        assert!((m.line_order_accuracy - 1.0 / 3.0).abs() < 1e-9);
        assert!((m.similarity_ratio - 0.8).abs() < 1e-9);
    }

    #[test]
    fn reordering_keeps_sets_but_hurts_order() {
        let m = metrics(&lines("b\na"), &lines("a\nb"));
        assert_eq!(m.f1_score, 1.0);
        assert_eq!(m.line_order_accuracy, 0.0);
        assert_eq!(m.similarity_ratio, 0.5);
    }

    #[test]
    fn partial_overlap() {
        let m = metrics(&lines("a\nb\nextra"), &lines("a\nb\nc\nd"));
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.recall, 0.5);
        assert!((m.f1_score - 4.0 / 7.0).abs() < 1e-9);
        assert_eq!(m.line_order_accuracy, 0.5);
    }

    #[test]
    fn diff_goes_from_expected_to_merge() {
        let diff = diff_report(&lines("a\nb"), &lines("a\nc"));
        assert!(diff.starts_with("--- expected\n+++ merge\n"));
        assert!(diff.contains("\n-b"));
        assert!(diff.contains("\n+c"));
        assert!(diff_report(&lines("a"), &lines("a")).is_empty());
    }

    #[test]
    fn load_reports_missing_and_undecodable_files() {
        let temp = tempfile::tempdir().unwrap();
        let good = temp.path().join("A.java");
        let bad = temp.path().join("B.java");
        fs::write(&good, "class A {}\n").unwrap();
        fs::write(&bad, [0xff, 0xfe, 0x00]).unwrap();

        let err = load(&good, &temp.path().join("missing.java")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        let err = load(&bad, &good).unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));

        let (m, e) = load(&good, &good).unwrap();
        assert_eq!(m, e);
        assert_eq!(m, vec!["class A {}"]);
    }
}
