use crate::comparator;
use crate::config::{normalize_extensions, AppConfig};
use crate::error::{LoadError, ScanError};
use crate::legacy;
use crate::models::{Correspondence, MatchStats};
use crate::report::{PairFailure, PairResult, RunReport, RunSummary};
use crate::resolver;
use crate::scanner::Scanner;
use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, warn};

/// Scans both trees, pairs their files and compares every comparable pair.
/// Only a scan failure aborts; unreadable pairs land in `failures`.
pub fn evaluate(
    merge_root: &Path,
    expected_root: &Path,
    config: &AppConfig,
) -> Result<RunReport, ScanError> {
    let scanner = Scanner::from_config(&config.scan)?;
    let merge = scanner.scan(merge_root)?;
    let expected = scanner.scan(expected_root)?;

    let resolution = resolver::resolve(&merge, &expected, &config.matching);
    info!(
        "Resolved {} correspondences ({} comparable)",
        resolution.correspondences.len(),
        resolution.comparable().count()
    );

    let (results, failures) = compare_all(
        merge_root,
        expected_root,
        &resolution.correspondences,
        config.report.write_diffs,
    );
    Ok(assemble(
        merge_root,
        expected_root,
        scanner.extensions().to_vec(),
        resolution.stats,
        resolution.correspondences,
        results,
        failures,
    ))
}

/// Exact-subdirectory compatibility run. Files without a same-named partner
/// are reported as `no_match` or `missing_in_merge` and never compared.
pub fn evaluate_legacy(
    merge_root: &Path,
    expected_root: &Path,
    config: &AppConfig,
) -> Result<RunReport, ScanError> {
    let resolution = legacy::resolve(merge_root, expected_root, &config.scan.extensions)?;
    let stats = MatchStats {
        exact_matches: resolution.pairs.len(),
        no_matches: resolution.unmatched_merge.len(),
        ..MatchStats::default()
    };
    let mut correspondences = resolution.pairs;
    correspondences.extend(
        resolution
            .unmatched_merge
            .iter()
            .map(|e| Correspondence::unmatched(&e.path, &e.filename)),
    );
    correspondences.extend(
        resolution
            .unmatched_expected
            .iter()
            .map(|e| Correspondence::missing_in_merge(&e.path, &e.filename)),
    );

    let (results, failures) = compare_all(
        merge_root,
        expected_root,
        &correspondences,
        config.report.write_diffs,
    );
    Ok(assemble(
        merge_root,
        expected_root,
        normalize_extensions(&config.scan.extensions),
        stats,
        correspondences,
        results,
        failures,
    ))
}

fn compare_all(
    merge_root: &Path,
    expected_root: &Path,
    correspondences: &[Correspondence],
    with_diff: bool,
) -> (Vec<PairResult>, Vec<PairFailure>) {
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for corr in correspondences.iter().filter(|c| c.is_comparable()) {
        match compare_pair(merge_root, expected_root, corr, with_diff) {
            Some(Ok(result)) => results.push(result),
            Some(Err(err)) => {
                warn!("Skipping {}: {err}", corr.scenario);
                failures.push(PairFailure {
                    scenario: corr.scenario.clone(),
                    error: err.to_string(),
                });
            }
            None => {}
        }
    }
    (results, failures)
}

fn compare_pair(
    merge_root: &Path,
    expected_root: &Path,
    corr: &Correspondence,
    with_diff: bool,
) -> Option<Result<PairResult, LoadError>> {
    let merge_entry = corr.merge_entry()?;
    let expected_entry = corr.expected_entry()?;
    let merge_path = merge_root.join(&merge_entry.path).join(&merge_entry.filename);
    let expected_path = expected_root
        .join(&expected_entry.path)
        .join(&expected_entry.filename);

    let (merge_lines, expected_lines) = match comparator::load(&merge_path, &expected_path) {
        Ok(lines) => lines,
        Err(err) => return Some(Err(err)),
    };
    let metrics = comparator::metrics(&merge_lines, &expected_lines);
    let adjusted_f1_score = metrics.f1_score * corr.match_score;
    debug!("{}: f1={:.3} adjusted={:.3}", corr.scenario, metrics.f1_score, adjusted_f1_score);

    Some(Ok(PairResult {
        scenario: corr.scenario.clone(),
        merge_file: merge_entry.filename,
        expected_file: expected_entry.filename,
        match_type: corr.kind,
        match_score: corr.match_score,
        quality_issues: corr.quality_issues.clone(),
        metrics,
        adjusted_f1_score,
        diff: with_diff.then(|| comparator::diff_report(&expected_lines, &merge_lines)),
    }))
}

fn assemble(
    merge_root: &Path,
    expected_root: &Path,
    extensions: Vec<String>,
    stats: MatchStats,
    correspondences: Vec<Correspondence>,
    results: Vec<PairResult>,
    failures: Vec<PairFailure>,
) -> RunReport {
    let summary = RunSummary::build(&correspondences, &results, &failures);
    info!(
        "Compared {} of {} comparable files ({} failed), average adjusted F1 {:.3}",
        summary.compared_files,
        summary.comparable_files,
        summary.failed_files,
        summary.average_adjusted_f1
    );
    RunReport {
        generated_at: Utc::now(),
        merge_dir: merge_root.display().to_string(),
        expected_dir: expected_root.display().to_string(),
        extensions,
        correspondence_stats: stats,
        summary,
        correspondences,
        results,
        failures,
    }
}
