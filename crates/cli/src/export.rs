//! Writes a run report to a timestamped directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use mergescore_core::report::RunReport;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Recursive,
    Legacy,
}

impl Layout {
    fn dir_prefix(self) -> &'static str {
        match self {
            Layout::Recursive => "recursive_comparison",
            Layout::Legacy => "comparison",
        }
    }

    fn report_file(self) -> &'static str {
        match self {
            Layout::Recursive => "full_recursive_report.json",
            Layout::Legacy => "full_report.json",
        }
    }
}

pub fn report_dir(output_root: &Path, layout: Layout, at: DateTime<Local>) -> PathBuf {
    output_root.join(format!(
        "{}_{}",
        layout.dir_prefix(),
        at.format("%Y%m%d_%H%M%S")
    ))
}

/// `a/b/C.java` -> `a_b_C.java_diff.txt`
pub fn diff_file_name(scenario: &str) -> String {
    format!("{}_diff.txt", scenario.replace(['/', '\\'], "_"))
}

/// Writes the JSON report, the correspondence listing and one diff per
/// compared pair. Returns the created directory.
pub fn write_report(output_root: &Path, report: &RunReport, layout: Layout) -> Result<PathBuf> {
    let dir = report_dir(output_root, layout, Local::now());
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let json_path = dir.join(layout.report_file());
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&json_path, json).with_context(|| format!("writing {}", json_path.display()))?;

    let listing_path = dir.join("file_correspondences.txt");
    fs::write(&listing_path, correspondence_listing(report))
        .with_context(|| format!("writing {}", listing_path.display()))?;

    let mut diffs = 0;
    for result in &report.results {
        if let Some(diff) = &result.diff {
            let path = dir.join(diff_file_name(&result.scenario));
            fs::write(&path, diff).with_context(|| format!("writing {}", path.display()))?;
            diffs += 1;
        }
    }
    info!("Report written to {} ({} diffs)", dir.display(), diffs);
    Ok(dir)
}

pub fn correspondence_listing(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "FILE CORRESPONDENCE REPORT");
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out);
    for corr in &report.correspondences {
        let _ = writeln!(out, "Type: {}", corr.kind.as_str());
        let _ = writeln!(out, "Scenario: {}", corr.scenario);
        let _ = writeln!(out, "Merge file: {}", corr.merge_file.as_deref().unwrap_or("-"));
        let _ = writeln!(
            out,
            "Expected file: {}",
            corr.expected_file.as_deref().unwrap_or("-")
        );
        let _ = writeln!(out, "Match score: {:.3}", corr.match_score);
        if !corr.quality_issues.is_empty() {
            let issues: Vec<&str> = corr.quality_issues.iter().map(|i| i.as_str()).collect();
            let _ = writeln!(out, "Issues: {}", issues.join(", "));
        }
        let _ = writeln!(out, "{}", "-".repeat(30));
    }
    out
}
