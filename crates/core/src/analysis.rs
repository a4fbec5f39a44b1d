//! Side-by-side analysis of run reports produced for several merge tools.

use crate::models::MatchKind;
use crate::report::{PairResult, RunReport};
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Tool names recognized in a report's merge directory.
pub const KNOWN_TOOLS: &[&str] = &["IntelliMerge", "JDime", "FSTMerge", "GitMerge"];

#[derive(Debug, Clone, Default)]
pub struct ToolReports {
    reports: BTreeMap<String, RunReport>,
    extra_tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub tool: String,
    pub compared_files: usize,
    pub perfect_matches: usize,
    pub high_quality: usize,
    pub medium_quality: usize,
    pub low_quality: usize,
    pub average_precision: f64,
    pub average_recall: f64,
    pub average_adjusted_f1: f64,
    pub average_similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrespondenceRow {
    pub tool: String,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub no_matches: usize,
    pub conflict_files: usize,
    pub missing_in_merge: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingRow {
    pub scenario: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioAverages {
    pub scenario: String,
    pub files: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub similarity: f64,
}

/// Per-file metrics of one tool's report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedRow {
    pub scenario: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub line_order_accuracy: f64,
    pub similarity: f64,
    pub expected_lines: usize,
    pub merge_lines: usize,
    pub error_rate: f64,
}

/// Mean F1 per scenario and tool; `None` where a tool has no result for the
/// scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolComparison {
    pub tools: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub scenario: String,
    pub f1_scores: Vec<Option<f64>>,
}

impl ToolReports {
    /// `extra_tools` are matched against merge directories after the built-in
    /// names.
    pub fn new(extra_tools: Vec<String>) -> Self {
        Self {
            reports: BTreeMap::new(),
            extra_tools,
        }
    }

    /// Loads a JSON run report and files it under `tool_name`, or under the
    /// detected name. Returns the name used.
    pub fn load(&mut self, path: &Path, tool_name: Option<&str>) -> anyhow::Result<String> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading report {}", path.display()))?;
        let report: RunReport = serde_json::from_str(&text)
            .with_context(|| format!("parsing report {}", path.display()))?;
        let name = match tool_name {
            Some(name) => name.to_string(),
            None => self.detect_tool(&report.merge_dir).unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            }),
        };
        info!("Loaded {} as {name}", path.display());
        self.insert(name.clone(), report);
        Ok(name)
    }

    pub fn insert(&mut self, tool: impl Into<String>, report: RunReport) {
        self.reports.insert(tool.into(), report);
    }

    pub fn detect_tool(&self, merge_dir: &str) -> Option<String> {
        KNOWN_TOOLS
            .iter()
            .find(|tool| merge_dir.contains(**tool))
            .map(|tool| tool.to_string())
            .or_else(|| {
                self.extra_tools
                    .iter()
                    .find(|tool| merge_dir.contains(tool.as_str()))
                    .cloned()
            })
    }

    pub fn tools(&self) -> impl Iterator<Item = &str> {
        self.reports.keys().map(String::as_str)
    }

    pub fn get(&self, tool: &str) -> Option<&RunReport> {
        self.reports.get(tool)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        self.reports
            .iter()
            .map(|(tool, report)| {
                let s = &report.summary;
                SummaryRow {
                    tool: tool.clone(),
                    compared_files: s.compared_files,
                    perfect_matches: s.perfect_matches,
                    high_quality: s.high_quality,
                    medium_quality: s.medium_quality,
                    low_quality: s.low_quality,
                    average_precision: s.average_precision,
                    average_recall: s.average_recall,
                    average_adjusted_f1: s.average_adjusted_f1,
                    average_similarity: s.average_similarity,
                }
            })
            .collect()
    }

    pub fn correspondence_rows(&self) -> Vec<CorrespondenceRow> {
        self.reports
            .iter()
            .map(|(tool, report)| {
                let stats = report.correspondence_stats;
                CorrespondenceRow {
                    tool: tool.clone(),
                    exact_matches: stats.exact_matches,
                    fuzzy_matches: stats.fuzzy_matches,
                    no_matches: stats.no_matches,
                    conflict_files: stats.conflict_files,
                    missing_in_merge: report
                        .correspondences
                        .iter()
                        .filter(|c| c.kind == MatchKind::MissingInMerge)
                        .count(),
                }
            })
            .collect()
    }

    /// Expected files absent from the merge output, grouped by scenario
    /// folder.
    pub fn missing_by_scenario(&self, tool: &str) -> Option<Vec<MissingRow>> {
        let report = self.reports.get(tool)?;
        let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for corr in report
            .correspondences
            .iter()
            .filter(|c| c.kind == MatchKind::MissingInMerge)
        {
            groups
                .entry(scenario_group(&corr.scenario))
                .or_default()
                .push(corr.expected_file.clone().unwrap_or_default());
        }
        Some(
            groups
                .into_iter()
                .map(|(scenario, files)| MissingRow {
                    scenario: scenario.to_string(),
                    files,
                })
                .collect(),
        )
    }

    pub fn scenario_averages(&self, tool: &str) -> Option<Vec<ScenarioAverages>> {
        let report = self.reports.get(tool)?;
        Some(
            group_results(&report.results)
                .into_iter()
                .map(|(scenario, results)| ScenarioAverages {
                    scenario: scenario.to_string(),
                    files: results.len(),
                    precision: mean(&results, |r| r.metrics.precision),
                    recall: mean(&results, |r| r.metrics.recall),
                    f1_score: mean(&results, |r| r.metrics.f1_score),
                    similarity: mean(&results, |r| r.metrics.similarity_ratio),
                })
                .collect(),
        )
    }

    pub fn detailed_rows(&self, tool: &str) -> Option<Vec<DetailedRow>> {
        let report = self.reports.get(tool)?;
        let mut rows: Vec<DetailedRow> = report
            .results
            .iter()
            .map(|r| DetailedRow {
                scenario: r.scenario.clone(),
                precision: r.metrics.precision,
                recall: r.metrics.recall,
                f1_score: r.metrics.f1_score,
                line_order_accuracy: r.metrics.line_order_accuracy,
                similarity: r.metrics.similarity_ratio,
                expected_lines: r.metrics.total_expected_lines,
                merge_lines: r.metrics.total_merge_lines,
                error_rate: r.metrics.error_rate,
            })
            .collect();
        rows.sort_by(|a, b| a.scenario.cmp(&b.scenario));
        Some(rows)
    }

    /// Needs at least two tools.
    pub fn compare_by_scenario(&self) -> Option<ToolComparison> {
        if self.reports.len() < 2 {
            return None;
        }
        let per_tool: Vec<BTreeMap<&str, Vec<&PairResult>>> = self
            .reports
            .values()
            .map(|r| group_results(&r.results))
            .collect();
        let mut scenarios: Vec<&str> = per_tool.iter().flat_map(|g| g.keys().copied()).collect();
        scenarios.sort_unstable();
        scenarios.dedup();

        let rows = scenarios
            .into_iter()
            .map(|scenario| ComparisonRow {
                scenario: scenario.to_string(),
                f1_scores: per_tool
                    .iter()
                    .map(|g| g.get(scenario).map(|rs| mean(rs, |r| r.metrics.f1_score)))
                    .collect(),
            })
            .collect();
        Some(ToolComparison {
            tools: self.reports.keys().cloned().collect(),
            rows,
        })
    }
}

/// First segment of a scenario key: the scenario folder.
fn scenario_group(scenario: &str) -> &str {
    scenario.split('/').next().unwrap_or(scenario)
}

fn group_results(results: &[PairResult]) -> BTreeMap<&str, Vec<&PairResult>> {
    let mut groups: BTreeMap<&str, Vec<&PairResult>> = BTreeMap::new();
    for r in results {
        groups.entry(scenario_group(&r.scenario)).or_default().push(r);
    }
    groups
}

fn mean(results: &[&PairResult], f: impl Fn(&PairResult) -> f64) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| f(r)).sum::<f64>() / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Correspondence, MatchStats, MetricSet};
    use crate::report::RunSummary;
    use chrono::Utc;

    fn pair(scenario: &str, f1: f64) -> PairResult {
        PairResult {
            scenario: scenario.to_string(),
            merge_file: "A.java".into(),
            expected_file: "A.java".into(),
            match_type: MatchKind::ExactMatch,
            match_score: 1.0,
            quality_issues: Vec::new(),
            metrics: MetricSet {
                precision: f1,
                recall: f1,
                f1_score: f1,
                ..MetricSet::default()
            },
            adjusted_f1_score: f1,
            diff: None,
        }
    }

    fn report(merge_dir: &str, results: Vec<PairResult>, correspondences: Vec<Correspondence>) -> RunReport {
        RunReport {
            generated_at: Utc::now(),
            merge_dir: merge_dir.into(),
            expected_dir: "expected".into(),
            extensions: vec![".java".into()],
            correspondence_stats: MatchStats {
                exact_matches: results.len(),
                ..MatchStats::default()
            },
            summary: RunSummary::build(&correspondences, &results, &[]),
            correspondences,
            results,
            failures: Vec::new(),
        }
    }

    #[test]
    fn detects_tool_from_merge_dir_then_file_stem() {
        let temp = tempfile::tempdir().unwrap();
        let a = temp.path().join("run_a.json");
        let b = temp.path().join("run_b.json");
        let r = report("output/JDime/scenarios", vec![], vec![]);
        fs::write(&a, serde_json::to_string(&r).unwrap()).unwrap();
        let r = report("output/Custom/scenarios", vec![], vec![]);
        fs::write(&b, serde_json::to_string(&r).unwrap()).unwrap();

        let mut reports = ToolReports::new(Vec::new());
        assert_eq!(reports.load(&a, None).unwrap(), "JDime");
        assert_eq!(reports.load(&b, None).unwrap(), "run_b");
        assert_eq!(reports.load(&b, Some("Mine")).unwrap(), "Mine");
        assert_eq!(reports.tools().collect::<Vec<_>>(), vec!["JDime", "Mine", "run_b"]);

        let mut custom = ToolReports::new(vec!["Custom".into()]);
        assert_eq!(custom.load(&b, None).unwrap(), "Custom");
    }

    #[test]
    fn bad_report_file_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(ToolReports::default().load(&path, None).is_err());
    }

    #[test]
    fn missing_files_grouped_by_scenario_folder() {
        let mut reports = ToolReports::default();
        reports.insert(
            "T",
            report(
                "m",
                vec![],
                vec![
                    Correspondence::missing_in_merge("s2", "B.java"),
                    Correspondence::missing_in_merge("s1/deep", "A.java"),
                    Correspondence::missing_in_merge("s1", "C.java"),
                    Correspondence::exact("s1", "D.java", "s1"),
                ],
            ),
        );
        let rows = reports.missing_by_scenario("T").unwrap();
        assert_eq!(
            rows,
            vec![
                MissingRow {
                    scenario: "s1".into(),
                    files: vec!["A.java".into(), "C.java".into()]
                },
                MissingRow {
                    scenario: "s2".into(),
                    files: vec!["B.java".into()]
                },
            ]
        );
        assert_eq!(reports.correspondence_rows()[0].missing_in_merge, 3);
        assert!(reports.missing_by_scenario("other").is_none());
    }

    #[test]
    fn scenario_averages_use_raw_f1() {
        let mut reports = ToolReports::default();
        reports.insert(
            "T",
            report("m", vec![pair("s1/A.java", 1.0), pair("s1/B.java", 0.5), pair("s2/C.java", 0.2)], vec![]),
        );
        let rows = reports.scenario_averages("T").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].scenario, "s1");
        assert_eq!(rows[0].files, 2);
        assert!((rows[0].f1_score - 0.75).abs() < 1e-9);
        assert!((rows[1].precision - 0.2).abs() < 1e-9);
    }

    #[test]
    fn detailed_rows_list_every_file() {
        let mut slow = pair("s2/B.java", 0.4);
        slow.metrics.line_order_accuracy = 0.25;
        slow.metrics.error_rate = 0.6;
        slow.metrics.total_expected_lines = 10;
        slow.metrics.total_merge_lines = 12;
        let mut reports = ToolReports::default();
        reports.insert("T", report("m", vec![slow, pair("s1/A.java", 1.0)], vec![]));

        let rows = reports.detailed_rows("T").unwrap();
        let scenarios: Vec<&str> = rows.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(scenarios, vec!["s1/A.java", "s2/B.java"]);
        assert_eq!(rows[1].line_order_accuracy, 0.25);
        assert_eq!(rows[1].error_rate, 0.6);
        assert_eq!((rows[1].expected_lines, rows[1].merge_lines), (10, 12));
        assert!(reports.detailed_rows("other").is_none());
    }

    #[test]
    fn comparison_needs_two_tools() {
        let mut reports = ToolReports::default();
        reports.insert("A", report("m", vec![pair("s1/X.java", 1.0)], vec![]));
        assert!(reports.compare_by_scenario().is_none());

        reports.insert("B", report("m", vec![pair("s2/X.java", 0.4)], vec![]));
        let cmp = reports.compare_by_scenario().unwrap();
        assert_eq!(cmp.tools, vec!["A", "B"]);
        assert_eq!(cmp.rows.len(), 2);
        assert_eq!(cmp.rows[0].scenario, "s1");
        assert_eq!(cmp.rows[0].f1_scores, vec![Some(1.0), None]);
        assert_eq!(cmp.rows[1].f1_scores, vec![None, Some(0.4)]);
    }

    #[test]
    fn summary_rows_follow_tool_order() {
        let mut reports = ToolReports::default();
        reports.insert("Zed", report("m", vec![pair("s/A.java", 1.0)], vec![]));
        reports.insert("Alpha", report("m", vec![pair("s/A.java", 0.5)], vec![]));
        let rows = reports.summary_rows();
        assert_eq!(rows[0].tool, "Alpha");
        assert_eq!(rows[0].low_quality, 1);
        assert_eq!(rows[1].perfect_matches, 1);
    }
}
