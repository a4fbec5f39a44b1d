//! Console rendering. Everything returns a `String`; callers print it.

use colored::Colorize;
use mergescore_core::analysis::ToolReports;
use mergescore_core::models::MetricSet;
use mergescore_core::report::{PairResult, QualityTier, RunReport};
use std::fmt::Write;

/// Whether rendered text carries ANSI colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub color: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn header(&self, text: &str) -> String {
        self.paint(text, |t| t.bold().cyan().to_string())
    }

    pub fn good(&self, text: &str) -> String {
        self.paint(text, |t| t.green().to_string())
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow().to_string())
    }

    pub fn bad(&self, text: &str) -> String {
        self.paint(text, |t| t.red().to_string())
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed().to_string())
    }

    pub fn tier(&self, tier: QualityTier, text: &str) -> String {
        match tier {
            QualityTier::Perfect | QualityTier::High => self.good(text),
            QualityTier::Medium => self.warn(text),
            QualityTier::Low => self.bad(text),
        }
    }

    fn paint(&self, text: &str, f: impl Fn(&str) -> String) -> String {
        if self.color {
            f(text)
        } else {
            text.to_string()
        }
    }
}

/// Grid table with left-aligned columns sized to their widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let rule = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let rule = format!("+{rule}+\n");
    let line = |cells: Vec<&str>| {
        let body = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).copied().unwrap_or("");
                format!(" {cell}{} ", " ".repeat(w - cell.chars().count()))
            })
            .collect::<Vec<_>>()
            .join("|");
        format!("|{body}|\n")
    };

    let mut out = rule.clone();
    out.push_str(&line(headers.to_vec()));
    out.push_str(&rule);
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    if !rows.is_empty() {
        out.push_str(&rule);
    }
    out
}

fn score(value: f64) -> String {
    format!("{value:.3}")
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn render_metrics(metrics: &MetricSet, palette: Palette) -> String {
    let tier = QualityTier::from_score(metrics.f1_score);
    let mut out = String::new();
    let _ = writeln!(out, "  Precision:           {}", pct(metrics.precision));
    let _ = writeln!(out, "  Recall:              {}", pct(metrics.recall));
    let _ = writeln!(out, "  F1 score:            {}", palette.tier(tier, &pct(metrics.f1_score)));
    let _ = writeln!(out, "  Line order accuracy: {}", pct(metrics.line_order_accuracy));
    let _ = writeln!(out, "  Similarity ratio:    {}", pct(metrics.similarity_ratio));
    let _ = writeln!(out, "  Error rate:          {}", pct(metrics.error_rate));
    let _ = writeln!(
        out,
        "  Lines: {} expected, {} merge, {} correct, {} extra, {} missing",
        metrics.total_expected_lines,
        metrics.total_merge_lines,
        metrics.correct_lines,
        metrics.extra_lines,
        metrics.missing_lines
    );
    out
}

pub fn render_report(report: &RunReport, worst_limit: usize, palette: Palette) -> String {
    let mut out = String::new();
    let s = &report.summary;
    let stats = &report.correspondence_stats;

    let _ = writeln!(out, "{}", palette.header("=== MERGE QUALITY REPORT ==="));
    let _ = writeln!(out, "Merge:    {}", report.merge_dir);
    let _ = writeln!(out, "Expected: {}", report.expected_dir);
    let _ = writeln!(out, "Extensions: {}", report.extensions.join(", "));
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", palette.header("Correspondences"));
    let _ = writeln!(out, "  Exact matches:     {}", stats.exact_matches);
    let _ = writeln!(out, "  Fuzzy matches:     {}", stats.fuzzy_matches);
    let _ = writeln!(out, "  No match:          {}", stats.no_matches);
    let _ = writeln!(out, "  Conflict files:    {}", stats.conflict_files);
    let _ = writeln!(out, "  Missing in merge:  {}", s.missing_in_merge);
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", palette.header("Summary"));
    let _ = writeln!(
        out,
        "  Compared {} of {} comparable files",
        s.compared_files, s.comparable_files
    );
    if s.failed_files > 0 {
        let _ = writeln!(out, "  {}", palette.bad(&format!("Failed to load: {}", s.failed_files)));
    }
    let _ = writeln!(out, "  {}", palette.good(&format!("Perfect (100%):  {}", s.perfect_matches)));
    let _ = writeln!(out, "  {}", palette.good(&format!("High (>=90%):    {}", s.high_quality)));
    let _ = writeln!(out, "  {}", palette.warn(&format!("Medium (>=70%):  {}", s.medium_quality)));
    let _ = writeln!(out, "  {}", palette.bad(&format!("Low (<70%):      {}", s.low_quality)));
    let _ = writeln!(out, "  Name quality issues:   {}", s.name_quality_issues);
    let _ = writeln!(out, "  Unresolved conflicts:  {}", s.unresolved_conflicts);
    let _ = writeln!(out, "  Average precision:     {}", pct(s.average_precision));
    let _ = writeln!(out, "  Average recall:        {}", pct(s.average_recall));
    let _ = writeln!(out, "  Average adjusted F1:   {}", pct(s.average_adjusted_f1));
    let _ = writeln!(out, "  Average similarity:    {}", pct(s.average_similarity));

    let worst = report.worst(worst_limit);
    if !worst.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", palette.header("Lowest adjusted F1"));
        out.push_str(&result_table(&worst, palette));
    }

    let flagged = report.with_issues();
    if !flagged.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", palette.header("Files with name issues"));
        for r in flagged {
            let issues: Vec<&str> = r.quality_issues.iter().map(|i| i.as_str()).collect();
            let _ = writeln!(
                out,
                "  {} -> {} ({}, score {})",
                r.merge_file,
                r.expected_file,
                palette.warn(&issues.join(", ")),
                score(r.match_score)
            );
        }
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", palette.header("Failed pairs"));
        for f in &report.failures {
            let _ = writeln!(out, "  {} {}", palette.bad(&f.scenario), palette.dim(&f.error));
        }
    }
    out
}

fn result_table(results: &[&PairResult], palette: Palette) -> String {
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            vec![
                r.scenario.clone(),
                r.match_type.as_str().to_string(),
                score(r.match_score),
                score(r.metrics.f1_score),
                score(r.adjusted_f1_score),
                r.tier().as_str().to_string(),
            ]
        })
        .collect();
    // Colour goes on after layout so escape codes do not skew the padding.
    let rendered = table(
        &["Scenario", "Match", "Name score", "F1", "Adjusted F1", "Tier"],
        &rows,
    );
    let mut out = String::new();
    for (i, line) in rendered.lines().enumerate() {
        // Three lines of rule and header precede the first row.
        match i.checked_sub(3).and_then(|row| results.get(row)) {
            Some(r) => out.push_str(&palette.tier(r.tier(), line)),
            None => out.push_str(line),
        }
        out.push('\n');
    }
    out
}

/// Tables across loaded tool reports. `tool` narrows the per-scenario
/// tables; with one report loaded it defaults to that report.
pub fn render_analysis(reports: &ToolReports, tool: Option<&str>, palette: Palette) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", palette.header("Summary by tool"));
    let rows: Vec<Vec<String>> = reports
        .summary_rows()
        .into_iter()
        .map(|r| {
            vec![
                r.tool,
                r.compared_files.to_string(),
                r.perfect_matches.to_string(),
                r.high_quality.to_string(),
                r.medium_quality.to_string(),
                r.low_quality.to_string(),
                score(r.average_precision),
                score(r.average_recall),
                score(r.average_adjusted_f1),
                score(r.average_similarity),
            ]
        })
        .collect();
    out.push_str(&table(
        &[
            "Tool", "Files", "Perfect", "High", "Medium", "Low", "Precision", "Recall",
            "Adj. F1", "Similarity",
        ],
        &rows,
    ));

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", palette.header("Correspondences by tool"));
    let rows: Vec<Vec<String>> = reports
        .correspondence_rows()
        .into_iter()
        .map(|r| {
            vec![
                r.tool,
                r.exact_matches.to_string(),
                r.fuzzy_matches.to_string(),
                r.no_matches.to_string(),
                r.conflict_files.to_string(),
                r.missing_in_merge.to_string(),
            ]
        })
        .collect();
    out.push_str(&table(
        &["Tool", "Exact", "Fuzzy", "No match", "Conflicts", "Missing"],
        &rows,
    ));

    let single = (reports.len() == 1).then(|| reports.tools().next()).flatten();
    if let Some(tool) = tool.or(single) {
        if let Some(rows) = reports.scenario_averages(tool) {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", palette.header(&format!("Scenarios for {tool}")));
            let rows: Vec<Vec<String>> = rows
                .into_iter()
                .map(|r| {
                    vec![
                        r.scenario,
                        r.files.to_string(),
                        score(r.precision),
                        score(r.recall),
                        score(r.f1_score),
                        score(r.similarity),
                    ]
                })
                .collect();
            out.push_str(&table(
                &["Scenario", "Files", "Precision", "Recall", "F1", "Similarity"],
                &rows,
            ));
        } else {
            let _ = writeln!(out, "{}", palette.warn(&format!("Tool '{tool}' not loaded")));
        }
        if let Some(rows) = reports.detailed_rows(tool).filter(|r| !r.is_empty()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", palette.header(&format!("Files for {tool}")));
            let rows: Vec<Vec<String>> = rows
                .into_iter()
                .map(|r| {
                    vec![
                        r.scenario,
                        score(r.precision),
                        score(r.recall),
                        score(r.f1_score),
                        score(r.line_order_accuracy),
                        score(r.similarity),
                        r.expected_lines.to_string(),
                        r.merge_lines.to_string(),
                        score(r.error_rate),
                    ]
                })
                .collect();
            out.push_str(&table(
                &[
                    "File", "Precision", "Recall", "F1", "Order", "Similarity", "Expected",
                    "Merge", "Error rate",
                ],
                &rows,
            ));
        }
        if let Some(rows) = reports.missing_by_scenario(tool).filter(|r| !r.is_empty()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", palette.header(&format!("Missing files for {tool}")));
            let rows: Vec<Vec<String>> = rows
                .into_iter()
                .map(|r| vec![r.scenario, r.files.len().to_string(), r.files.join(", ")])
                .collect();
            out.push_str(&table(&["Scenario", "Missing", "Files"], &rows));
        }
    }

    if let Some(cmp) = reports.compare_by_scenario() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", palette.header("F1 by scenario"));
        let headers: Vec<String> = std::iter::once("Scenario".to_string())
            .chain(cmp.tools.iter().map(|t| format!("{t} F1")))
            .collect();
        let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
        let rows: Vec<Vec<String>> = cmp
            .rows
            .into_iter()
            .map(|r| {
                std::iter::once(r.scenario)
                    .chain(r.f1_scores.iter().map(|f| match f {
                        Some(v) => score(*v),
                        None => "N/A".to_string(),
                    }))
                    .collect()
            })
            .collect();
        out.push_str(&table(&headers, &rows));
    }
    out
}
