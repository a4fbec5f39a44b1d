//! Run-level report structures.

use crate::models::{Correspondence, MatchKind, MatchStats, MetricSet, QualityIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Perfect,
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 1.0 {
            QualityTier::Perfect
        } else if score >= 0.9 {
            QualityTier::High
        } else if score >= 0.7 {
            QualityTier::Medium
        } else {
            QualityTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Perfect => "perfect",
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }
}

/// Metrics for one compared pair, keyed by its scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    pub scenario: String,
    pub merge_file: String,
    pub expected_file: String,
    pub match_type: MatchKind,
    pub match_score: f64,
    pub quality_issues: Vec<QualityIssue>,
    #[serde(flatten)]
    pub metrics: MetricSet,
    pub adjusted_f1_score: f64,
    /// Unified diff, kept out of the JSON report and written separately.
    #[serde(skip)]
    pub diff: Option<String>,
}

impl PairResult {
    pub fn tier(&self) -> QualityTier {
        QualityTier::from_score(self.adjusted_f1_score)
    }
}

/// A comparable pair whose files could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub scenario: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_correspondences: usize,
    pub comparable_files: usize,
    pub compared_files: usize,
    pub failed_files: usize,
    pub perfect_matches: usize,
    pub high_quality: usize,
    pub medium_quality: usize,
    pub low_quality: usize,
    /// Compared pairs carrying at least one quality issue.
    pub name_quality_issues: usize,
    pub unresolved_conflicts: usize,
    pub unmatched_files: usize,
    pub missing_in_merge: usize,
    pub average_precision: f64,
    pub average_recall: f64,
    pub average_adjusted_f1: f64,
    pub average_similarity: f64,
}

impl RunSummary {
    pub fn build(
        correspondences: &[Correspondence],
        results: &[PairResult],
        failures: &[PairFailure],
    ) -> Self {
        let count = |kind: MatchKind| correspondences.iter().filter(|c| c.kind == kind).count();
        let tier = |t: QualityTier| results.iter().filter(|r| r.tier() == t).count();
        let mean = |f: fn(&PairResult) -> f64| {
            if results.is_empty() {
                0.0
            } else {
                results.iter().map(f).sum::<f64>() / results.len() as f64
            }
        };

        Self {
            total_correspondences: correspondences.len(),
            comparable_files: correspondences.iter().filter(|c| c.is_comparable()).count(),
            compared_files: results.len(),
            failed_files: failures.len(),
            perfect_matches: tier(QualityTier::Perfect),
            high_quality: tier(QualityTier::High),
            medium_quality: tier(QualityTier::Medium),
            low_quality: tier(QualityTier::Low),
            name_quality_issues: results.iter().filter(|r| !r.quality_issues.is_empty()).count(),
            unresolved_conflicts: count(MatchKind::ConflictFile),
            unmatched_files: count(MatchKind::NoMatch),
            missing_in_merge: count(MatchKind::MissingInMerge),
            average_precision: mean(|r| r.metrics.precision),
            average_recall: mean(|r| r.metrics.recall),
            average_adjusted_f1: mean(|r| r.adjusted_f1_score),
            average_similarity: mean(|r| r.metrics.similarity_ratio),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub merge_dir: String,
    pub expected_dir: String,
    pub extensions: Vec<String>,
    pub correspondence_stats: MatchStats,
    pub summary: RunSummary,
    pub correspondences: Vec<Correspondence>,
    pub results: Vec<PairResult>,
    #[serde(default)]
    pub failures: Vec<PairFailure>,
}

impl RunReport {
    /// The `n` lowest-scoring results; ties keep report order.
    pub fn worst(&self, n: usize) -> Vec<&PairResult> {
        let mut sorted: Vec<&PairResult> = self.results.iter().collect();
        sorted.sort_by(|a, b| by_adjusted_f1(a, b));
        sorted.truncate(n);
        sorted
    }

    /// Results carrying quality issues, lowest score first.
    pub fn with_issues(&self) -> Vec<&PairResult> {
        let mut flagged: Vec<&PairResult> = self
            .results
            .iter()
            .filter(|r| !r.quality_issues.is_empty())
            .collect();
        flagged.sort_by(|a, b| by_adjusted_f1(a, b));
        flagged
    }
}

fn by_adjusted_f1(a: &PairResult, b: &PairResult) -> Ordering {
    a.adjusted_f1_score
        .partial_cmp(&b.adjusted_f1_score)
        .unwrap_or(Ordering::Equal)
}
