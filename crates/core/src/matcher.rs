use crate::names::{stem, strip_merge_suffixes};
use crate::similarity::text_ratio;

pub const DEFAULT_NAME_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameMatch<'a> {
    pub name: &'a str,
    pub score: f64,
}

/// Case-insensitive similarity of two filenames, extensions ignored.
pub fn similarity(a: &str, b: &str) -> f64 {
    text_ratio(&stem(a).to_lowercase(), &stem(b).to_lowercase())
}

/// Picks the candidate that best matches `target` after merge suffixes are
/// stripped from both sides.
///
/// An exact match after stripping wins immediately with score `1.0`.
/// Otherwise the highest similarity at or above `threshold` wins, the
/// first candidate taking ties.
pub fn best_match<'a, I>(target: &str, candidates: I, threshold: f64) -> Option<NameMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let target_base = strip_merge_suffixes(target);
    let target_lower = target_base.to_lowercase();
    let mut best: Option<NameMatch<'a>> = None;

    for candidate in candidates {
        let candidate_base = strip_merge_suffixes(candidate);
        if candidate_base.to_lowercase() == target_lower {
            return Some(NameMatch {
                name: candidate,
                score: 1.0,
            });
        }
        let score = similarity(&target_base, &candidate_base);
        if score >= threshold && best.map_or(true, |b| score > b.score) {
            best = Some(NameMatch {
                name: candidate,
                score,
            });
        }
    }
    best
}
