use similar::TextDiff;

use crate::domain::classification::value_objects::AllowedLabels;

/// Closeness of two strings in `0.0..=1.0`.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Matching-blocks ratio over characters: `2 * matches / (len(a) + len(b))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

impl SimilarityScorer for SequenceRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        f64::from(TextDiff::from_chars(a, b).ratio())
    }
}

/// Finds the closest allow-list entry above a cutoff.
#[derive(Debug, Clone)]
pub struct LabelMatcher<S> {
    scorer: S,
    cutoff: f64,
}

impl<S: SimilarityScorer> LabelMatcher<S> {
    pub fn new(scorer: S, cutoff: f64) -> Self {
        Self {
            scorer,
            cutoff: cutoff.clamp(0.0, 1.0),
        }
    }

    /// Best-scoring label at or above the cutoff; earlier entries win ties.
    pub fn best_match<'a>(&self, label: &str, labels: &'a AllowedLabels) -> Option<&'a str> {
        let mut best: Option<(f64, &'a str)> = None;
        for (lowered, canonical) in labels.lowered() {
            let score = self.scorer.score(label, lowered);
            if score < self.cutoff {
                continue;
            }
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, canonical));
            }
        }
        best.map(|(_, canonical)| canonical)
    }
}
