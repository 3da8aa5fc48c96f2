//! Multi-source score normalisation and ranking

use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Item id to raw score from one source
pub type ScoreMap = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub item_id: String,
    pub score: f64,
}

/// Descending score, ties broken by item id ascending
pub type BlendedRanking = Vec<RankedItem>;

/// Min-max normalise into [0, 1].
///
/// A map whose finite scores are all equal maps every entry to 1.0, so a
/// source with no spread still counts as full evidence for its items.
/// Non-finite scores are dropped.
pub fn normalize_scores(scores: &ScoreMap) -> ScoreMap {
    let finite: Vec<(&String, f64)> = scores
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(k, v)| (k, *v))
        .collect();
    let dropped = scores.len() - finite.len();
    if dropped > 0 {
        warn!(dropped, "ignoring non-finite scores");
    }
    if finite.is_empty() {
        return ScoreMap::new();
    }

    let min = finite.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = finite
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);
    let spread = max - min;

    finite
        .into_iter()
        .map(|(k, v)| {
            let norm = if spread > 0.0 { (v - min) / spread } else { 1.0 };
            (k.clone(), norm)
        })
        .collect()
}

/// Weighted sum of normalised sources, truncated to `top_k`.
/// `top_k <= 0` returns an empty ranking.
pub fn blend(sources: &[(ScoreMap, f64)], top_k: i64) -> BlendedRanking {
    if top_k <= 0 {
        return Vec::new();
    }

    let mut combined: HashMap<String, f64> = HashMap::new();
    for (scores, weight) in sources {
        for (item, norm) in normalize_scores(scores) {
            *combined.entry(item).or_insert(0.0) += weight * norm;
        }
    }

    let mut ranking: BlendedRanking = combined
        .into_iter()
        .map(|(item_id, score)| RankedItem { item_id, score })
        .collect();
    ranking.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    ranking.truncate(usize::try_from(top_k).unwrap_or(usize::MAX));

    debug!(
        sources = sources.len(),
        ranked = ranking.len(),
        "blended score maps"
    );
    ranking
}

/// Blender over named sources with configured weights
#[derive(Debug, Clone)]
pub struct ScoreBlender {
    weights: BTreeMap<String, f64>,
    top_k: i64,
}

impl ScoreBlender {
    pub fn new(weights: BTreeMap<String, f64>, top_k: i64) -> Self {
        Self { weights, top_k }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.blend_weights.clone(), config.top_k)
    }

    pub fn weight(&self, source: &str) -> Option<f64> {
        self.weights.get(source).copied()
    }

    pub fn top_k(&self) -> i64 {
        self.top_k
    }

    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }

    /// Blend sources by name; names without a configured weight are skipped
    pub fn blend_named(&self, sources: &[(&str, ScoreMap)]) -> BlendedRanking {
        let weighted: Vec<(ScoreMap, f64)> = sources
            .iter()
            .filter_map(|(name, scores)| match self.weight(name) {
                Some(weight) => Some((scores.clone(), weight)),
                None => {
                    warn!(source = %name, "no blend weight configured for source");
                    None
                }
            })
            .collect();
        blend(&weighted, self.top_k)
    }
}

impl Default for ScoreBlender {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> ScoreMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn ids(ranking: &BlendedRanking) -> Vec<&str> {
        ranking.iter().map(|r| r.item_id.as_str()).collect()
    }

    #[test]
    fn test_normalize_min_max() {
        let norm = normalize_scores(&scores(&[("a", 2.0), ("b", 4.0), ("c", 3.0)]));
        assert_eq!(norm["a"], 0.0);
        assert_eq!(norm["b"], 1.0);
        assert!((norm["c"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_map_normalizes_to_one() {
        let norm = normalize_scores(&scores(&[("a", 0.3), ("b", 0.3)]));
        assert_eq!(norm["a"], 1.0);
        assert_eq!(norm["b"], 1.0);

        let ranking = blend(&[(scores(&[("x", 7.0)]), 0.5)], 5);
        assert_eq!(ranking[0].score, 0.5);
    }

    #[test]
    fn test_non_finite_scores_dropped() {
        let norm = normalize_scores(&scores(&[("a", f64::NAN), ("b", 1.0), ("c", 3.0)]));
        assert!(!norm.contains_key("a"));
        assert_eq!(norm.len(), 2);
    }

    #[test]
    fn test_single_source_against_empty_maps() {
        let source = scores(&[("p", 0.9), ("q", 0.1), ("r", 0.5), ("s", 0.7)]);
        let ranking = blend(
            &[(ScoreMap::new(), 0.3), (source.clone(), 1.0), (ScoreMap::new(), 0.1)],
            10,
        );
        assert_eq!(ids(&ranking), vec!["p", "s", "r", "q"]);

        let alone = blend(&[(source, 1.0)], 10);
        assert_eq!(ranking, alone);
    }

    #[test]
    fn test_ties_break_by_item_id() {
        let ranking = blend(
            &[
                (scores(&[("B", 1.0), ("A", 1.0), ("C", 0.0)]), 0.42),
            ],
            10,
        );
        assert_eq!(ids(&ranking), vec!["A", "B", "C"]);
        assert_eq!(ranking[0].score, ranking[1].score);
    }

    #[test]
    fn test_missing_items_contribute_zero() {
        let ranking = blend(
            &[
                (scores(&[("a", 1.0), ("b", 0.0)]), 0.6),
                (scores(&[("b", 1.0), ("c", 0.0)]), 0.3),
            ],
            10,
        );
        assert_eq!(ids(&ranking), vec!["a", "b", "c"]);
        assert!((ranking[0].score - 0.6).abs() < 1e-12);
        assert!((ranking[1].score - 0.3).abs() < 1e-12);
        assert_eq!(ranking[2].score, 0.0);
    }

    #[test]
    fn test_top_k_bounds() {
        let source = scores(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        assert!(blend(&[(source.clone(), 1.0)], 0).is_empty());
        assert!(blend(&[(source.clone(), 1.0)], -3).is_empty());
        assert_eq!(ids(&blend(&[(source, 1.0)], 2)), vec!["c", "b"]);
    }

    #[test]
    fn test_all_empty_sources() {
        assert!(blend(&[(ScoreMap::new(), 1.0), (ScoreMap::new(), 1.0)], 10).is_empty());
        assert!(blend(&[], 10).is_empty());
    }

    #[test]
    fn test_blend_named_uses_configured_weights() {
        let blender = ScoreBlender::default();
        let ranking = blender.blend_named(&[
            ("collaborative", scores(&[("a", 1.0), ("b", 0.0)])),
            ("trending", scores(&[("b", 1.0), ("a", 0.0)])),
            ("unknown_source", scores(&[("z", 100.0)])),
        ]);
        assert_eq!(ids(&ranking), vec!["a", "b"]);
        assert!((ranking[0].score - 0.6).abs() < 1e-12);
        assert!((ranking[1].score - 0.1).abs() < 1e-12);
    }
}
