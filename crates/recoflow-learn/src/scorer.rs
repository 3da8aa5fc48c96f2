//! Scorer traits shared by every recommendation source

use recoflow_core::{InteractionSet, ScoreMap};
use std::cmp::Ordering;

/// A source of per-user item scores
pub trait Scorer: Send + Sync {
    /// Source name, matched against configured blend weights
    fn name(&self) -> &str;

    /// Raw scores for a user; unknown users get an empty map
    fn score(&self, user_id: &str) -> ScoreMap;

    /// Items most similar to `item_id`, best first
    fn similar(&self, _item_id: &str, _k: usize) -> Vec<String> {
        Vec::new()
    }
}

/// Scorer whose state is learned from interactions
pub trait TrainableScorer: Scorer {
    fn fit(&mut self, interactions: &InteractionSet);
}

/// Sort descending by score with item id as tie-break, then truncate
pub fn rank_scores<I>(scores: I, k: usize) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut ranked: Vec<(String, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}
