//! Item-to-item collaborative scorer

use crate::scorer::{rank_scores, Scorer, TrainableScorer};
use recoflow_core::{InteractionSet, ScoreMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const COLLABORATIVE: &str = "collaborative";

/// Scores items by how often they share users with a user's history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CooccurrenceScorer {
    // item -> item -> number of users with both
    co_occurrence: HashMap<String, HashMap<String, usize>>,
    // user -> (item, accumulated weight)
    histories: HashMap<String, Vec<(String, f64)>>,
}

impl CooccurrenceScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn co_count(&self, a: &str, b: &str) -> usize {
        self.co_occurrence
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(0)
    }
}

impl Scorer for CooccurrenceScorer {
    fn name(&self) -> &str {
        COLLABORATIVE
    }

    fn score(&self, user_id: &str) -> ScoreMap {
        let mut scores = ScoreMap::new();
        let Some(history) = self.histories.get(user_id) else {
            return scores;
        };

        for (item, weight) in history {
            if let Some(co_items) = self.co_occurrence.get(item) {
                for (co_item, &count) in co_items {
                    if !history.iter().any(|(seen, _)| seen == co_item) {
                        *scores.entry(co_item.clone()).or_insert(0.0) += count as f64 * weight;
                    }
                }
            }
        }
        scores
    }

    fn similar(&self, item_id: &str, k: usize) -> Vec<String> {
        let Some(co_items) = self.co_occurrence.get(item_id) else {
            return Vec::new();
        };
        rank_scores(
            co_items.iter().map(|(item, &count)| (item.clone(), count as f64)),
            k,
        )
        .into_iter()
        .map(|(item, _)| item)
        .collect()
    }
}

impl TrainableScorer for CooccurrenceScorer {
    fn fit(&mut self, interactions: &InteractionSet) {
        self.co_occurrence.clear();
        self.histories.clear();

        let vocab = &interactions.vocabulary;
        for (user_index, items) in interactions.matrix.user_rows().into_iter().enumerate() {
            let Some(user_id) = vocab.user_id(user_index) else {
                continue;
            };
            let history: Vec<(String, f64)> = items
                .into_iter()
                .filter_map(|(item, weight)| vocab.item_id(item).map(|id| (id.to_string(), weight)))
                .collect();

            // Every pair of items sharing this user
            for (i, (a, _)) in history.iter().enumerate() {
                for (b, _) in history.iter().skip(i + 1) {
                    *self
                        .co_occurrence
                        .entry(a.clone())
                        .or_default()
                        .entry(b.clone())
                        .or_insert(0) += 1;
                    *self
                        .co_occurrence
                        .entry(b.clone())
                        .or_default()
                        .entry(a.clone())
                        .or_insert(0) += 1;
                }
            }
            if !history.is_empty() {
                self.histories.insert(user_id.to_string(), history);
            }
        }

        debug!(
            users = self.histories.len(),
            items = self.co_occurrence.len(),
            "fitted co-occurrence"
        );
    }
}
