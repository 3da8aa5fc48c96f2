//! Recent view counts

use crate::scorer::{rank_scores, Scorer, TrainableScorer};
use chrono::{DateTime, TimeDelta, Utc};
use recoflow_core::{Config, EventType, InteractionSet, ScoreMap};
use std::collections::HashMap;
use tracing::debug;

pub const TRENDING: &str = "trending";

/// Counts `view` interactions inside a trailing window
#[derive(Debug, Clone)]
pub struct TrendingScorer {
    window: TimeDelta,
    reference: Option<DateTime<Utc>>,
    limit: Option<usize>,
    counts: HashMap<String, f64>,
}

impl TrendingScorer {
    pub fn new(window: TimeDelta) -> Self {
        Self {
            window,
            reference: None,
            limit: None,
            counts: HashMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> recoflow_core::Result<Self> {
        Ok(Self::new(config.trending_window()?))
    }

    /// Window end; defaults to the latest interaction seen by `fit`
    pub fn with_reference(mut self, reference: DateTime<Utc>) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Keep only the top `limit` items
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn top_k(&self, k: usize) -> Vec<String> {
        rank_scores(self.counts.iter().map(|(item, c)| (item.clone(), *c)), k)
            .into_iter()
            .map(|(item, _)| item)
            .collect()
    }
}

impl Scorer for TrendingScorer {
    fn name(&self) -> &str {
        TRENDING
    }

    fn score(&self, _user_id: &str) -> ScoreMap {
        self.counts.clone()
    }
}

impl TrainableScorer for TrendingScorer {
    fn fit(&mut self, interactions: &InteractionSet) {
        self.counts.clear();
        let reference = self
            .reference
            .or_else(|| interactions.records.iter().map(|r| r.timestamp).max());
        let Some(reference) = reference else {
            return;
        };
        let since = reference
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        for record in &interactions.records {
            if record.event_type == EventType::View
                && record.timestamp >= since
                && record.timestamp <= reference
            {
                *self.counts.entry(record.item_id.clone()).or_insert(0.0) += 1.0;
            }
        }

        if let Some(limit) = self.limit {
            let kept = rank_scores(self.counts.drain(), limit);
            self.counts.extend(kept);
        }
        debug!(items = self.counts.len(), %reference, "fitted trending");
    }
}
