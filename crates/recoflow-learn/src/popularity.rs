//! Popularity baseline, global and per catalog category

use crate::content::Product;
use crate::scorer::{rank_scores, Scorer, TrainableScorer};
use recoflow_core::{InteractionSet, RecoError, ScoreMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub const POPULARITY: &str = "popularity";

/// Sum of interaction weights per item, identical for every user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopularityScorer {
    scores: HashMap<String, f64>,
}

impl PopularityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top_k(&self, k: usize) -> Vec<(String, f64)> {
        rank_scores(self.scores.iter().map(|(item, s)| (item.clone(), *s)), k)
    }

    /// Ranked items per category. Items missing from the catalog, or
    /// listed without a category, are left out.
    pub fn by_category(
        &self,
        products: &[Product],
        k: usize,
    ) -> recoflow_core::Result<BTreeMap<String, Vec<(String, f64)>>> {
        let categories: HashMap<&str, &str> = products
            .iter()
            .filter_map(|p| {
                let category = p.category.as_deref().map(str::trim)?;
                (!category.is_empty()).then_some((p.product_id.as_str(), category))
            })
            .collect();
        if categories.is_empty() {
            return Err(RecoError::MissingColumn("category".to_string()));
        }

        let mut grouped: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();
        for (item, score) in &self.scores {
            if let Some(category) = categories.get(item.as_str()) {
                grouped
                    .entry(category.to_string())
                    .or_default()
                    .push((item.clone(), *score));
            }
        }
        for items in grouped.values_mut() {
            *items = rank_scores(std::mem::take(items), k);
        }
        debug!(categories = grouped.len(), "grouped popularity");
        Ok(grouped)
    }

    /// Top `k` items of one category; empty when nothing popular falls in it
    pub fn top_k_by_category(
        &self,
        products: &[Product],
        category: &str,
        k: usize,
    ) -> recoflow_core::Result<Vec<(String, f64)>> {
        Ok(self
            .by_category(products, k)?
            .remove(category)
            .unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl Scorer for PopularityScorer {
    fn name(&self) -> &str {
        POPULARITY
    }

    fn score(&self, _user_id: &str) -> ScoreMap {
        self.scores.clone()
    }
}

impl TrainableScorer for PopularityScorer {
    fn fit(&mut self, interactions: &InteractionSet) {
        self.scores.clear();
        for record in &interactions.records {
            *self.scores.entry(record.item_id.clone()).or_insert(0.0) += record.weight;
        }
        debug!(items = self.scores.len(), "fitted popularity");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use recoflow_core::{build_interactions, sessionize, Event, EventWeights};

    fn fitted() -> PopularityScorer {
        let at = |s| Utc.timestamp_opt(s, 0).unwrap();
        let events = vec![
            Event::with_item("u1", "view", at(0), "a"),
            Event::with_item("u1", "purchase", at(10), "a"),
            Event::with_item("u2", "view", at(0), "b"),
            Event::with_item("u2", "add_to_cart", at(5), "b"),
            Event::with_item("u3", "click", at(0), "c"),
        ];
        let sessions = sessionize(events, 1800).unwrap();
        let mut scorer = PopularityScorer::new();
        scorer.fit(&build_interactions(&sessions, &EventWeights::default()));
        scorer
    }

    #[test]
    fn test_popularity_sums_weights() {
        let scorer = fitted();
        let top = scorer.top_k(10);
        assert_eq!(top[0], ("a".to_string(), 6.0));
        assert_eq!(top[1], ("b".to_string(), 3.0));
        assert_eq!(top[2], ("c".to_string(), 0.5));
    }

    #[test]
    fn test_same_scores_for_every_user() {
        let scorer = fitted();
        assert_eq!(scorer.score("u1"), scorer.score("someone-new"));
        assert_eq!(scorer.top_k(1).len(), 1);
    }

    fn catalog() -> Vec<Product> {
        let product = |id: &str, category: Option<&str>| Product {
            product_id: id.to_string(),
            title: None,
            description: None,
            category: category.map(str::to_string),
        };
        vec![
            product("a", Some("shoes")),
            product("b", Some("bags")),
            product("c", Some("shoes")),
            product("d", None),
        ]
    }

    #[test]
    fn test_popularity_by_category() {
        let scorer = fitted();
        let grouped = scorer.by_category(&catalog(), 10).unwrap();
        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec!["bags", "shoes"]);
        assert_eq!(
            grouped["shoes"],
            vec![("a".to_string(), 6.0), ("c".to_string(), 0.5)]
        );

        let shoes = scorer.top_k_by_category(&catalog(), "shoes", 1).unwrap();
        assert_eq!(shoes, vec![("a".to_string(), 6.0)]);
        assert!(scorer
            .top_k_by_category(&catalog(), "hats", 5)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_by_category_requires_category_data() {
        let scorer = fitted();
        let uncategorized: Vec<Product> = catalog()
            .into_iter()
            .map(|p| Product {
                category: None,
                ..p
            })
            .collect();
        assert!(matches!(
            scorer.by_category(&uncategorized, 5),
            Err(RecoError::MissingColumn(_))
        ));
        assert!(scorer.by_category(&[], 5).is_err());
    }

    #[test]
    fn test_unfitted_is_empty() {
        let scorer = PopularityScorer::new();
        assert!(scorer.is_empty());
        assert!(scorer.score("u1").is_empty());
    }
}
