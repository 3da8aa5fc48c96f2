//! Explicitly owned set of weighted scorers

use crate::scorer::Scorer;
use recoflow_core::{blend, BlendedRanking, ScoreMap};
use tracing::{debug, info};

/// Weighted scorers blended per request, plus an optional fallback
/// consulted when the blend comes back empty
pub struct ScorerRegistry {
    scorers: Vec<(Box<dyn Scorer>, f64)>,
    fallback: Option<Box<dyn Scorer>>,
}

impl ScorerRegistry {
    pub fn new() -> Self {
        Self {
            scorers: Vec::new(),
            fallback: None,
        }
    }

    pub fn register(&mut self, scorer: Box<dyn Scorer>, weight: f64) {
        debug!(scorer = scorer.name(), weight, "registered scorer");
        self.scorers.push((scorer, weight));
    }

    /// Swap in a freshly loaded scorer with the same name, keeping its weight.
    /// Returns the previous scorer, or hands the new one back if no name matched.
    pub fn replace(
        &mut self,
        scorer: Box<dyn Scorer>,
    ) -> Result<Box<dyn Scorer>, Box<dyn Scorer>> {
        match self
            .scorers
            .iter_mut()
            .find(|(existing, _)| existing.name() == scorer.name())
        {
            Some(slot) => {
                info!(scorer = scorer.name(), "reloaded scorer");
                Ok(std::mem::replace(&mut slot.0, scorer))
            }
            None => Err(scorer),
        }
    }

    pub fn set_fallback(&mut self, scorer: Box<dyn Scorer>) {
        self.fallback = Some(scorer);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Scorer> {
        self.scorers
            .iter()
            .map(|(s, _)| s.as_ref())
            .chain(self.fallback.as_deref())
            .find(|s| s.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.scorers.iter().map(|(s, _)| s.name()).collect()
    }

    pub fn recommend(&self, user_id: &str, top_k: i64) -> BlendedRanking {
        let sources: Vec<(ScoreMap, f64)> = self
            .scorers
            .iter()
            .map(|(scorer, weight)| (scorer.score(user_id), *weight))
            .collect();
        let ranking = blend(&sources, top_k);
        if !ranking.is_empty() {
            return ranking;
        }

        match &self.fallback {
            Some(fallback) => {
                debug!(user_id, fallback = fallback.name(), "blend empty, using fallback");
                blend(&[(fallback.score(user_id), 1.0)], top_k)
            }
            None => ranking,
        }
    }

    /// Similar items from the named scorer
    pub fn similar(&self, scorer: &str, item_id: &str, k: usize) -> Vec<String> {
        self.get(scorer)
            .map(|s| s.similar(item_id, k))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }
}

impl Default for ScorerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticScorer {
        name: String,
        users: Vec<&'static str>,
        scores: Vec<(&'static str, f64)>,
    }

    impl StaticScorer {
        fn boxed(
            name: &str,
            users: Vec<&'static str>,
            scores: Vec<(&'static str, f64)>,
        ) -> Box<dyn Scorer> {
            Box::new(Self {
                name: name.to_string(),
                users,
                scores,
            })
        }
    }

    impl Scorer for StaticScorer {
        fn name(&self) -> &str {
            &self.name
        }

        fn score(&self, user_id: &str) -> ScoreMap {
            if !self.users.is_empty() && !self.users.iter().any(|u| *u == user_id) {
                return ScoreMap::new();
            }
            self.scores
                .iter()
                .map(|(item, s)| (item.to_string(), *s))
                .collect()
        }

        fn similar(&self, _item_id: &str, k: usize) -> Vec<String> {
            self.scores.iter().take(k).map(|(i, _)| i.to_string()).collect()
        }
    }

    fn ids(ranking: &BlendedRanking) -> Vec<&str> {
        ranking.iter().map(|r| r.item_id.as_str()).collect()
    }

    #[test]
    fn test_recommend_blends_registered_scorers() {
        let mut registry = ScorerRegistry::new();
        registry.register(
            StaticScorer::boxed("collaborative", vec!["u1"], vec![("a", 1.0), ("b", 0.0)]),
            0.6,
        );
        registry.register(
            StaticScorer::boxed("trending", vec![], vec![("b", 3.0), ("c", 1.0)]),
            0.1,
        );
        assert_eq!(registry.len(), 2);

        let ranking = registry.recommend("u1", 10);
        assert_eq!(ids(&ranking), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fallback_for_unknown_user() {
        let mut registry = ScorerRegistry::new();
        registry.register(
            StaticScorer::boxed("collaborative", vec!["u1"], vec![("a", 1.0)]),
            1.0,
        );
        assert!(registry.recommend("stranger", 5).is_empty());

        registry.set_fallback(StaticScorer::boxed(
            "popularity",
            vec![],
            vec![("p", 9.0), ("q", 1.0)],
        ));
        assert_eq!(ids(&registry.recommend("stranger", 5)), vec!["p", "q"]);
        assert_eq!(ids(&registry.recommend("u1", 5)), vec!["a"]);
    }

    #[test]
    fn test_replace_keeps_weight() {
        let mut registry = ScorerRegistry::new();
        registry.register(StaticScorer::boxed("content", vec![], vec![("old", 1.0)]), 0.3);

        let previous = registry
            .replace(StaticScorer::boxed("content", vec![], vec![("new", 1.0)]))
            .ok()
            .unwrap();
        assert_eq!(previous.name(), "content");

        let ranking = registry.recommend("u1", 5);
        assert_eq!(ids(&ranking), vec!["new"]);
        assert!((ranking[0].score - 0.3).abs() < 1e-12);

        let rejected = registry.replace(StaticScorer::boxed("missing", vec![], vec![]));
        assert!(rejected.is_err());
        assert_eq!(registry.names(), vec!["content"]);
    }

    #[test]
    fn test_similar_by_scorer_name() {
        let mut registry = ScorerRegistry::new();
        registry.register(
            StaticScorer::boxed("content", vec![], vec![("x", 1.0), ("y", 0.5)]),
            0.3,
        );
        assert_eq!(registry.similar("content", "a", 1), vec!["x".to_string()]);
        assert!(registry.similar("nope", "a", 1).is_empty());
    }
}
