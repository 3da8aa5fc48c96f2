//! Scorers that turn interaction history into per-user score maps

mod content;
mod cooccurrence;
mod popularity;
mod registry;
mod reweight;
mod scorer;
mod trending;

pub use content::{tokenize, ContentScorer, Product, CONTENT};
pub use cooccurrence::{CooccurrenceScorer, COLLABORATIVE};
pub use popularity::{PopularityScorer, POPULARITY};
pub use registry::ScorerRegistry;
pub use reweight::{Bm25Weight, LogDampen};
pub use scorer::{rank_scores, Scorer, TrainableScorer};
pub use trending::{TrendingScorer, TRENDING};
