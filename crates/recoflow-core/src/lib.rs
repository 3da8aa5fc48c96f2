//! Session reconstruction, interaction building and score blending for recommendations

mod blend;
mod config;
mod error;
mod evaluate;
mod event;
mod features;
mod interactions;
mod sequences;
mod sessionize;

pub use blend::{blend, normalize_scores, BlendedRanking, RankedItem, ScoreBlender, ScoreMap};
pub use config::{Config, EventWeights};
pub use error::{RecoError, Result};
pub use evaluate::{
    evaluate, evaluate_with, precision_at_k, recall_at_k, EvaluateOptions, EvaluationReport,
    Recommender,
};
pub use event::{Event, EventType, RawEvent};
pub use features::{extract_features, Column, FeatureExtractor, FeatureOptions, SessionFeatureRow};
pub use interactions::{
    build_interactions, InteractionBuilder, InteractionMatrix, InteractionRecord, InteractionSet,
    Reweight, Vocabulary, VOCABULARY_FORMAT,
};
pub use sequences::{build_sequences, SequenceExample};
pub use sessionize::{sessionize, Session, Sessionizer};
