pub mod evaluate;
pub mod features;
pub mod interactions;
pub mod popularity;
pub mod recommend;
pub mod sequences;
pub mod sessionize;
pub mod version;

use anyhow::{ensure, Context, Result};
use recoflow_core::{Config, InteractionSet, ScoreBlender, Session};
use recoflow_learn::{
    ContentScorer, CooccurrenceScorer, PopularityScorer, Product, Scorer, ScorerRegistry,
    TrainableScorer, TrendingScorer,
};
use recoflow_store::{read_jsonl, write_jsonl};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Config file if given, else defaults with environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Config::from_json(&json)?
        }
        None => Config::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

pub fn read_input<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    ensure!(path.exists(), "input file not found: {}", path.display());
    Ok(read_jsonl(path)?)
}

pub fn read_sessions(path: &Path) -> Result<Vec<Session>> {
    let sessions: Vec<Session> = read_input(path)?;
    info!(sessions = sessions.len(), path = %path.display(), "loaded sessions");
    Ok(sessions)
}

pub fn read_products(path: Option<&Path>) -> Result<Vec<Product>> {
    match path {
        Some(path) => read_input(path),
        None => Ok(Vec::new()),
    }
}

/// Write records as JSONL to `out`, or one JSON document per line on stdout
pub fn emit<T: Serialize>(records: &[T], out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            write_jsonl(path, records)?;
            info!(records = records.len(), path = %path.display(), "wrote output");
        }
        None => {
            for record in records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }
    Ok(())
}

/// Fit every scorer with a configured blend weight; popularity is the fallback
pub fn build_registry(
    config: &Config,
    interactions: &InteractionSet,
    products: &[Product],
) -> Result<ScorerRegistry> {
    let blender = ScoreBlender::from_config(config);
    let mut scorers = vec![
        fitted(CooccurrenceScorer::new(), interactions),
        fitted(TrendingScorer::from_config(config)?, interactions),
    ];
    if !products.is_empty() {
        scorers.push(fitted(ContentScorer::new(products), interactions));
    }

    let mut registry = ScorerRegistry::new();
    for scorer in scorers {
        match blender.weight(scorer.name()) {
            Some(weight) => registry.register(scorer, weight),
            None => warn!(scorer = scorer.name(), "no blend weight configured, skipping"),
        }
    }
    registry.set_fallback(fitted(PopularityScorer::new(), interactions));
    Ok(registry)
}

fn fitted<S: TrainableScorer + 'static>(
    mut scorer: S,
    interactions: &InteractionSet,
) -> Box<dyn Scorer> {
    scorer.fit(interactions);
    Box::new(scorer)
}
