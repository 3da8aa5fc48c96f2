use super::{build_registry, read_products, read_sessions};
use recoflow_core::{Config, InteractionBuilder};
use std::path::Path;

pub fn run(
    config: &Config,
    sessions_path: &Path,
    products_path: Option<&Path>,
    user_id: &str,
    top_k: Option<i64>,
) -> anyhow::Result<()> {
    let sessions = read_sessions(sessions_path)?;
    let products = read_products(products_path)?;
    let interactions = InteractionBuilder::new(config.event_weights.clone()).build(&sessions);

    let registry = build_registry(config, &interactions, &products)?;
    let ranking = registry.recommend(user_id, top_k.unwrap_or(config.top_k));
    tracing::info!(user_id, items = ranking.len(), "recommended");

    println!("{}", serde_json::to_string_pretty(&ranking)?);
    Ok(())
}
