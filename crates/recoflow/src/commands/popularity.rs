use super::{read_products, read_sessions};
use recoflow_core::{build_interactions, Config, RankedItem, Session};
use recoflow_learn::{PopularityScorer, Product, TrainableScorer};
use std::collections::BTreeMap;
use std::path::Path;

fn fitted(config: &Config, sessions: &[Session]) -> PopularityScorer {
    let mut scorer = PopularityScorer::new();
    scorer.fit(&build_interactions(sessions, &config.event_weights));
    scorer
}

fn ranked(items: Vec<(String, f64)>) -> Vec<RankedItem> {
    items
        .into_iter()
        .map(|(item_id, score)| RankedItem { item_id, score })
        .collect()
}

fn top_items(config: &Config, sessions: &[Session], top_k: i64) -> Vec<RankedItem> {
    let k = usize::try_from(top_k).unwrap_or(0);
    ranked(fitted(config, sessions).top_k(k))
}

fn top_items_by_category(
    config: &Config,
    sessions: &[Session],
    products: &[Product],
    top_k: i64,
) -> anyhow::Result<BTreeMap<String, Vec<RankedItem>>> {
    let k = usize::try_from(top_k).unwrap_or(0);
    let grouped = fitted(config, sessions).by_category(products, k)?;
    Ok(grouped
        .into_iter()
        .map(|(category, items)| (category, ranked(items)))
        .collect())
}

pub fn run(
    config: &Config,
    sessions_path: &Path,
    products_path: Option<&Path>,
    by_category: bool,
    top_k: Option<i64>,
) -> anyhow::Result<()> {
    let sessions = read_sessions(sessions_path)?;
    let top_k = top_k.unwrap_or(config.top_k);
    let json = if by_category {
        let products = read_products(products_path)?;
        let grouped = top_items_by_category(config, &sessions, &products, top_k)?;
        serde_json::to_string_pretty(&grouped)?
    } else {
        serde_json::to_string_pretty(&top_items(config, &sessions, top_k))?
    };
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use recoflow_core::{sessionize, Event, RecoError};

    fn sessions() -> Vec<Session> {
        let at = |s| Utc.timestamp_opt(s, 0).unwrap();
        sessionize(
            vec![
                Event::with_item("u1", "view", at(0), "a"),
                Event::with_item("u2", "purchase", at(0), "b"),
                Event::with_item("u3", "view", at(0), "c"),
            ],
            1800,
        )
        .unwrap()
    }

    fn product(id: &str, category: &str) -> Product {
        Product {
            product_id: id.to_string(),
            title: None,
            description: None,
            category: Some(category.to_string()),
        }
    }

    #[test]
    fn test_top_items() {
        let items = top_items(&Config::default(), &sessions(), 2);
        let ids: Vec<_> = items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(top_items(&Config::default(), &sessions(), -1).is_empty());
    }

    #[test]
    fn test_top_items_by_category() {
        let products = vec![product("a", "x"), product("b", "y"), product("c", "x")];
        let grouped =
            top_items_by_category(&Config::default(), &sessions(), &products, 1).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["x"].len(), 1);
        assert_eq!(grouped["x"][0].item_id, "a");
        assert_eq!(grouped["y"][0].item_id, "b");
    }

    #[test]
    fn test_by_category_without_catalog() {
        let err = top_items_by_category(&Config::default(), &sessions(), &[], 5).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RecoError>(),
            Some(RecoError::MissingColumn(_))
        ));
    }
}
