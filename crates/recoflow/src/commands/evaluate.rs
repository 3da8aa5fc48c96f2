use super::{build_registry, read_products, read_sessions};
use anyhow::ensure;
use recoflow_core::{
    evaluate_with, Config, EvaluateOptions, EvaluationReport, InteractionBuilder, Session,
};
use recoflow_learn::Product;
use std::path::Path;
use tracing::info;

/// Split chronologically by session start; the latest `ratio` is held out
fn split_holdout(mut sessions: Vec<Session>, ratio: f64) -> (Vec<Session>, Vec<Session>) {
    sessions.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    let held = ((sessions.len() as f64) * ratio).ceil() as usize;
    let test = sessions.split_off(sessions.len() - held.min(sessions.len()));
    (sessions, test)
}

fn evaluate_holdout(
    config: &Config,
    sessions: Vec<Session>,
    products: &[Product],
    k: usize,
    sample: Option<usize>,
    holdout_ratio: f64,
) -> anyhow::Result<EvaluationReport> {
    ensure!(
        holdout_ratio > 0.0 && holdout_ratio < 1.0,
        "holdout ratio must be between 0 and 1, got {}",
        holdout_ratio
    );

    let (train, test) = split_holdout(sessions, holdout_ratio);
    info!(train = train.len(), test = test.len(), "split sessions");

    let interactions = InteractionBuilder::new(config.event_weights.clone()).build(&train);
    let registry = build_registry(config, &interactions, products)?;
    let top_k = i64::try_from(k).unwrap_or(i64::MAX);

    let recommender = |user_id: &str, _session_id: &str, _k: usize| -> Vec<String> {
        registry
            .recommend(user_id, top_k)
            .into_iter()
            .map(|r| r.item_id)
            .collect()
    };
    let options = EvaluateOptions {
        sample_sessions: sample,
    };
    Ok(evaluate_with(&test, &recommender, k, &options))
}

pub fn run(
    config: &Config,
    sessions_path: &Path,
    products_path: Option<&Path>,
    k: usize,
    sample: Option<usize>,
    holdout_ratio: f64,
) -> anyhow::Result<()> {
    let sessions = read_sessions(sessions_path)?;
    let products = read_products(products_path)?;
    let report = evaluate_holdout(config, sessions, &products, k, sample, holdout_ratio)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use recoflow_core::{sessionize, Event};

    fn history() -> Vec<Session> {
        let at = |s| Utc.timestamp_opt(s, 0).unwrap();
        let events = vec![
            Event::with_item("u1", "view", at(0), "b"),
            Event::with_item("u1", "purchase", at(10), "b"),
            Event::with_item("u2", "view", at(100), "b"),
            Event::with_item("u2", "view", at(105), "x"),
            Event::with_item("u2", "purchase", at(110), "b"),
            Event::with_item("u3", "view", at(10_000), "x"),
            Event::with_item("u3", "purchase", at(10_010), "b"),
        ];
        sessionize(events, 1800).unwrap()
    }

    #[test]
    fn test_split_holdout_is_chronological() {
        let (train, test) = split_holdout(history(), 0.3);
        assert_eq!(train.len(), 2);
        assert_eq!(test.len(), 1);
        assert_eq!(test[0].user_id, "u3");
    }

    #[test]
    fn test_evaluate_holdout_hits_trending_purchase() {
        let report = evaluate_holdout(&Config::default(), history(), &[], 1, None, 0.3).unwrap();
        assert_eq!(report.evaluated_session_count, 1);
        // u3 is unseen in training; b has the most recent views
        assert_eq!(report.precision_at_k, 1.0);
        assert_eq!(report.recall_at_k, 1.0);
    }

    #[test]
    fn test_invalid_holdout_ratio() {
        assert!(evaluate_holdout(&Config::default(), history(), &[], 5, None, 1.0).is_err());
        assert!(evaluate_holdout(&Config::default(), history(), &[], 5, None, 0.0).is_err());
    }
}
