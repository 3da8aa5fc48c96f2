//! Offline precision/recall against purchased items

use crate::sessionize::Session;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

/// Produces an ordered item list for a user within a session
pub trait Recommender {
    fn recommend(&self, user_id: &str, session_id: &str, k: usize) -> Vec<String>;
}

impl<F> Recommender for F
where
    F: Fn(&str, &str, usize) -> Vec<String>,
{
    fn recommend(&self, user_id: &str, session_id: &str, k: usize) -> Vec<String> {
        self(user_id, session_id, k)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluateOptions {
    /// Consider at most this many sessions, in input order
    pub sample_sessions: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    /// Sessions with at least one purchased item
    pub evaluated_session_count: usize,
}

fn hits(predictions: &[String], truth: &BTreeSet<String>, k: usize) -> usize {
    predictions
        .iter()
        .take(k)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|item| truth.contains(*item))
        .count()
}

pub fn precision_at_k(predictions: &[String], truth: &BTreeSet<String>, k: usize) -> f64 {
    if k == 0 || predictions.is_empty() {
        return 0.0;
    }
    hits(predictions, truth, k) as f64 / k as f64
}

pub fn recall_at_k(predictions: &[String], truth: &BTreeSet<String>, k: usize) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    hits(predictions, truth, k) as f64 / truth.len() as f64
}

pub fn evaluate(sessions: &[Session], recommender: &dyn Recommender, k: usize) -> EvaluationReport {
    evaluate_with(sessions, recommender, k, &EvaluateOptions::default())
}

/// Mean precision and recall over sessions that have purchases
pub fn evaluate_with(
    sessions: &[Session],
    recommender: &dyn Recommender,
    k: usize,
    options: &EvaluateOptions,
) -> EvaluationReport {
    let limit = options.sample_sessions.unwrap_or(sessions.len());

    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut evaluated = 0;

    for session in sessions.iter().take(limit) {
        let truth = &session.purchased_items;
        if truth.is_empty() {
            continue;
        }
        let predictions = recommender.recommend(&session.user_id, &session.session_id, k);
        precision_sum += precision_at_k(&predictions, truth, k);
        recall_sum += recall_at_k(&predictions, truth, k);
        evaluated += 1;
    }

    let (precision, recall) = if evaluated == 0 {
        (0.0, 0.0)
    } else {
        (
            precision_sum / evaluated as f64,
            recall_sum / evaluated as f64,
        )
    };

    info!(
        k,
        evaluated,
        precision = precision,
        recall = recall,
        "evaluation complete"
    );

    EvaluationReport {
        k,
        precision_at_k: precision,
        recall_at_k: recall,
        evaluated_session_count: evaluated,
    }
}
