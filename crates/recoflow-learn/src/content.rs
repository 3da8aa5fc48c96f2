//! TF-IDF content similarity over product text

use crate::scorer::{rank_scores, Scorer, TrainableScorer};
use recoflow_core::{InteractionSet, ScoreMap};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const CONTENT: &str = "content";

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

static STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "to", "of",
    "in", "for", "on", "with", "at", "by", "from", "as", "into", "through", "then", "here",
    "there", "when", "where", "why", "how", "all", "each", "every", "both", "few", "more", "most",
    "some", "such", "not", "only", "just", "but", "and", "or", "if", "about", "what", "which",
    "who", "this", "that", "these", "those", "it", "its", "my", "me", "we", "our", "you", "your",
    "up", "down", "no", "so", "very", "too", "than", "also",
];

/// Catalog entry used for content features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "id_string")]
    pub product_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Product {
    /// Concatenated text fields
    pub fn corpus(&self) -> String {
        [&self.title, &self.description, &self.category]
            .into_iter()
            .flatten()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number product id, got {}",
            other
        ))),
    }
}

/// Lowercased alphanumeric tokens with stop words removed
pub fn tokenize(text: &str) -> Vec<String> {
    let re = TOKEN_RE.get_or_init(|| Regex::new(r"[a-z0-9]+").unwrap());
    let stop_set: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let lower = text.to_lowercase();
    re.find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.len() >= 2 && !stop_set.contains(w))
        .map(|w| w.to_string())
        .collect()
}

/// Cosine similarity over TF-IDF vectors of product text
#[derive(Debug, Clone, Default)]
pub struct ContentScorer {
    vocab: HashMap<String, usize>,
    doc_vecs: Vec<Vec<f64>>,
    doc_ids: Vec<String>,
    doc_index: HashMap<String, usize>,
    histories: HashMap<String, Vec<usize>>,
}

impl ContentScorer {
    pub fn new(products: &[Product]) -> Self {
        let mut scorer = Self::default();
        scorer.index(products);
        scorer
    }

    fn index(&mut self, products: &[Product]) {
        let mut seen = HashSet::new();
        let documents: Vec<(String, Vec<String>)> = products
            .iter()
            .filter(|p| seen.insert(p.product_id.clone()))
            .map(|p| (p.product_id.clone(), tokenize(&p.corpus())))
            .collect();
        if documents.len() < products.len() {
            warn!(
                duplicates = products.len() - documents.len(),
                "duplicate product ids ignored"
            );
        }
        if documents.is_empty() {
            return;
        }

        let mut terms: Vec<&String> = documents
            .iter()
            .flat_map(|(_, tokens)| tokens)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        terms.sort();
        self.vocab = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        // Smoothed IDF
        let doc_count = documents.len();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for (_, tokens) in &documents {
            let unique: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }
        let idf: HashMap<&str, f64> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                (
                    term,
                    ((doc_count + 1) as f64 / (df + 1) as f64).ln() + 1.0,
                )
            })
            .collect();

        for (id, tokens) in &documents {
            let mut tf: HashMap<&str, usize> = HashMap::new();
            for token in tokens {
                *tf.entry(token.as_str()).or_insert(0) += 1;
            }

            let mut vec = vec![0.0; self.vocab.len()];
            for (term, count) in tf {
                if let Some(&idx) = self.vocab.get(term) {
                    vec[idx] = count as f64 * idf.get(term).copied().unwrap_or(1.0);
                }
            }
            self.doc_index.insert(id.clone(), self.doc_vecs.len());
            self.doc_ids.push(id.clone());
            self.doc_vecs.push(vec);
        }

        debug!(
            products = self.doc_ids.len(),
            terms = self.vocab.len(),
            "built content index"
        );
    }

    pub fn num_products(&self) -> usize {
        self.doc_ids.len()
    }

    /// Cosine of every indexed product against `query`, excluding `skip`
    fn rank_against(&self, query: &[f64], skip: &[usize], k: usize) -> Vec<(String, f64)> {
        let query_norm = norm(query);
        if query_norm == 0.0 {
            return Vec::new();
        }
        let scored = self
            .doc_vecs
            .iter()
            .enumerate()
            .filter(|(i, _)| !skip.contains(i))
            .filter_map(|(i, doc)| {
                let doc_norm = norm(doc);
                if doc_norm == 0.0 {
                    return None;
                }
                let score = dot_product(query, doc) / (query_norm * doc_norm);
                (score > 0.0).then(|| (self.doc_ids[i].clone(), score))
            });
        rank_scores(scored, k)
    }
}

impl Scorer for ContentScorer {
    fn name(&self) -> &str {
        CONTENT
    }

    /// Similarity to the centroid of the user's interacted products
    fn score(&self, user_id: &str) -> ScoreMap {
        let Some(history) = self.histories.get(user_id) else {
            return ScoreMap::new();
        };
        let mut centroid = vec![0.0; self.vocab.len()];
        for &doc in history {
            for (c, v) in centroid.iter_mut().zip(&self.doc_vecs[doc]) {
                *c += v;
            }
        }
        let n = history.len() as f64;
        centroid.iter_mut().for_each(|c| *c /= n);

        self.rank_against(&centroid, history, usize::MAX)
            .into_iter()
            .collect()
    }

    fn similar(&self, item_id: &str, k: usize) -> Vec<String> {
        let Some(&idx) = self.doc_index.get(item_id) else {
            debug!(item_id, "item not in content index");
            return Vec::new();
        };
        self.rank_against(&self.doc_vecs[idx], &[idx], k)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }
}

impl TrainableScorer for ContentScorer {
    fn fit(&mut self, interactions: &InteractionSet) {
        self.histories.clear();
        for record in &interactions.records {
            let Some(&doc) = self.doc_index.get(&record.item_id) else {
                continue;
            };
            let history = self.histories.entry(record.user_id.clone()).or_default();
            if !history.contains(&doc) {
                history.push(doc);
            }
        }
        debug!(users = self.histories.len(), "fitted content histories");
    }
}

fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
