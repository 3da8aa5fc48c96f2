//! Weighted interaction records and the sparse item-user matrix

use crate::config::EventWeights;
use crate::event::EventType;
use crate::sessionize::Session;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Current on-disk vocabulary layout
pub const VOCABULARY_FORMAT: u32 = 1;

/// One (event, item) observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: String,
    pub session_id: String,
    pub item_id: String,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub weight: f64,
    /// Item was purchased in the same session
    pub is_positive: bool,
}

/// Bidirectional user/item id <-> index maps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VocabularyFile", into = "VocabularyFile")]
pub struct Vocabulary {
    version: u64,
    users: Vec<String>,
    items: Vec<String>,
    user_index: HashMap<String, usize>,
    item_index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    format: u32,
    version: u64,
    users: Vec<String>,
    items: Vec<String>,
}

impl TryFrom<VocabularyFile> for Vocabulary {
    type Error = String;

    fn try_from(file: VocabularyFile) -> Result<Self, Self::Error> {
        if file.format != VOCABULARY_FORMAT {
            return Err(format!(
                "unsupported vocabulary format {} (expected {})",
                file.format, VOCABULARY_FORMAT
            ));
        }
        let mut vocab = Vocabulary {
            version: file.version,
            ..Vocabulary::default()
        };
        for user in file.users {
            if vocab.user_index.contains_key(&user) {
                return Err(format!("duplicate user id '{}' in vocabulary", user));
            }
            vocab.intern_user(&user);
        }
        for item in file.items {
            if vocab.item_index.contains_key(&item) {
                return Err(format!("duplicate item id '{}' in vocabulary", item));
            }
            vocab.intern_item(&item);
        }
        Ok(vocab)
    }
}

impl From<Vocabulary> for VocabularyFile {
    fn from(vocab: Vocabulary) -> Self {
        VocabularyFile {
            format: VOCABULARY_FORMAT,
            version: vocab.version,
            users: vocab.users,
            items: vocab.items,
        }
    }
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped whenever a build appends ids
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn user_index(&self, user_id: &str) -> Option<usize> {
        self.user_index.get(user_id).copied()
    }

    pub fn item_index(&self, item_id: &str) -> Option<usize> {
        self.item_index.get(item_id).copied()
    }

    pub fn user_id(&self, index: usize) -> Option<&str> {
        self.users.get(index).map(|s| s.as_str())
    }

    pub fn item_id(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|s| s.as_str())
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn intern_user(&mut self, user_id: &str) -> usize {
        intern(&mut self.users, &mut self.user_index, user_id)
    }

    pub fn intern_item(&mut self, item_id: &str) -> usize {
        intern(&mut self.items, &mut self.item_index, item_id)
    }
}

fn intern(ids: &mut Vec<String>, index: &mut HashMap<String, usize>, id: &str) -> usize {
    if let Some(&idx) = index.get(id) {
        return idx;
    }
    let idx = ids.len();
    ids.push(id.to_string());
    index.insert(id.to_string(), idx);
    idx
}

/// Sparse matrix with one row per item and one column per user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionMatrix {
    num_users: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl InteractionMatrix {
    pub fn new(num_items: usize, num_users: usize) -> Self {
        Self {
            num_users,
            rows: vec![BTreeMap::new(); num_items],
        }
    }

    /// (items, users)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.num_users)
    }

    /// Stored entries, including explicit zeros
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    pub fn get(&self, item_index: usize, user_index: usize) -> f64 {
        self.rows
            .get(item_index)
            .and_then(|row| row.get(&user_index))
            .copied()
            .unwrap_or(0.0)
    }

    /// Accumulate weight into a cell, growing the matrix as needed
    pub fn add(&mut self, item_index: usize, user_index: usize, weight: f64) {
        if item_index >= self.rows.len() {
            self.rows.resize(item_index + 1, BTreeMap::new());
        }
        self.num_users = self.num_users.max(user_index + 1);
        *self.rows[item_index].entry(user_index).or_insert(0.0) += weight;
    }

    pub fn set(&mut self, item_index: usize, user_index: usize, weight: f64) {
        if item_index >= self.rows.len() {
            self.rows.resize(item_index + 1, BTreeMap::new());
        }
        self.num_users = self.num_users.max(user_index + 1);
        self.rows[item_index].insert(user_index, weight);
    }

    pub fn row(&self, item_index: usize) -> Option<&BTreeMap<usize, f64>> {
        self.rows.get(item_index)
    }

    /// (item_index, user_index, weight) in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows.iter().enumerate().flat_map(|(item, row)| {
            row.iter()
                .map(move |(&user, &weight)| (item, user, weight))
        })
    }

    /// User-major view: user_index -> (item_index -> weight)
    pub fn user_rows(&self) -> Vec<BTreeMap<usize, f64>> {
        let mut users = vec![BTreeMap::new(); self.num_users];
        for (item, user, weight) in self.iter() {
            users[user].insert(item, weight);
        }
        users
    }
}

/// Output of one interaction build
#[derive(Debug, Clone, Default)]
pub struct InteractionSet {
    pub records: Vec<InteractionRecord>,
    pub matrix: InteractionMatrix,
    pub vocabulary: Vocabulary,
}

impl InteractionSet {
    /// Accumulated weight for a (user, item) pair
    pub fn weight(&self, user_id: &str, item_id: &str) -> f64 {
        match (
            self.vocabulary.user_index(user_id),
            self.vocabulary.item_index(item_id),
        ) {
            (Some(user), Some(item)) => self.matrix.get(item, user),
            _ => 0.0,
        }
    }

    /// Items a user interacted with and their accumulated weights
    pub fn user_items(&self, user_id: &str) -> Vec<(String, f64)> {
        let Some(user) = self.vocabulary.user_index(user_id) else {
            return Vec::new();
        };
        self.matrix
            .iter()
            .filter(|&(_, u, _)| u == user)
            .filter_map(|(item, _, weight)| {
                self.vocabulary
                    .item_id(item)
                    .map(|id| (id.to_string(), weight))
            })
            .collect()
    }

    pub fn reweighted(&self, reweight: &dyn Reweight) -> InteractionMatrix {
        reweight.reweight(&self.matrix)
    }
}

/// Post-processing transform over an assembled matrix
pub trait Reweight {
    fn name(&self) -> &str;

    fn reweight(&self, matrix: &InteractionMatrix) -> InteractionMatrix;
}

/// Flattens sessions into weighted interactions
#[derive(Debug, Clone, Default)]
pub struct InteractionBuilder {
    weights: EventWeights,
}

impl InteractionBuilder {
    pub fn new(weights: EventWeights) -> Self {
        Self { weights }
    }

    /// One record per event carrying an item reference
    pub fn records(&self, sessions: &[Session]) -> Vec<InteractionRecord> {
        let mut records = Vec::new();
        let mut unmapped = 0;

        for session in sessions {
            for event in &session.events {
                let Some(item_id) = event.item_id() else {
                    continue;
                };
                let weight = match self.weights.get_weight(&event.event_type) {
                    Some(w) => w,
                    None => {
                        unmapped += 1;
                        self.weights.default
                    }
                };
                records.push(InteractionRecord {
                    user_id: session.user_id.clone(),
                    session_id: session.session_id.clone(),
                    is_positive: session.purchased_items.contains(&item_id),
                    item_id,
                    event_type: event.event_type.clone(),
                    timestamp: event.timestamp,
                    weight,
                });
            }
        }

        if unmapped > 0 {
            warn!(unmapped, "interactions with unmapped event types recorded at default weight");
        }
        records
    }

    /// Records, matrix and a fresh vocabulary
    pub fn build(&self, sessions: &[Session]) -> InteractionSet {
        self.build_with_vocabulary(sessions, Vocabulary::new())
    }

    /// Reuse a persisted vocabulary; unseen ids are appended
    pub fn build_with_vocabulary(
        &self,
        sessions: &[Session],
        mut vocabulary: Vocabulary,
    ) -> InteractionSet {
        let records = self.records(sessions);
        let (known_users, known_items) = (vocabulary.num_users(), vocabulary.num_items());

        let cells: Vec<(usize, usize, f64)> = records
            .iter()
            .map(|record| {
                let user = vocabulary.intern_user(&record.user_id);
                let item = vocabulary.intern_item(&record.item_id);
                (item, user, record.weight)
            })
            .collect();

        let mut matrix = InteractionMatrix::new(vocabulary.num_items(), vocabulary.num_users());
        for (item, user, weight) in cells {
            matrix.add(item, user, weight);
        }

        if vocabulary.num_users() > known_users || vocabulary.num_items() > known_items {
            vocabulary.version += 1;
        }

        debug!(
            records = records.len(),
            users = vocabulary.num_users(),
            items = vocabulary.num_items(),
            nnz = matrix.nnz(),
            "built interaction matrix"
        );

        InteractionSet {
            records,
            matrix,
            vocabulary,
        }
    }
}

/// Interaction records, sparse matrix and id mappings for a batch of sessions
pub fn build_interactions(sessions: &[Session], weights: &EventWeights) -> InteractionSet {
    InteractionBuilder::new(weights.clone()).build(sessions)
}
