//! Frequency-dampening transforms over the item-user matrix

use recoflow_core::{InteractionMatrix, Reweight};

/// Okapi BM25 weighting of an item-major matrix.
///
/// Rows (items) are length-normalised; columns (users) carry the IDF term,
/// so heavy users count less per interaction.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Weight {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Weight {
    fn default() -> Self {
        Self { k1: 100.0, b: 0.8 }
    }
}

impl Reweight for Bm25Weight {
    fn name(&self) -> &str {
        "bm25"
    }

    fn reweight(&self, matrix: &InteractionMatrix) -> InteractionMatrix {
        let (num_items, num_users) = matrix.shape();
        let mut out = InteractionMatrix::new(num_items, num_users);
        if num_items == 0 {
            return out;
        }

        let mut user_df = vec![0usize; num_users];
        for (_, user, _) in matrix.iter() {
            user_df[user] += 1;
        }
        let n = num_items as f64;
        let idf: Vec<f64> = user_df
            .iter()
            .map(|&df| n.ln() - (df as f64).ln_1p())
            .collect();

        let row_sums: Vec<f64> = (0..num_items)
            .map(|item| matrix.row(item).map(|r| r.values().sum()).unwrap_or(0.0))
            .collect();
        let avg_len = row_sums.iter().sum::<f64>() / n;

        for (item, user, weight) in matrix.iter() {
            let length_norm = if avg_len > 0.0 {
                (1.0 - self.b) + self.b * row_sums[item] / avg_len
            } else {
                1.0
            };
            let value = weight * (self.k1 + 1.0) / (self.k1 * length_norm + weight) * idf[user];
            out.set(item, user, value);
        }
        out
    }
}

/// `ln(1 + w)` on every stored weight
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDampen;

impl Reweight for LogDampen {
    fn name(&self) -> &str {
        "log"
    }

    fn reweight(&self, matrix: &InteractionMatrix) -> InteractionMatrix {
        let (num_items, num_users) = matrix.shape();
        let mut out = InteractionMatrix::new(num_items, num_users);
        for (item, user, weight) in matrix.iter() {
            out.set(item, user, weight.ln_1p());
        }
        out
    }
}
