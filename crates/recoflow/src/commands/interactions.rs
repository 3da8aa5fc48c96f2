use super::{emit, read_sessions};
use recoflow_core::{Config, InteractionBuilder, InteractionSet, Vocabulary};
use recoflow_learn::Bm25Weight;
use recoflow_store::{load_vocabulary, save_vocabulary};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One stored entry of a (possibly reweighted) interaction matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub user_id: String,
    pub item_id: String,
    pub weight: f64,
}

fn bm25_cells(set: &InteractionSet) -> Vec<MatrixCell> {
    let weighted = set.reweighted(&Bm25Weight::default());
    weighted
        .iter()
        .filter_map(|(item, user, weight)| {
            Some(MatrixCell {
                user_id: set.vocabulary.user_id(user)?.to_string(),
                item_id: set.vocabulary.item_id(item)?.to_string(),
                weight,
            })
        })
        .collect()
}

pub fn run(
    config: &Config,
    sessions_path: &Path,
    out: Option<&Path>,
    vocab_path: Option<&Path>,
    bm25: bool,
) -> anyhow::Result<()> {
    let sessions = read_sessions(sessions_path)?;

    let vocabulary = match vocab_path {
        Some(path) if path.exists() => load_vocabulary(path)?,
        _ => Vocabulary::new(),
    };
    let set = InteractionBuilder::new(config.event_weights.clone())
        .build_with_vocabulary(&sessions, vocabulary);

    if let Some(path) = vocab_path {
        save_vocabulary(path, &set.vocabulary)?;
    }

    if bm25 {
        emit(&bm25_cells(&set), out)
    } else {
        emit(&set.records, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use recoflow_core::{sessionize, Event, InteractionRecord};

    fn write_sessions(path: &Path, events: Vec<Event>) {
        let sessions = sessionize(events, 1800).unwrap();
        recoflow_store::write_jsonl(path, &sessions).unwrap();
    }

    #[test]
    fn test_records_and_vocabulary_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let sessions_path = dir.path().join("sessions.jsonl");
        let out = dir.path().join("interactions.jsonl");
        let vocab = dir.path().join("vocabulary.json");
        let at = |s| Utc.timestamp_opt(s, 0).unwrap();

        write_sessions(
            &sessions_path,
            vec![
                Event::with_item("u1", "view", at(0), "a"),
                Event::with_item("u1", "purchase", at(5), "a"),
            ],
        );
        run(&Config::default(), &sessions_path, Some(&out), Some(&vocab), false).unwrap();

        let records: Vec<InteractionRecord> = recoflow_store::read_jsonl(&out).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_positive));
        let first = load_vocabulary(&vocab).unwrap();
        assert_eq!(first.items(), ["a".to_string()]);

        // A second batch keeps existing indices and appends new ids
        write_sessions(&sessions_path, vec![Event::with_item("u2", "view", at(0), "b")]);
        run(&Config::default(), &sessions_path, Some(&out), Some(&vocab), false).unwrap();
        let second = load_vocabulary(&vocab).unwrap();
        assert_eq!(second.item_index("a"), Some(0));
        assert_eq!(second.item_index("b"), Some(1));
        assert!(second.version() > first.version());
    }

    #[test]
    fn test_bm25_cells_cover_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let sessions_path = dir.path().join("sessions.jsonl");
        let out = dir.path().join("cells.jsonl");
        let at = |s| Utc.timestamp_opt(s, 0).unwrap();

        write_sessions(
            &sessions_path,
            vec![
                Event::with_item("u1", "view", at(0), "a"),
                Event::with_item("u1", "view", at(1), "a"),
                Event::with_item("u2", "view", at(0), "b"),
            ],
        );
        run(&Config::default(), &sessions_path, Some(&out), None, true).unwrap();

        let cells: Vec<MatrixCell> = recoflow_store::read_jsonl(&out).unwrap();
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().any(|c| c.user_id == "u1" && c.item_id == "a"));
    }
}
