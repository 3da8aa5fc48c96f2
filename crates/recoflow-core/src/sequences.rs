//! Next-item training examples from session view sequences

use crate::error::{RecoError, Result};
use crate::interactions::Vocabulary;
use crate::sessionize::Session;
use serde::{Deserialize, Serialize};

/// Padding token; item tokens are vocabulary index + 1
pub const PAD_TOKEN: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceExample {
    pub session_id: String,
    /// Left-padded to the configured length
    pub input: Vec<usize>,
    pub target: usize,
}

/// One example per session with at least two viewed items known to `vocab`.
/// The input is every view but the last, truncated to the most recent
/// `max_len`; the target is the last view.
pub fn build_sequences(
    sessions: &[Session],
    vocab: &Vocabulary,
    max_len: usize,
) -> Result<Vec<SequenceExample>> {
    if max_len == 0 {
        return Err(RecoError::Configuration(
            "sequence length must be at least 1".to_string(),
        ));
    }

    let examples = sessions
        .iter()
        .filter_map(|session| {
            let tokens: Vec<usize> = session
                .viewed_items
                .iter()
                .filter_map(|item| vocab.item_index(item).map(|idx| idx + 1))
                .collect();
            let (&target, history) = tokens.split_last()?;
            if history.is_empty() {
                return None;
            }

            let recent = &history[history.len().saturating_sub(max_len)..];
            let mut input = vec![PAD_TOKEN; max_len - recent.len()];
            input.extend_from_slice(recent);

            Some(SequenceExample {
                session_id: session.session_id.clone(),
                input,
                target,
            })
        })
        .collect();

    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventWeights;
    use crate::event::Event;
    use crate::interactions::build_interactions;
    use crate::sessionize::sessionize;
    use chrono::{TimeZone, Utc};

    fn sessions_with_views(items: &[&str]) -> Vec<Session> {
        let events = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Event::with_item("u1", "view", Utc.timestamp_opt(i as i64, 0).unwrap(), *item)
            })
            .collect();
        sessionize(events, 1800).unwrap()
    }

    #[test]
    fn test_left_padding() {
        let sessions = sessions_with_views(&["a", "b", "c"]);
        let vocab = build_interactions(&sessions, &EventWeights::default()).vocabulary;
        let examples = build_sequences(&sessions, &vocab, 4).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].input, vec![0, 0, 1, 2]);
        assert_eq!(examples[0].target, 3);
    }

    #[test]
    fn test_truncates_to_recent_history() {
        let sessions = sessions_with_views(&["a", "b", "c", "d"]);
        let vocab = build_interactions(&sessions, &EventWeights::default()).vocabulary;
        let examples = build_sequences(&sessions, &vocab, 2).unwrap();
        assert_eq!(examples[0].input, vec![2, 3]);
        assert_eq!(examples[0].target, 4);
    }

    #[test]
    fn test_single_view_skipped() {
        let sessions = sessions_with_views(&["a"]);
        let vocab = build_interactions(&sessions, &EventWeights::default()).vocabulary;
        assert!(build_sequences(&sessions, &vocab, 5).unwrap().is_empty());
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            build_sequences(&[], &Vocabulary::new(), 0),
            Err(RecoError::Configuration(_))
        ));
    }
}
