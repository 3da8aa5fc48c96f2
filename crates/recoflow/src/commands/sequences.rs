use super::{emit, read_sessions};
use recoflow_core::{
    build_sequences, Config, InteractionBuilder, SequenceExample, Session, Vocabulary,
};
use recoflow_store::load_vocabulary;
use std::path::Path;
use tracing::info;

/// Examples tokenized against `vocabulary`, extended with ids first seen in `sessions`
fn sequence_examples(
    config: &Config,
    sessions: &[Session],
    vocabulary: Vocabulary,
    max_len: Option<usize>,
) -> anyhow::Result<Vec<SequenceExample>> {
    let vocabulary = InteractionBuilder::new(config.event_weights.clone())
        .build_with_vocabulary(sessions, vocabulary)
        .vocabulary;
    let max_len = max_len.unwrap_or(config.sequence_max_len);
    let examples = build_sequences(sessions, &vocabulary, max_len)?;
    info!(examples = examples.len(), max_len, "built sequence examples");
    Ok(examples)
}

pub fn run(
    config: &Config,
    sessions_path: &Path,
    vocab_path: &Path,
    max_len: Option<usize>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let sessions = read_sessions(sessions_path)?;
    let vocabulary = if vocab_path.exists() {
        load_vocabulary(vocab_path)?
    } else {
        Vocabulary::new()
    };
    let examples = sequence_examples(config, &sessions, vocabulary, max_len)?;
    emit(&examples, out)
}
