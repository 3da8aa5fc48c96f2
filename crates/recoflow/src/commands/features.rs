use super::{emit, read_sessions};
use recoflow_core::extract_features;
use std::path::Path;

pub fn run(sessions_path: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let sessions = read_sessions(sessions_path)?;
    let rows = extract_features(&sessions)?;
    emit(&rows, out)
}
