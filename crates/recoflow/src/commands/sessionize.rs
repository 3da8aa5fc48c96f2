use super::{emit, read_input};
use recoflow_core::{Config, Event, RawEvent, Session, Sessionizer};
use recoflow_store::SessionDb;
use std::path::Path;
use tracing::info;

/// Validate raw events; a missing or offset-less timestamp aborts the batch
fn parse_events(raw: Vec<RawEvent>) -> anyhow::Result<Vec<Event>> {
    let events = raw
        .into_iter()
        .map(Event::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

fn sessionize_events(
    config: &Config,
    raw: Vec<RawEvent>,
    timeout: Option<i64>,
) -> anyhow::Result<Vec<Session>> {
    let sessionizer = Sessionizer::new(timeout.unwrap_or(config.session_timeout_seconds))?;
    let events = parse_events(raw)?;
    Ok(sessionizer.sessionize(events))
}

pub fn run(
    config: &Config,
    events_path: &Path,
    timeout: Option<i64>,
    out: Option<&Path>,
    db_path: Option<&Path>,
) -> anyhow::Result<()> {
    let raw: Vec<RawEvent> = read_input(events_path)?;
    let sessions = sessionize_events(config, raw, timeout)?;
    info!(sessions = sessions.len(), "sessionized");

    if let Some(db_path) = db_path {
        let mut db = SessionDb::new(db_path)?;
        db.save_sessions(&sessions)?;
        info!(total = db.count()?, path = %db_path.display(), "session store updated");
    }

    emit(&sessions, out)
}
