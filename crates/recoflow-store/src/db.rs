use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use recoflow_core::Session;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

/// SQLite-backed session store keyed by session id
pub struct SessionDb {
    conn: Connection,
}

/// Columns as stored, before JSON and timestamp decoding
struct SessionRow {
    session_id: String,
    user_id: String,
    start: String,
    end: String,
    duration_seconds: i64,
    events: String,
    viewed_items: String,
    cart_items: String,
    purchased_items: String,
}

impl SessionDb {
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                events TEXT NOT NULL,
                viewed_items TEXT NOT NULL,
                cart_items TEXT NOT NULL,
                purchased_items TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, started_at);
            ",
        )?;
        Ok(())
    }

    /// Insert or replace sessions in one transaction
    pub fn save_sessions(&mut self, sessions: &[Session]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO sessions VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(session_id) DO UPDATE SET
                    user_id = excluded.user_id,
                    started_at = excluded.started_at,
                    ended_at = excluded.ended_at,
                    duration_seconds = excluded.duration_seconds,
                    events = excluded.events,
                    viewed_items = excluded.viewed_items,
                    cart_items = excluded.cart_items,
                    purchased_items = excluded.purchased_items",
            )?;
            for session in sessions {
                stmt.execute(params![
                    session.session_id,
                    session.user_id,
                    format_ts(&session.start),
                    format_ts(&session.end),
                    session.duration_seconds,
                    serde_json::to_string(&session.events)?,
                    serde_json::to_string(&session.viewed_items)?,
                    serde_json::to_string(&session.cart_items)?,
                    serde_json::to_string(&session.purchased_items)?,
                ])?;
            }
        }
        tx.commit()?;
        debug!(saved = sessions.len(), "saved sessions");
        Ok(sessions.len())
    }

    /// All sessions, users ascending and chronological within a user
    pub fn load_sessions(&self) -> Result<Vec<Session>> {
        self.query_sessions("SELECT * FROM sessions ORDER BY user_id, started_at", params![])
    }

    pub fn load_user_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        self.query_sessions(
            "SELECT * FROM sessions WHERE user_id = ?1 ORDER BY started_at",
            params![user_id],
        )
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn query_sessions(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| {
            Ok(SessionRow {
                session_id: row.get(0)?,
                user_id: row.get(1)?,
                start: row.get(2)?,
                end: row.get(3)?,
                duration_seconds: row.get(4)?,
                events: row.get(5)?,
                viewed_items: row.get(6)?,
                cart_items: row.get(7)?,
                purchased_items: row.get(8)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(Self::row_to_session(row?)?);
        }
        Ok(sessions)
    }

    fn row_to_session(row: SessionRow) -> Result<Session> {
        Ok(Session {
            session_id: row.session_id,
            user_id: row.user_id,
            start: parse_ts(&row.start)?,
            end: parse_ts(&row.end)?,
            events: serde_json::from_str(&row.events)?,
            viewed_items: serde_json::from_str(&row.viewed_items)?,
            cart_items: serde_json::from_str(&row.cart_items)?,
            purchased_items: serde_json::from_str(&row.purchased_items)?,
            duration_seconds: row.duration_seconds,
        })
    }
}

// Fixed-width so that text ordering matches time ordering
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
