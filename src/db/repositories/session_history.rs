use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, to_i64, to_u32, to_u64},
    models::SessionHistory,
};

fn read_history(conn: &Connection) -> Result<Option<SessionHistory>> {
    let row = conn
        .query_row(
            "SELECT session_count, total_time_ms, first_seen_at, last_started_at
             FROM session_history
             WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((session_count, total_time_ms, first_seen_at, last_started_at)) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT started_at FROM session_starts ORDER BY id DESC")?;
    let mut rows = stmt.query([])?;
    let mut recent_starts = Vec::new();
    while let Some(row) = rows.next()? {
        recent_starts.push(parse_datetime(&row.get::<_, String>(0)?, "started_at")?);
    }

    Ok(Some(SessionHistory {
        session_count: to_u32(session_count, "session_count")?,
        total_time_ms: to_u64(total_time_ms, "total_time_ms")?,
        first_seen_at: parse_datetime(&first_seen_at, "first_seen_at")?,
        last_started_at: parse_optional_datetime(last_started_at, "last_started_at")?,
        recent_starts,
    }))
}

impl Database {
    pub async fn session_history(&self) -> Result<Option<SessionHistory>> {
        self.execute(|conn| read_history(conn)).await
    }

    /// Bump the session counter and keep only the newest `cap` start times.
    pub async fn record_session_start(
        &self,
        started_at: DateTime<Utc>,
        cap: usize,
    ) -> Result<SessionHistory> {
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open session transaction")?;
            let stamp = started_at.to_rfc3339();

            tx.execute(
                "INSERT OR IGNORE INTO session_history (id, session_count, total_time_ms, first_seen_at)
                 VALUES (1, 0, 0, ?1)",
                params![stamp],
            )?;
            tx.execute(
                "UPDATE session_history
                 SET session_count = session_count + 1,
                     last_started_at = ?1
                 WHERE id = 1",
                params![stamp],
            )?;
            tx.execute(
                "INSERT INTO session_starts (started_at) VALUES (?1)",
                params![stamp],
            )?;
            tx.execute(
                "DELETE FROM session_starts
                 WHERE id NOT IN (SELECT id FROM session_starts ORDER BY id DESC LIMIT ?1)",
                params![to_i64(cap as u64)?],
            )?;

            let history = read_history(&tx)?
                .context("session history missing after insert")?;
            tx.commit().context("failed to commit session start")?;
            Ok(history)
        })
        .await
    }

    pub async fn record_session_end(&self, duration_ms: u64) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "UPDATE session_history
                 SET total_time_ms = total_time_ms + ?1
                 WHERE id = 1",
                params![to_i64(duration_ms)?],
            )
            .with_context(|| "failed to add session duration")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn session_starts_are_capped_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::new(tmp.path().join("engine.sqlite3")).unwrap();
        let base = Utc::now();

        for i in 0..5 {
            db.record_session_start(base + Duration::minutes(i), 3)
                .await
                .unwrap();
        }
        db.record_session_end(1_500).await.unwrap();
        db.record_session_end(500).await.unwrap();

        let history = db.session_history().await.unwrap().unwrap();
        assert_eq!(history.session_count, 5);
        assert_eq!(history.total_time_ms, 2_000);
        assert_eq!(history.recent_starts.len(), 3);
        assert!(history.recent_starts[0] > history.recent_starts[2]);
        assert_eq!(
            history.first_seen_at.timestamp(),
            base.timestamp(),
        );
    }

    #[tokio::test]
    async fn empty_store_has_no_history() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::new(tmp.path().join("engine.sqlite3")).unwrap();
        assert!(db.session_history().await.unwrap().is_none());
        // Ending a session that never started is a no-op.
        db.record_session_end(10).await.unwrap();
    }
}
