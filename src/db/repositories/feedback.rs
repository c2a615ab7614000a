use anyhow::{anyhow, Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::db::{connection::Database, helpers::parse_datetime, models::FeedbackEntry};
use crate::feedback::Polarity;

fn parse_polarity(value: &str) -> Result<Polarity> {
    Polarity::parse(value).ok_or_else(|| anyhow!("unknown feedback polarity '{value}'"))
}

impl Database {
    pub async fn feedback_polarity(
        &self,
        scenario: &str,
        action: &str,
    ) -> Result<Option<Polarity>> {
        let scenario = scenario.to_string();
        let action = action.to_string();
        self.execute(move |conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT polarity FROM feedback WHERE scenario = ?1 AND action = ?2",
                    params![scenario, action],
                    |row| row.get(0),
                )
                .optional()?;
            raw.as_deref().map(parse_polarity).transpose()
        })
        .await
    }

    pub async fn upsert_feedback(&self, entry: &FeedbackEntry) -> Result<()> {
        let record = entry.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO feedback (scenario, action, polarity, category, content_type, source, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(scenario, action) DO UPDATE SET
                     polarity = excluded.polarity,
                     category = excluded.category,
                     content_type = excluded.content_type,
                     source = excluded.source,
                     updated_at = excluded.updated_at",
                params![
                    record.scenario,
                    record.action,
                    record.polarity.as_str(),
                    record.category,
                    record.content_type,
                    record.source,
                    record.updated_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to upsert feedback")?;
            Ok(())
        })
        .await
    }

    pub async fn clear_feedback(&self, scenario: &str, action: &str) -> Result<()> {
        let scenario = scenario.to_string();
        let action = action.to_string();
        self.execute(move |conn| {
            conn.execute(
                "DELETE FROM feedback WHERE scenario = ?1 AND action = ?2",
                params![scenario, action],
            )
            .with_context(|| "failed to clear feedback")?;
            Ok(())
        })
        .await
    }

    pub async fn list_feedback(&self) -> Result<Vec<FeedbackEntry>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT scenario, action, polarity, category, content_type, source, updated_at
                 FROM feedback
                 ORDER BY updated_at DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(FeedbackEntry {
                    scenario: row.get(0)?,
                    action: row.get(1)?,
                    polarity: parse_polarity(&row.get::<_, String>(2)?)?,
                    category: row.get(3)?,
                    content_type: row.get(4)?,
                    source: row.get(5)?,
                    updated_at: parse_datetime(&row.get::<_, String>(6)?, "updated_at")?,
                });
            }

            Ok(entries)
        })
        .await
    }
}
