use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::db::connection::Database;
use crate::fingerprint::Fingerprint;

impl Database {
    pub async fn load_fingerprint(&self) -> Result<Option<Fingerprint>> {
        self.execute(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT record_json FROM fingerprint WHERE id = 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;

            raw.map(|json| {
                serde_json::from_str(&json).context("failed to decode fingerprint record")
            })
            .transpose()
        })
        .await
    }

    pub async fn save_fingerprint(&self, fingerprint: &Fingerprint) -> Result<()> {
        let record = fingerprint.clone();
        self.execute(move |conn| {
            let json = serde_json::to_string(&record)
                .context("failed to serialize fingerprint record")?;
            conn.execute(
                "INSERT INTO fingerprint (id, master_id, version, record_json, created_at, updated_at)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     master_id = excluded.master_id,
                     version = excluded.version,
                     record_json = excluded.record_json,
                     updated_at = excluded.updated_at",
                params![
                    record.master_id,
                    record.version,
                    json,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to persist fingerprint")?;
            Ok(())
        })
        .await
    }
}
