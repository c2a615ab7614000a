use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::{connection::Database, helpers::parse_datetime, models::QuestionnaireAnswer};

impl Database {
    pub async fn save_questionnaire_answers(
        &self,
        answers: BTreeMap<String, String>,
        answered_at: DateTime<Utc>,
    ) -> Result<()> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for (question_id, answer) in &answers {
                tx.execute(
                    "INSERT INTO questionnaire_answers (question_id, answer, answered_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(question_id) DO UPDATE SET
                         answer = excluded.answer,
                         answered_at = excluded.answered_at",
                    params![question_id, answer, answered_at.to_rfc3339()],
                )?;
            }
            tx.commit().context("failed to commit questionnaire answers")?;
            Ok(())
        })
        .await
    }

    pub async fn questionnaire_answers(&self) -> Result<Vec<QuestionnaireAnswer>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT question_id, answer, answered_at
                 FROM questionnaire_answers
                 ORDER BY question_id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut answers = Vec::new();
            while let Some(row) = rows.next()? {
                answers.push(QuestionnaireAnswer {
                    question_id: row.get(0)?,
                    answer: row.get(1)?,
                    answered_at: parse_datetime(&row.get::<_, String>(2)?, "answered_at")?,
                });
            }

            Ok(answers)
        })
        .await
    }
}
