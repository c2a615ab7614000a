use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireAnswer {
    pub question_id: String,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}
