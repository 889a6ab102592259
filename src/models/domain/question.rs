use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A single survey question. Questions live independently of surveys and are
/// only referenced by them through [`SurveyQuestion`](super::SurveyQuestion) rows.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub meta: Option<Value>, // free-form, owned by the admin UI
    pub added_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl Question {
    pub fn new(question: &str, meta: Option<Value>) -> Self {
        let now = Utc::now();
        Question {
            id: Uuid::new_v4().to_string(),
            question: question.to_string(),
            meta,
            added_at: now,
            edited_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.edited_at = Utc::now();
    }
}
