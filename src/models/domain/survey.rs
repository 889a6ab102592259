use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Survey row. The ordered question list is not stored here; it is kept as
/// `SurveyQuestion` rows owned by the survey.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Survey {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub meta: Option<Value>,
    pub added_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl Survey {
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Survey {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            synopsis: None,
            active: None,
            meta: None,
            added_at: now,
            edited_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.edited_at = Utc::now();
    }
}
