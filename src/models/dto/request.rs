use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;

use crate::models::domain::{Question, Survey};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub question: String,

    #[serde(default)]
    pub meta: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub question: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub meta: Option<Option<Value>>,
}

impl UpdateQuestionRequest {
    pub fn apply_to(self, question: &mut Question) {
        if let Some(text) = self.question {
            question.question = text;
        }
        if let Some(meta) = self.meta {
            question.meta = meta;
        }
        question.touch();
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSurveyRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub synopsis: Option<String>,

    #[serde(default)]
    pub active: Option<bool>,

    // Question ids in display order
    #[serde(default)]
    pub questions: Option<Vec<String>>,

    #[serde(default)]
    pub meta: Option<Value>,
}

impl CreateSurveyRequest {
    /// Builds the survey row and hands back the requested question order.
    pub fn into_survey(self) -> (Survey, Vec<String>) {
        let mut survey = Survey::new(&self.name);
        survey.description = self.description;
        survey.synopsis = self.synopsis;
        survey.active = self.active;
        survey.meta = self.meta;
        (survey, self.questions.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSurveyRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub synopsis: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub active: Option<Option<bool>>,

    /// When present, replaces the survey's whole question list.
    #[serde(default)]
    pub questions: Option<Vec<String>>,

    #[serde(default, deserialize_with = "present")]
    pub meta: Option<Option<Value>>,
}

impl UpdateSurveyRequest {
    /// Applies the scalar fields and returns the replacement question list, if any.
    pub fn apply_to(self, survey: &mut Survey) -> Option<Vec<String>> {
        if let Some(name) = self.name {
            survey.name = name;
        }
        if let Some(description) = self.description {
            survey.description = description;
        }
        if let Some(synopsis) = self.synopsis {
            survey.synopsis = synopsis;
        }
        if let Some(active) = self.active {
            survey.active = active;
        }
        if let Some(meta) = self.meta {
            survey.meta = meta;
        }
        survey.touch();
        self.questions
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveyListParams {
    pub active: Option<bool>,
}
