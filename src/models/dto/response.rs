use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    auth::Identity,
    models::domain::{AdminUser, Question, Survey},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: String,
    pub question: String,
    pub meta: Option<Value>,
    pub added_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl From<Question> for QuestionDto {
    fn from(question: Question) -> Self {
        QuestionDto {
            id: question.id,
            question: question.question,
            meta: question.meta,
            added_at: question.added_at,
            edited_at: question.edited_at,
        }
    }
}

/// A survey with its questions expanded in display order. Join rows are never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub synopsis: Option<String>,
    pub active: Option<bool>,
    pub meta: Option<Value>,
    pub added_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
    pub questions: Vec<QuestionDto>,
}

impl SurveyDto {
    pub fn new(survey: Survey, questions: Vec<Question>) -> Self {
        SurveyDto {
            id: survey.id,
            name: survey.name,
            description: survey.description,
            synopsis: survey.synopsis,
            active: survey.active,
            meta: survey.meta,
            added_at: survey.added_at,
            edited_at: survey.edited_at,
            questions: questions.into_iter().map(QuestionDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityDto {
    pub email: Option<String>,
    pub oid: Option<String>,
}

impl From<&Identity> for IdentityDto {
    fn from(identity: &Identity) -> Self {
        IdentityDto {
            email: identity.email.clone(),
            oid: identity.object_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSummaryDto {
    pub id: String,
    pub email: Option<String>,
}

impl From<&AdminUser> for AdminSummaryDto {
    fn from(admin: &AdminUser) -> Self {
        AdminSummaryDto {
            id: admin.id.clone(),
            email: admin.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProtectedResponse {
    pub message: String,
    pub user: AdminSummaryDto,
    pub identity: IdentityDto,
}
