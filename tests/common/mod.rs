#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use actix_web::web;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use survey_server::{
    app_state::AppState,
    auth::StaticKeys,
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{AdminUser, Question, Survey, SurveyQuestion},
    repositories::{AdminUserRepository, QuestionRepository, SurveyRepository},
};

pub const TEST_KEY_PEM: &[u8] = include_bytes!("../fixtures/jwt_test_key.pem");
pub const TEST_JWKS: &str = include_str!("../fixtures/jwks.json");
pub const TEST_KID: &str = "test-key-1";
pub const TEST_ISSUER: &str = "https://login.microsoftonline.com/test-tenant/v2.0";

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    questions: RwLock<Vec<Question>>,
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn create(&self, question: Question) -> AppResult<Question> {
        let mut questions = self.questions.write().await;
        if questions.iter().any(|q| q.id == question.id) {
            return Err(AppError::Conflict(format!(
                "Question with id '{}' already exists",
                question.id
            )));
        }
        questions.push(question.clone());
        Ok(question)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Question>> {
        let questions = self.questions.read().await;
        Ok(questions.iter().find(|q| q.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<Question>> {
        let questions = self.questions.read().await;
        Ok(questions
            .iter()
            .filter(|q| ids.contains(&q.id))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> AppResult<Vec<Question>> {
        Ok(self.questions.read().await.clone())
    }

    async fn update(&self, question: Question) -> AppResult<Question> {
        let mut questions = self.questions.write().await;
        let Some(slot) = questions.iter_mut().find(|q| q.id == question.id) else {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                question.id
            )));
        };
        *slot = question.clone();
        Ok(question)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut questions = self.questions.write().await;
        let before = questions.len();
        questions.retain(|q| q.id != id);
        if questions.len() == before {
            return Err(AppError::NotFound(format!(
                "Question with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct SurveyTables {
    surveys: Vec<Survey>,
    links: Vec<SurveyQuestion>,
}

/// Keeps surveys and join rows behind one lock, so a create, replace or
/// delete is observed all at once, the way a transaction would be.
#[derive(Default)]
pub struct InMemorySurveyRepository {
    tables: RwLock<SurveyTables>,
}

impl InMemorySurveyRepository {
    pub async fn link_count(&self) -> usize {
        self.tables.read().await.links.len()
    }

    pub async fn links_of(&self, survey_id: &str) -> Vec<SurveyQuestion> {
        let tables = self.tables.read().await;
        tables
            .links
            .iter()
            .filter(|l| l.survey_id == survey_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SurveyRepository for InMemorySurveyRepository {
    async fn create(&self, survey: Survey, links: Vec<SurveyQuestion>) -> AppResult<Survey> {
        let mut tables = self.tables.write().await;
        tables.surveys.push(survey.clone());
        tables.links.extend(links);
        Ok(survey)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Survey>> {
        let tables = self.tables.read().await;
        Ok(tables.surveys.iter().find(|s| s.id == id).cloned())
    }

    async fn find_all(&self, active: Option<bool>) -> AppResult<Vec<Survey>> {
        let tables = self.tables.read().await;
        Ok(tables
            .surveys
            .iter()
            .filter(|s| active.is_none() || s.active == active)
            .cloned()
            .collect())
    }

    async fn find_links(&self, survey_ids: &[String]) -> AppResult<Vec<SurveyQuestion>> {
        let tables = self.tables.read().await;
        let mut links: Vec<SurveyQuestion> = tables
            .links
            .iter()
            .filter(|l| survey_ids.contains(&l.survey_id))
            .cloned()
            .collect();
        links.sort_by(|a, b| {
            a.survey_id
                .cmp(&b.survey_id)
                .then_with(|| a.order.cmp(&b.order))
        });
        Ok(links)
    }

    async fn update(&self, survey: Survey, links: Option<Vec<SurveyQuestion>>) -> AppResult<Survey> {
        let mut tables = self.tables.write().await;
        let Some(slot) = tables.surveys.iter_mut().find(|s| s.id == survey.id) else {
            return Err(AppError::NotFound(format!(
                "Survey with id '{}' not found",
                survey.id
            )));
        };
        *slot = survey.clone();

        if let Some(links) = links {
            tables.links.retain(|l| l.survey_id != survey.id);
            tables.links.extend(links);
        }
        Ok(survey)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let before = tables.surveys.len();
        tables.surveys.retain(|s| s.id != id);
        if tables.surveys.len() == before {
            return Err(AppError::NotFound(format!(
                "Survey with id '{}' not found",
                id
            )));
        }
        tables.links.retain(|l| l.survey_id != id);
        Ok(())
    }

    async fn count_question_references(&self, question_id: &str) -> AppResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .iter()
            .filter(|l| l.question_id == question_id)
            .count() as u64)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAdminUserRepository {
    admins: HashMap<String, AdminUser>,
}

impl InMemoryAdminUserRepository {
    pub fn with_admins(admins: Vec<AdminUser>) -> Self {
        Self {
            admins: admins.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }
}

#[async_trait]
impl AdminUserRepository for InMemoryAdminUserRepository {
    async fn find_by_azure_id(&self, azure_id: &str) -> AppResult<Option<AdminUser>> {
        Ok(self
            .admins
            .values()
            .find(|a| a.azure_id.as_deref() == Some(azure_id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<AdminUser>> {
        Ok(self
            .admins
            .values()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}

pub fn admin(id: &str, azure_id: &str, is_admin: bool, active: bool) -> AdminUser {
    AdminUser {
        id: id.to_string(),
        azure_id: Some(azure_id.to_string()),
        email: None,
        is_admin,
        active,
    }
}

/// Repositories behind a test `AppState`, kept so tests can inspect storage.
pub struct TestContext {
    pub questions: Arc<InMemoryQuestionRepository>,
    pub surveys: Arc<InMemorySurveyRepository>,
    pub state: web::Data<AppState>,
}

pub fn test_context(admins: Vec<AdminUser>) -> TestContext {
    test_context_with_config(Config::test_config(), admins)
}

pub fn test_context_with_config(config: Config, admins: Vec<AdminUser>) -> TestContext {
    let questions = Arc::new(InMemoryQuestionRepository::default());
    let surveys = Arc::new(InMemorySurveyRepository::default());
    let keys = StaticKeys::from_json(TEST_JWKS).expect("test JWKS should parse");

    let state = AppState::from_repositories(
        config,
        questions.clone(),
        surveys.clone(),
        Arc::new(InMemoryAdminUserRepository::with_admins(admins)),
        Arc::new(keys),
    );

    TestContext {
        questions,
        surveys,
        state: web::Data::new(state),
    }
}

/// Claims of a well-formed token from the test tenant.
pub fn valid_claims(oid: &str) -> Value {
    let now = Utc::now();
    json!({
        "iss": TEST_ISSUER,
        "aud": "test-client",
        "oid": oid,
        "preferred_username": format!("{}@example.com", oid),
        "iat": now.timestamp(),
        "exp": (now + Duration::hours(1)).timestamp(),
    })
}

pub fn sign(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_KEY_PEM).expect("test key should load");
    encode(&header, claims, &key).expect("token should sign")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
