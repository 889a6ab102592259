use std::sync::Arc;

use crate::{
    auth::{KeyResolver, TokenVerifier},
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        AdminUserRepository, MongoAdminUserRepository, MongoQuestionRepository,
        MongoSurveyRepository, QuestionRepository, SurveyRepository,
    },
    services::{AdminService, QuestionService, SurveyService},
};

#[derive(Clone)]
pub struct AppState {
    pub question_service: Arc<QuestionService>,
    pub survey_service: Arc<SurveyService>,
    pub admin_service: Arc<AdminService>,
    pub token_verifier: Arc<TokenVerifier>,
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let question_repository = Arc::new(MongoQuestionRepository::new(&db));
        question_repository.ensure_indexes().await?;

        let survey_repository = Arc::new(MongoSurveyRepository::new(&db));
        survey_repository.ensure_indexes().await?;

        let admin_repository = Arc::new(MongoAdminUserRepository::new(&db));
        admin_repository.ensure_indexes().await?;

        let token_verifier = TokenVerifier::from_config(&config)?;

        let mut state = Self::with_parts(
            config,
            question_repository,
            survey_repository,
            admin_repository,
            token_verifier,
        );
        state.db = Some(db);
        Ok(state)
    }

    /// State over arbitrary repositories and signing keys, without a database handle.
    pub fn from_repositories(
        config: Config,
        questions: Arc<dyn QuestionRepository>,
        surveys: Arc<dyn SurveyRepository>,
        admins: Arc<dyn AdminUserRepository>,
        keys: Arc<dyn KeyResolver>,
    ) -> Self {
        let token_verifier = TokenVerifier::new(&config, keys);
        Self::with_parts(config, questions, surveys, admins, token_verifier)
    }

    fn with_parts(
        config: Config,
        questions: Arc<dyn QuestionRepository>,
        surveys: Arc<dyn SurveyRepository>,
        admins: Arc<dyn AdminUserRepository>,
        token_verifier: TokenVerifier,
    ) -> Self {
        Self {
            question_service: Arc::new(QuestionService::new(questions.clone(), surveys.clone())),
            survey_service: Arc::new(SurveyService::new(surveys, questions)),
            admin_service: Arc::new(AdminService::new(admins)),
            token_verifier: Arc::new(token_verifier),
            db: None,
            config: Arc::new(config),
        }
    }
}
