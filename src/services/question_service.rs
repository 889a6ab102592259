use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::Question,
        dto::{
            request::{CreateQuestionRequest, UpdateQuestionRequest},
            response::QuestionDto,
        },
    },
    repositories::{QuestionRepository, SurveyRepository},
};

pub struct QuestionService {
    questions: Arc<dyn QuestionRepository>,
    surveys: Arc<dyn SurveyRepository>,
}

impl QuestionService {
    pub fn new(questions: Arc<dyn QuestionRepository>, surveys: Arc<dyn SurveyRepository>) -> Self {
        Self { questions, surveys }
    }

    pub async fn create_question(&self, request: CreateQuestionRequest) -> AppResult<QuestionDto> {
        request.validate()?;

        let question = Question::new(&request.question, request.meta);
        let created = self.questions.create(question).await?;

        log::info!("Created question {}", created.id);
        Ok(created.into())
    }

    pub async fn list_questions(&self) -> AppResult<Vec<QuestionDto>> {
        let questions = self.questions.find_all().await?;
        Ok(questions.into_iter().map(QuestionDto::from).collect())
    }

    pub async fn get_question(&self, id: &str) -> AppResult<QuestionDto> {
        let question = self.find_question(id).await?;
        Ok(question.into())
    }

    pub async fn update_question(
        &self,
        id: &str,
        request: UpdateQuestionRequest,
    ) -> AppResult<QuestionDto> {
        request.validate()?;

        let mut question = self.find_question(id).await?;
        request.apply_to(&mut question);

        let updated = self.questions.update(question).await?;
        Ok(updated.into())
    }

    /// Questions still placed on a survey cannot be deleted; the survey must drop them first.
    pub async fn delete_question(&self, id: &str) -> AppResult<()> {
        self.find_question(id).await?;

        let references = self.surveys.count_question_references(id).await?;
        if references > 0 {
            return Err(AppError::Conflict(format!(
                "question is used by {} survey position(s)",
                references
            )));
        }

        self.questions.delete(id).await?;
        log::info!("Deleted question {}", id);
        Ok(())
    }

    async fn find_question(&self, id: &str) -> AppResult<Question> {
        self.questions
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Question with id '{}' not found", id)))
    }
}
