use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{survey_question::ordered_questions, Question, Survey, SurveyQuestion},
        dto::{
            request::{CreateSurveyRequest, UpdateSurveyRequest},
            response::SurveyDto,
        },
    },
    repositories::{QuestionRepository, SurveyRepository},
};

/// Maintains each survey's ordered question list. The list is always written
/// whole: create inserts one join row per id, update deletes every row and
/// re-inserts the new list, both inside one repository transaction.
pub struct SurveyService {
    surveys: Arc<dyn SurveyRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl SurveyService {
    pub fn new(surveys: Arc<dyn SurveyRepository>, questions: Arc<dyn QuestionRepository>) -> Self {
        Self { surveys, questions }
    }

    pub async fn create_survey(&self, request: CreateSurveyRequest) -> AppResult<SurveyDto> {
        request.validate()?;

        let (survey, question_ids) = request.into_survey();
        let lookup = self.load_questions(&question_ids).await?;
        let links = SurveyQuestion::link_all(&survey.id, &question_ids);

        let created = self.surveys.create(survey, links.clone()).await?;
        log::info!(
            "Created survey {} with {} question(s)",
            created.id,
            links.len()
        );

        let questions = ordered_questions(&links, &lookup);
        Ok(SurveyDto::new(created, questions))
    }

    pub async fn list_surveys(&self, active: Option<bool>) -> AppResult<Vec<SurveyDto>> {
        let surveys = self.surveys.find_all(active).await?;
        if surveys.is_empty() {
            return Ok(vec![]);
        }

        let survey_ids: Vec<String> = surveys.iter().map(|s| s.id.clone()).collect();
        let links = self.surveys.find_links(&survey_ids).await?;

        let mut links_by_survey: HashMap<String, Vec<SurveyQuestion>> = HashMap::new();
        for link in links {
            links_by_survey
                .entry(link.survey_id.clone())
                .or_default()
                .push(link);
        }

        let all_question_ids: Vec<String> = links_by_survey
            .values()
            .flatten()
            .map(|l| l.question_id.clone())
            .collect();
        let lookup = self.fetch_questions(&all_question_ids).await?;

        Ok(surveys
            .into_iter()
            .map(|survey| {
                let links = links_by_survey.remove(&survey.id).unwrap_or_default();
                let questions = ordered_questions(&links, &lookup);
                SurveyDto::new(survey, questions)
            })
            .collect())
    }

    pub async fn get_survey(&self, id: &str) -> AppResult<SurveyDto> {
        let survey = self.find_survey(id).await?;
        self.materialize(survey).await
    }

    pub async fn update_survey(&self, id: &str, request: UpdateSurveyRequest) -> AppResult<SurveyDto> {
        request.validate()?;

        let mut survey = self.find_survey(id).await?;
        let replacement = request.apply_to(&mut survey);

        let links = match replacement {
            Some(question_ids) => {
                self.load_questions(&question_ids).await?;
                Some(SurveyQuestion::link_all(&survey.id, &question_ids))
            }
            None => None,
        };

        if let Some(links) = &links {
            log::info!(
                "Replacing question list of survey {} with {} question(s)",
                survey.id,
                links.len()
            );
        }

        let updated = self.surveys.update(survey, links).await?;
        self.materialize(updated).await
    }

    pub async fn delete_survey(&self, id: &str) -> AppResult<()> {
        self.surveys.delete(id).await?;
        log::info!("Deleted survey {}", id);
        Ok(())
    }

    async fn find_survey(&self, id: &str) -> AppResult<Survey> {
        self.surveys
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Survey with id '{}' not found", id)))
    }

    async fn materialize(&self, survey: Survey) -> AppResult<SurveyDto> {
        let links = self.surveys.find_links(&[survey.id.clone()]).await?;
        let question_ids: Vec<String> = links.iter().map(|l| l.question_id.clone()).collect();
        let lookup = self.fetch_questions(&question_ids).await?;

        let questions = ordered_questions(&links, &lookup);
        Ok(SurveyDto::new(survey, questions))
    }

    async fn fetch_questions(&self, ids: &[String]) -> AppResult<HashMap<String, Question>> {
        let unique: Vec<String> = ids
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let questions = self.questions.find_by_ids(&unique).await?;
        Ok(questions.into_iter().map(|q| (q.id.clone(), q)).collect())
    }

    /// Like `fetch_questions`, but every requested id must exist.
    async fn load_questions(&self, ids: &[String]) -> AppResult<HashMap<String, Question>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let lookup = self.fetch_questions(ids).await?;
        let unknown: BTreeSet<&str> = ids
            .iter()
            .filter(|id| !lookup.contains_key(id.as_str()))
            .map(String::as_str)
            .collect();

        if !unknown.is_empty() {
            let listed: Vec<&str> = unknown.into_iter().collect();
            return Err(AppError::invalid_field(
                "questions",
                format!("unknown question id(s): {}", listed.join(", ")),
            ));
        }

        Ok(lookup)
    }
}
