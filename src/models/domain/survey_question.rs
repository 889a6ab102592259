use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::Question;

/// Join row placing one question at one position of one survey.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SurveyQuestion {
    pub id: String,
    pub survey_id: String,
    pub question_id: String,
    pub order: i32,
}

impl SurveyQuestion {
    pub fn new(survey_id: &str, question_id: &str, order: i32) -> Self {
        SurveyQuestion {
            id: Uuid::new_v4().to_string(),
            survey_id: survey_id.to_string(),
            question_id: question_id.to_string(),
            order,
        }
    }

    /// One row per id, numbered 0.. in the order given. Duplicates are kept,
    /// each at its own position.
    pub fn link_all(survey_id: &str, question_ids: &[String]) -> Vec<Self> {
        question_ids
            .iter()
            .enumerate()
            .map(|(idx, qid)| SurveyQuestion::new(survey_id, qid, idx as i32))
            .collect()
    }
}

/// Resolves a survey's join rows into its questions, ascending by `order`.
/// Rows with equal order keep their incoming sequence. Rows whose question
/// can no longer be found are skipped.
pub fn ordered_questions(
    links: &[SurveyQuestion],
    questions: &HashMap<String, Question>,
) -> Vec<Question> {
    let mut sorted: Vec<&SurveyQuestion> = links.iter().collect();
    sorted.sort_by_key(|link| link.order);

    sorted
        .into_iter()
        .filter_map(|link| questions.get(&link.question_id).cloned())
        .collect()
}
