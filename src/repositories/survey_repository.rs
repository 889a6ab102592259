use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    error::{TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::IndexOptions,
    Client, ClientSession, Collection, IndexModel,
};

#[cfg(test)]
use mockall::automock;

use crate::{
    db::{Database, SURVEYS_COLLECTION, SURVEY_QUESTIONS_COLLECTION},
    errors::{AppError, AppResult},
    models::domain::{Survey, SurveyQuestion},
};

/// Surveys together with the join rows they own. Every write that touches
/// both collections is atomic.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SurveyRepository: Send + Sync {
    /// Inserts the survey and its join rows together.
    async fn create(&self, survey: Survey, links: Vec<SurveyQuestion>) -> AppResult<Survey>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Survey>>;
    async fn find_all(&self, active: Option<bool>) -> AppResult<Vec<Survey>>;
    /// Join rows of the given surveys, ascending by survey then order.
    async fn find_links(&self, survey_ids: &[String]) -> AppResult<Vec<SurveyQuestion>>;
    /// Replaces the survey row and, when `links` is given, swaps the whole
    /// join row set for it.
    async fn update(&self, survey: Survey, links: Option<Vec<SurveyQuestion>>) -> AppResult<Survey>;
    /// Removes the join rows, then the survey.
    async fn delete(&self, id: &str) -> AppResult<()>;
    async fn count_question_references(&self, question_id: &str) -> AppResult<u64>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// Whether an attempt that failed carrying `label` may run again.
fn should_retry(has_label: impl Fn(&str) -> bool, label: &str, attempt: u32) -> bool {
    attempt < MAX_TRANSACTION_ATTEMPTS && has_label(label)
}

/// One multi-collection write, run inside a transaction.
enum SurveyWrite<'a> {
    Create {
        survey: &'a Survey,
        links: &'a [SurveyQuestion],
    },
    Update {
        survey: &'a Survey,
        links: Option<&'a [SurveyQuestion]>,
    },
    Delete {
        id: &'a str,
    },
}

pub struct MongoSurveyRepository {
    client: Client,
    surveys: Collection<Survey>,
    links: Collection<SurveyQuestion>,
}

impl MongoSurveyRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            client: db.client().clone(),
            surveys: db.get_collection(SURVEYS_COLLECTION),
            links: db.get_collection(SURVEY_QUESTIONS_COLLECTION),
        }
    }

    /// Runs `write` in a transaction, retrying the whole transaction on
    /// `TransientTransactionError` (a write conflict with a concurrent
    /// writer) and the commit on `UnknownTransactionCommitResult`. Returns
    /// whether the targeted survey existed; when it did not, nothing is kept.
    async fn transact(&self, write: SurveyWrite<'_>) -> AppResult<bool> {
        let mut session = self.client.start_session().await?;
        let mut attempt = 1;

        loop {
            session.start_transaction().await?;

            let outcome = match self.apply(&write, &mut session).await {
                Ok(true) => Self::commit(&mut session).await.map(|_| true),
                Ok(false) => {
                    Self::abort(&mut session).await;
                    Ok(false)
                }
                Err(err) => {
                    Self::abort(&mut session).await;
                    Err(err)
                }
            };

            match outcome {
                Err(err)
                    if should_retry(|l| err.contains_label(l), TRANSIENT_TRANSACTION_ERROR, attempt) =>
                {
                    log::warn!(
                        "Survey transaction attempt {} conflicted, retrying: {}",
                        attempt,
                        err
                    );
                    attempt += 1;
                }
                other => return other.map_err(AppError::from),
            }
        }
    }

    async fn apply(
        &self,
        write: &SurveyWrite<'_>,
        session: &mut ClientSession,
    ) -> mongodb::error::Result<bool> {
        match write {
            SurveyWrite::Create { survey, links } => {
                self.surveys.insert_one(*survey).session(&mut *session).await?;
                self.insert_links(links, session).await?;
                Ok(true)
            }
            SurveyWrite::Update { survey, links } => {
                let result = self
                    .surveys
                    .replace_one(doc! { "id": &survey.id }, *survey)
                    .session(&mut *session)
                    .await?;

                if result.matched_count == 0 {
                    return Ok(false);
                }

                if let Some(links) = links {
                    self.links
                        .delete_many(doc! { "survey_id": &survey.id })
                        .session(&mut *session)
                        .await?;
                    self.insert_links(links, session).await?;
                }
                Ok(true)
            }
            SurveyWrite::Delete { id } => {
                self.links
                    .delete_many(doc! { "survey_id": *id })
                    .session(&mut *session)
                    .await?;

                let result = self
                    .surveys
                    .delete_one(doc! { "id": *id })
                    .session(&mut *session)
                    .await?;
                Ok(result.deleted_count > 0)
            }
        }
    }

    async fn commit(session: &mut ClientSession) -> mongodb::error::Result<()> {
        let mut attempt = 1;
        loop {
            match session.commit_transaction().await {
                Err(err)
                    if should_retry(
                        |l| err.contains_label(l),
                        UNKNOWN_TRANSACTION_COMMIT_RESULT,
                        attempt,
                    ) =>
                {
                    log::warn!("Survey commit result unknown, retrying: {}", err);
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn abort(session: &mut ClientSession) {
        // The server may already have aborted it.
        if let Err(err) = session.abort_transaction().await {
            log::debug!("Survey transaction abort failed: {}", err);
        }
    }

    async fn insert_links(
        &self,
        links: &[SurveyQuestion],
        session: &mut ClientSession,
    ) -> mongodb::error::Result<()> {
        if !links.is_empty() {
            self.links.insert_many(links).session(session).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SurveyRepository for MongoSurveyRepository {
    async fn create(&self, survey: Survey, links: Vec<SurveyQuestion>) -> AppResult<Survey> {
        self.transact(SurveyWrite::Create {
            survey: &survey,
            links: &links,
        })
        .await?;
        Ok(survey)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Survey>> {
        let survey = self.surveys.find_one(doc! { "id": id }).await?;
        Ok(survey)
    }

    async fn find_all(&self, active: Option<bool>) -> AppResult<Vec<Survey>> {
        let filter = match active {
            Some(active) => doc! { "active": active },
            None => Document::new(),
        };

        let cursor = self.surveys.find(filter).sort(doc! { "added_at": 1 }).await?;
        let surveys: Vec<Survey> = cursor.try_collect().await?;
        Ok(surveys)
    }

    async fn find_links(&self, survey_ids: &[String]) -> AppResult<Vec<SurveyQuestion>> {
        if survey_ids.is_empty() {
            return Ok(vec![]);
        }

        let cursor = self
            .links
            .find(doc! { "survey_id": { "$in": survey_ids.to_vec() } })
            .sort(doc! { "survey_id": 1, "order": 1 })
            .await?;
        let links: Vec<SurveyQuestion> = cursor.try_collect().await?;
        Ok(links)
    }

    async fn update(&self, survey: Survey, links: Option<Vec<SurveyQuestion>>) -> AppResult<Survey> {
        let found = self
            .transact(SurveyWrite::Update {
                survey: &survey,
                links: links.as_deref(),
            })
            .await?;

        if !found {
            return Err(AppError::NotFound(format!(
                "Survey with id '{}' not found",
                survey.id
            )));
        }
        Ok(survey)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let found = self.transact(SurveyWrite::Delete { id }).await?;

        if !found {
            return Err(AppError::NotFound(format!(
                "Survey with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    async fn count_question_references(&self, question_id: &str) -> AppResult<u64> {
        let count = self
            .links
            .count_documents(doc! { "question_id": question_id })
            .await?;
        Ok(count)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let survey_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();
        self.surveys.create_index(survey_id_index).await?;

        let link_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("id_unique".to_string())
                        .build(),
                )
                .build(),
            // one question per position per survey
            IndexModel::builder()
                .keys(doc! { "survey_id": 1, "order": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("survey_order_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "question_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("question_id".to_string())
                        .build(),
                )
                .build(),
        ];
        self.links.create_indexes(link_indexes).await?;

        log::info!(
            "Ensured indexes for {} and {} collections",
            SURVEYS_COLLECTION,
            SURVEY_QUESTIONS_COLLECTION
        );
        Ok(())
    }
}
