pub mod admin_user_repository;
pub mod question_repository;
pub mod survey_repository;

pub use admin_user_repository::{AdminUserRepository, MongoAdminUserRepository};
pub use question_repository::{MongoQuestionRepository, QuestionRepository};
pub use survey_repository::{MongoSurveyRepository, SurveyRepository};

#[cfg(test)]
pub use admin_user_repository::MockAdminUserRepository;
#[cfg(test)]
pub use question_repository::MockQuestionRepository;
#[cfg(test)]
pub use survey_repository::MockSurveyRepository;
