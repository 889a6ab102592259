pub mod admin_user;
pub mod question;
pub mod survey;
pub mod survey_question;
pub use admin_user::AdminUser;
pub use question::Question;
pub use survey::Survey;
pub use survey_question::SurveyQuestion;
