pub mod admin_service;
pub mod question_service;
pub mod survey_service;

pub use admin_service::AdminService;
pub use question_service::QuestionService;
pub use survey_service::SurveyService;
