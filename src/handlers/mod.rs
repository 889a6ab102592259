pub mod admin_handler;
pub mod health_handler;
pub mod question_handler;
pub mod survey_handler;

use actix_web::web;

use crate::{auth::AuthMiddleware, errors::AppError};

/// Registers every route. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| AppError::from(err).into()),
    )
    .app_data(
        web::QueryConfig::default().error_handler(|err, _req| {
            AppError::invalid_field("query", err.to_string()).into()
        }),
    )
    .service(health_handler::health_check)
    .service(health_handler::health_check_live)
    .service(health_handler::health_check_ready)
    .service(question_handler::create_question)
    .service(question_handler::list_questions)
    .service(question_handler::get_question)
    .service(question_handler::update_question)
    .service(question_handler::delete_question)
    .service(survey_handler::create_survey)
    .service(survey_handler::list_surveys)
    .service(survey_handler::get_survey)
    .service(survey_handler::update_survey)
    .service(survey_handler::delete_survey)
    .service(
        web::scope("/api/admin")
            .wrap(AuthMiddleware)
            .service(admin_handler::whoami)
            .service(admin_handler::protected),
    );
}
