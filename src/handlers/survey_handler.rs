use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::RequestId,
    models::dto::request::{CreateSurveyRequest, SurveyListParams, UpdateSurveyRequest},
};

#[post("/api/surveys")]
async fn create_survey(
    state: web::Data<AppState>,
    request: web::Json<CreateSurveyRequest>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let survey = state
        .survey_service
        .create_survey(request.into_inner())
        .await?;
    log::debug!("[{}] survey {} created", request_id, survey.id);
    Ok(HttpResponse::Created().json(survey))
}

#[get("/api/surveys")]
async fn list_surveys(
    state: web::Data<AppState>,
    query: web::Query<SurveyListParams>,
) -> Result<HttpResponse, AppError> {
    let surveys = state.survey_service.list_surveys(query.active).await?;
    Ok(HttpResponse::Ok().json(surveys))
}

#[get("/api/surveys/{id}")]
async fn get_survey(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let survey = state.survey_service.get_survey(&id).await?;
    Ok(HttpResponse::Ok().json(survey))
}

#[put("/api/surveys/{id}")]
async fn update_survey(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<UpdateSurveyRequest>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    let survey = state
        .survey_service
        .update_survey(&id, request.into_inner())
        .await?;
    log::debug!("[{}] survey {} updated", request_id, survey.id);
    Ok(HttpResponse::Ok().json(survey))
}

#[delete("/api/surveys/{id}")]
async fn delete_survey(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request_id: RequestId,
) -> Result<HttpResponse, AppError> {
    state.survey_service.delete_survey(&id).await?;
    log::debug!("[{}] survey {} deleted", request_id, id);
    Ok(HttpResponse::NoContent().finish())
}
