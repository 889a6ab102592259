mod common;

use actix_web::{http::StatusCode, test, App};
use serde_json::{json, Value};

use common::{
    admin, bearer, sign, test_context, test_context_with_config, valid_claims, TestContext,
};
use survey_server::{
    config::Config,
    handlers,
    middleware::{RequestIdMiddleware, REQUEST_ID_HEADER},
    models::dto::response::{QuestionDto, SurveyDto},
};

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data($ctx.state.clone())
                .wrap(RequestIdMiddleware)
                .configure(handlers::configure),
        )
        .await
    };
}

macro_rules! create_question {
    ($app:expr, $text:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/questions")
            .set_json(json!({ "question": $text }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let question: QuestionDto = test::read_body_json(resp).await;
        question
    }};
}

fn question_ids(survey: &SurveyDto) -> Vec<String> {
    survey.questions.iter().map(|q| q.id.clone()).collect()
}

#[actix_web::test]
async fn test_question_crud_flow() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let created = create_question!(app, "Favourite colour?");
    assert_eq!(created.question, "Favourite colour?");
    assert!(created.meta.is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/questions/{}", created.id))
        .to_request();
    let fetched: QuestionDto = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, created);

    let req = test::TestRequest::put()
        .uri(&format!("/api/questions/{}", created.id))
        .set_json(json!({ "meta": { "kind": "text" } }))
        .to_request();
    let updated: QuestionDto = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.question, "Favourite colour?");
    assert_eq!(updated.meta, Some(json!({ "kind": "text" })));
    assert!(updated.edited_at >= created.edited_at);
    assert_eq!(updated.added_at, created.added_at);

    let req = test::TestRequest::get().uri("/api/questions").to_request();
    let listed: Vec<QuestionDto> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/questions/{}", created.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/questions/{}", created.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_question_rejects_empty_text() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/questions")
        .set_json(json!({ "question": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 400);
    assert!(body["details"]["question"].is_array());
}

#[actix_web::test]
async fn test_malformed_body_is_a_structured_bad_request() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/surveys")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "malformed request body");
}

#[actix_web::test]
async fn test_survey_keeps_requested_question_order() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let q1 = create_question!(app, "Q1");
    let q2 = create_question!(app, "Q2");
    let q3 = create_question!(app, "Q3");

    let req = test::TestRequest::post()
        .uri("/api/surveys")
        .set_json(json!({
            "name": "S1",
            "active": true,
            "questions": [q2.id, q1.id]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let survey: SurveyDto = test::read_body_json(resp).await;
    assert_eq!(question_ids(&survey), vec![q2.id.clone(), q1.id.clone()]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/surveys/{}", survey.id))
        .to_request();
    let fetched: SurveyDto = test::call_and_read_body_json(&app, req).await;
    assert_eq!(question_ids(&fetched), vec![q2.id.clone(), q1.id.clone()]);
    assert_eq!(ctx.surveys.link_count().await, 2);

    let req = test::TestRequest::put()
        .uri(&format!("/api/surveys/{}", survey.id))
        .set_json(json!({ "questions": [q3.id] }))
        .to_request();
    let updated: SurveyDto = test::call_and_read_body_json(&app, req).await;
    assert_eq!(question_ids(&updated), vec![q3.id.clone()]);
    assert_eq!(updated.name, "S1");
    assert_eq!(ctx.surveys.link_count().await, 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/surveys/{}", survey.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(ctx.surveys.link_count().await, 0);

    // questions outlive the survey
    let req = test::TestRequest::get().uri("/api/questions").to_request();
    let listed: Vec<QuestionDto> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 3);
}

#[actix_web::test]
async fn test_survey_with_unknown_question_is_rejected() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/surveys")
        .set_json(json!({ "name": "S1", "questions": ["missing"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["details"]["questions"].is_array());
    assert_eq!(ctx.surveys.link_count().await, 0);
}

#[actix_web::test]
async fn test_survey_list_filters_on_active() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    for (name, active) in [("Live", json!(true)), ("Draft", json!(false)), ("Unset", Value::Null)] {
        let req = test::TestRequest::post()
            .uri("/api/surveys")
            .set_json(json!({ "name": name, "active": active }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get().uri("/api/surveys").to_request();
    let all: Vec<SurveyDto> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(all.len(), 3);

    let req = test::TestRequest::get()
        .uri("/api/surveys?active=true")
        .to_request();
    let live: Vec<SurveyDto> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].name, "Live");
}

#[actix_web::test]
async fn test_referenced_question_cannot_be_deleted() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let q1 = create_question!(app, "Q1");
    let req = test::TestRequest::post()
        .uri("/api/surveys")
        .set_json(json!({ "name": "S1", "questions": [q1.id] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/questions/{}", q1.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_missing_resources_are_not_found() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    for (method, uri) in [
        ("GET", "/api/questions/nope"),
        ("PUT", "/api/questions/nope"),
        ("DELETE", "/api/questions/nope"),
        ("GET", "/api/surveys/nope"),
        ("PUT", "/api/surveys/nope"),
        ("DELETE", "/api/surveys/nope"),
    ] {
        let req = match method {
            "GET" => test::TestRequest::get(),
            "PUT" => test::TestRequest::put().set_json(json!({})),
            _ => test::TestRequest::delete(),
        }
        .uri(uri)
        .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{} {}", method, uri);
    }
}

#[actix_web::test]
async fn test_responses_carry_request_id() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
}

#[actix_web::test]
async fn test_health_ready_without_database() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ready");
}

async fn call_protected(ctx: &TestContext, auth: Option<String>) -> (StatusCode, Value) {
    call_protected_with_header(ctx, auth.map(|token| bearer(&token).1)).await
}

async fn call_protected_with_header(
    ctx: &TestContext,
    authorization: Option<String>,
) -> (StatusCode, Value) {
    let app = init_app!(ctx);

    let mut req = test::TestRequest::get().uri("/api/admin/protected");
    if let Some(value) = authorization {
        req = req.insert_header(("Authorization", value));
    }

    let resp = test::call_service(&app, req.to_request()).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

#[actix_web::test]
async fn test_admin_route_without_token_is_unauthorized() {
    let ctx = test_context(vec![]);
    let (status, _) = call_protected(&ctx, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_admin_route_rejects_non_bearer_scheme() {
    let ctx = test_context(vec![admin("a1", "oid-1", true, true)]);

    let (status, _) =
        call_protected_with_header(&ctx, Some("Basic dXNlcjpwYXNzd29yZA==".to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call_protected_with_header(&ctx, Some("Bearer".to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_admin_route_requires_configured_scope() {
    let config = Config {
        azure_required_scope: Some("Surveys.Admin".to_string()),
        ..Config::test_config()
    };
    let ctx = test_context_with_config(config, vec![admin("a1", "oid-1", true, true)]);

    let (status, body) = call_protected(&ctx, Some(sign(&valid_claims("oid-1")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "insufficient_scope_or_role");

    let mut scoped = valid_claims("oid-1");
    scoped["scp"] = json!("openid Surveys.Admin");
    let (status, _) = call_protected(&ctx, Some(sign(&scoped))).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_admin_route_rejects_wrong_audience() {
    let ctx = test_context(vec![admin("a1", "oid-1", true, true)]);

    let mut claims = valid_claims("oid-1");
    claims["aud"] = json!("some-other-api");

    let (status, body) = call_protected(&ctx, Some(sign(&claims))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid token");
}

#[actix_web::test]
async fn test_admin_route_rejects_expired_token() {
    let ctx = test_context(vec![admin("a1", "oid-1", true, true)]);

    let mut claims = valid_claims("oid-1");
    claims["exp"] = json!(chrono::Utc::now().timestamp() - 3600);

    let (status, _) = call_protected(&ctx, Some(sign(&claims))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_admin_route_forbids_unknown_identity() {
    let ctx = test_context(vec![]);
    let (status, _) = call_protected(&ctx, Some(sign(&valid_claims("oid-1")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_admin_route_forbids_inactive_admin() {
    let ctx = test_context(vec![admin("a1", "oid-1", true, false)]);
    let (status, _) = call_protected(&ctx, Some(sign(&valid_claims("oid-1")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_admin_route_admits_active_admin() {
    let ctx = test_context(vec![admin("a1", "oid-1", true, true)]);
    let (status, body) = call_protected(&ctx, Some(sign(&valid_claims("oid-1")))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "You are an admin");
    assert_eq!(body["user"]["id"], "a1");
    assert_eq!(body["identity"]["oid"], "oid-1");
    assert_eq!(body["identity"]["email"], "oid-1@example.com");
}

#[actix_web::test]
async fn test_admin_me_echoes_identity_without_admin_record() {
    let ctx = test_context(vec![]);
    let app = init_app!(ctx);

    let token = sign(&valid_claims("oid-7"));
    let req = test::TestRequest::get()
        .uri("/api/admin/me")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["oid"], "oid-7");
    assert_eq!(body["email"], "oid-7@example.com");
}
