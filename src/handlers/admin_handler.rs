use actix_web::{get, HttpResponse};

use crate::{
    auth::{AuthenticatedAdmin, AuthenticatedIdentity},
    errors::AppError,
    models::dto::response::{AdminProtectedResponse, AdminSummaryDto, IdentityDto},
};

// Mounted under the `/api/admin` scope, which is wrapped in `AuthMiddleware`.

#[get("/me")]
async fn whoami(identity: AuthenticatedIdentity) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(IdentityDto::from(&identity.0)))
}

#[get("/protected")]
async fn protected(
    identity: AuthenticatedIdentity,
    admin: AuthenticatedAdmin,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(AdminProtectedResponse {
        message: "You are an admin".to_string(),
        user: AdminSummaryDto::from(&admin.0),
        identity: IdentityDto::from(&identity.0),
    }))
}
