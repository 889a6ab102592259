use std::sync::Arc;

use crate::{
    auth::Identity,
    errors::{AppError, AppResult},
    models::domain::AdminUser,
    repositories::AdminUserRepository,
};

pub struct AdminService {
    repository: Arc<dyn AdminUserRepository>,
}

impl AdminService {
    pub fn new(repository: Arc<dyn AdminUserRepository>) -> Self {
        Self { repository }
    }

    /// Object id lookup first, email only as a fallback. A missing record and
    /// a non-admin or inactive one are indistinguishable to the caller (403).
    pub async fn authorize(&self, identity: &Identity) -> AppResult<AdminUser> {
        if identity.email.is_none() && identity.object_id.is_none() {
            return Err(AppError::Unauthorized("not authenticated".to_string()));
        }

        let mut user = None;
        if let Some(oid) = &identity.object_id {
            user = self.repository.find_by_azure_id(oid).await?;
        }
        if user.is_none() {
            if let Some(email) = &identity.email {
                user = self.repository.find_by_email(email).await?;
            }
        }

        match user {
            Some(user) if user.can_administer() => Ok(user),
            Some(user) => {
                log::warn!(
                    "Admin {} denied (is_admin={}, active={})",
                    user.id,
                    user.is_admin,
                    user.active
                );
                Err(AppError::Forbidden("forbidden".to_string()))
            }
            None => {
                log::warn!(
                    "No admin record for oid={:?} email={:?}",
                    identity.object_id,
                    identity.email
                );
                Err(AppError::Forbidden("forbidden".to_string()))
            }
        }
    }
}
