use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    auth::{
        claims::Identity,
        jwks::{JwksCache, JwksError, KeyResolver},
    },
    config::Config,
    errors::{AppError, AppResult},
};

/// Why a token was rejected. Only ever logged; callers see a generic 401.
#[derive(Debug, Error)]
enum RejectReason {
    #[error("token validation is not configured (AZURE_TENANT_ID unset)")]
    NotConfigured,

    #[error("token header has no key id")]
    MissingKeyId,

    #[error(transparent)]
    Keys(#[from] JwksError),

    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Verifies bearer tokens issued by the configured tenant and turns them into
/// an [`Identity`].
pub struct TokenVerifier {
    keys: Option<Arc<dyn KeyResolver>>,
    validation: Option<Validation>,
    required_scope: Option<String>,
}

impl TokenVerifier {
    pub fn new(config: &Config, keys: Arc<dyn KeyResolver>) -> Self {
        let validation = config.issuer().map(|issuer| {
            let mut validation = Validation::new(Algorithm::RS256);
            validation.set_issuer(&[issuer]);
            validation.set_required_spec_claims(&["exp", "iss"]);
            validation.validate_nbf = true;
            validation.leeway = 0;

            let audiences = config.audiences();
            if audiences.is_empty() {
                validation.validate_aud = false;
            } else {
                validation.set_audience(&audiences);
            }
            validation
        });

        Self {
            keys: Some(keys),
            validation,
            required_scope: config.azure_required_scope.clone(),
        }
    }

    /// Verifier backed by the tenant's published key set. Without a tenant it
    /// rejects every token.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let Some(url) = config.jwks_url() else {
            log::warn!("AZURE_TENANT_ID is not set. Bearer token validation will fail until configured.");
            return Ok(Self {
                keys: None,
                validation: None,
                required_scope: config.azure_required_scope.clone(),
            });
        };

        let cache = JwksCache::new(url, config.jwks_cache_ttl(), config.jwks_timeout())
            .map_err(|e| AppError::InternalError(format!("Failed to build key set client: {}", e)))?;

        Ok(Self::new(config, Arc::new(cache)))
    }

    /// 401 for any verification failure or a token without identity claims,
    /// 403 when a required scope/role is configured and missing.
    pub async fn verify(&self, token: &str) -> AppResult<Identity> {
        let claims = self.decode_claims(token).await.map_err(|reason| {
            log::warn!("Bearer token rejected: {}", reason);
            AppError::Unauthorized("invalid token".to_string())
        })?;

        let identity = Identity::from_claims(claims)
            .ok_or_else(|| AppError::Unauthorized("email/oid not found in token".to_string()))?;

        if let Some(required) = &self.required_scope {
            if !identity.has_scope_or_role(required) {
                log::warn!(
                    "Token for {:?} lacks required scope or role '{}'",
                    identity.object_id.as_ref().or(identity.email.as_ref()),
                    required
                );
                return Err(AppError::Forbidden("insufficient_scope_or_role".to_string()));
            }
        }

        Ok(identity)
    }

    async fn decode_claims(&self, token: &str) -> Result<Map<String, Value>, RejectReason> {
        let (Some(keys), Some(validation)) = (&self.keys, &self.validation) else {
            return Err(RejectReason::NotConfigured);
        };

        let header = decode_header(token)?;
        let kid = header.kid.ok_or(RejectReason::MissingKeyId)?;
        let key = keys.resolve(&kid).await?;

        let data = decode::<Map<String, Value>>(token, &key, validation)?;
        Ok(data.claims)
    }
}
