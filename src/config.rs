use std::{env, time::Duration};
use secrecy::SecretString;

const AZURE_LOGIN_HOST: &str = "https://login.microsoftonline.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub mongo_conn_string: SecretString,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub cors_allowed_origin: Option<String>,
    pub azure_tenant_id: Option<String>,
    pub azure_client_id: Option<String>,
    pub azure_app_id_uri: Option<String>,
    pub azure_required_scope: Option<String>,
    pub jwks_cache_ttl_secs: u64,
    pub jwks_timeout_secs: u64,
}

/// Reads a variable, treating an empty value the same as an unset one.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            environment: non_empty_var("APP_ENV").unwrap_or_else(|| "development".to_string()),
            mongo_conn_string: SecretString::from(
                non_empty_var("MONGO_CONN_STRING")
                    .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            ),
            mongo_db_name: non_empty_var("MONGO_DB_NAME")
                .unwrap_or_else(|| "surveys-local".to_string()),
            web_server_host: non_empty_var("WEB_SERVER_HOST")
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            web_server_port: non_empty_var("WEB_SERVER_PORT")
                .or_else(|| non_empty_var("PORT"))
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            cors_allowed_origin: non_empty_var("CORS_ALLOWED_ORIGIN"),
            azure_tenant_id: non_empty_var("AZURE_TENANT_ID"),
            azure_client_id: non_empty_var("AZURE_CLIENT_ID"),
            azure_app_id_uri: non_empty_var("AZURE_APP_ID_URI"),
            azure_required_scope: non_empty_var("AZURE_REQUIRED_SCOPE"),
            jwks_cache_ttl_secs: non_empty_var("JWKS_CACHE_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            jwks_timeout_secs: non_empty_var("JWKS_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Expected `iss` claim for tokens issued by the configured tenant.
    pub fn issuer(&self) -> Option<String> {
        self.azure_tenant_id
            .as_ref()
            .map(|tenant| format!("{}/{}/v2.0", AZURE_LOGIN_HOST, tenant))
    }

    /// The tenant's published signing key set. The issuer already ends in
    /// `/v2.0`, so the key path is built from the tenant directly.
    pub fn jwks_url(&self) -> Option<String> {
        self.azure_tenant_id
            .as_ref()
            .map(|tenant| format!("{}/{}/discovery/v2.0/keys", AZURE_LOGIN_HOST, tenant))
    }

    /// Audiences a token may be issued for: the client id and, when set, the App ID URI.
    pub fn audiences(&self) -> Vec<String> {
        [&self.azure_client_id, &self.azure_app_id_uri]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    pub fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout_secs)
    }

    /// Validate that production-critical configuration is set
    /// Panics if token validation could not work
    pub fn validate_for_production(&self) {
        if self.azure_tenant_id.is_none() {
            panic!(
                "FATAL: AZURE_TENANT_ID is not set! Bearer tokens cannot be validated without a tenant."
            );
        }

        if self.azure_client_id.is_none() {
            panic!(
                "FATAL: AZURE_CLIENT_ID is not set! Set AZURE_CLIENT_ID so token audiences can be checked."
            );
        }

        if self.jwks_timeout_secs == 0 {
            panic!("FATAL: JWKS_TIMEOUT_SECS must be greater than zero.");
        }
    }

    pub fn test_config() -> Self {
        Self {
            environment: "test".to_string(),
            mongo_conn_string: SecretString::from("mongodb://localhost:27017".to_string()),
            mongo_db_name: "surveys-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 4000,
            cors_allowed_origin: None,
            azure_tenant_id: Some("test-tenant".to_string()),
            azure_client_id: Some("test-client".to_string()),
            azure_app_id_uri: Some("api://test-client".to_string()),
            azure_required_scope: None,
            jwks_cache_ttl_secs: 60,
            jwks_timeout_secs: 1,
        }
    }
}
