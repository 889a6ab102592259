use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use jsonwebtoken::{jwk::JwkSet, DecodingKey};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// An unknown `kid` triggers at most one refetch per this interval, and a failed
/// fetch is not retried within it either.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("failed to fetch key set: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("failed to parse key set: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no signing key with kid '{0}'")]
    UnknownKey(String),

    #[error("key set unavailable after a recent failed fetch: {0}")]
    Unavailable(String),
}

/// Source of token signing keys, looked up by key id.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, JwksError>;
}

/// Usable keys of a set, by `kid`. Keys without an id, or of a type that
/// cannot verify signatures, are skipped.
pub fn decoding_keys(set: &JwkSet) -> HashMap<String, DecodingKey> {
    set.keys
        .iter()
        .filter_map(|jwk| {
            let kid = jwk.common.key_id.clone()?;
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => Some((kid, key)),
                Err(e) => {
                    log::debug!("Skipping unusable key '{}': {}", kid, e);
                    None
                }
            }
        })
        .collect()
}

#[derive(Default)]
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
    last_failure: Option<(Instant, String)>,
}

impl CachedKeys {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at
            .map(|at| at.elapsed() < ttl)
            .unwrap_or(false)
    }

    fn lookup(&self, kid: &str, ttl: Duration) -> Option<DecodingKey> {
        if !self.is_fresh(ttl) {
            return None;
        }
        self.keys.get(kid).cloned()
    }

    fn fetched_within(&self, interval: Duration) -> bool {
        self.fetched_at
            .map(|at| at.elapsed() < interval)
            .unwrap_or(false)
    }

    /// The error of a fetch that failed within `interval`, if any.
    fn recent_failure(&self, interval: Duration) -> Option<JwksError> {
        self.last_failure
            .as_ref()
            .filter(|(at, _)| at.elapsed() < interval)
            .map(|(_, reason)| JwksError::Unavailable(reason.clone()))
    }
}

/// Remote key set with a time-bounded cache. A key id that is not cached (key
/// rotation) or an expired cache causes a refetch; concurrent misses share one
/// fetch. Every fetch is bounded by the HTTP timeout and fails closed, and a
/// failure is remembered so waiting requests do not each fetch again.
pub struct JwksCache {
    url: String,
    http: reqwest::Client,
    ttl: Duration,
    state: RwLock<CachedKeys>,
    refresh: Mutex<()>,
}

impl JwksCache {
    pub fn new(url: impl Into<String>, ttl: Duration, timeout: Duration) -> Result<Self, JwksError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: url.into(),
            http,
            ttl,
            state: RwLock::new(CachedKeys::default()),
            refresh: Mutex::new(()),
        })
    }

    async fn fetch(&self) -> Result<HashMap<String, DecodingKey>, JwksError> {
        log::debug!("Fetching signing keys from {}", self.url);

        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let set: JwkSet = serde_json::from_str(&body)?;

        let keys = decoding_keys(&set);
        log::info!("Loaded {} signing key(s) from {}", keys.len(), self.url);
        Ok(keys)
    }
}

#[async_trait]
impl KeyResolver for JwksCache {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        {
            let state = self.state.read().await;
            if let Some(key) = state.lookup(kid, self.ttl) {
                return Ok(key);
            }
            if let Some(err) = state.recent_failure(MIN_REFRESH_INTERVAL) {
                return Err(err);
            }
        }

        let _refreshing = self.refresh.lock().await;

        {
            // another task may have fetched, or failed to, while we waited
            let state = self.state.read().await;
            if let Some(key) = state.lookup(kid, self.ttl) {
                return Ok(key);
            }
            if let Some(err) = state.recent_failure(MIN_REFRESH_INTERVAL) {
                return Err(err);
            }
            if state.is_fresh(self.ttl) && state.fetched_within(MIN_REFRESH_INTERVAL) {
                return Err(JwksError::UnknownKey(kid.to_string()));
            }
        }

        let keys = match self.fetch().await {
            Ok(keys) => keys,
            Err(err) => {
                log::warn!("Signing key fetch from {} failed: {}", self.url, err);
                self.state.write().await.last_failure = Some((Instant::now(), err.to_string()));
                return Err(err);
            }
        };

        let mut state = self.state.write().await;
        state.keys = keys;
        state.fetched_at = Some(Instant::now());
        state.last_failure = None;
        state
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| JwksError::UnknownKey(kid.to_string()))
    }
}

/// Fixed key set, for tests and offline deployments.
pub struct StaticKeys {
    keys: HashMap<String, DecodingKey>,
}

impl StaticKeys {
    pub fn new(set: &JwkSet) -> Self {
        Self {
            keys: decoding_keys(set),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, JwksError> {
        let set: JwkSet = serde_json::from_str(raw)?;
        Ok(Self::new(&set))
    }

}

#[async_trait]
impl KeyResolver for StaticKeys {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, JwksError> {
        self.keys
            .get(kid)
            .cloned()
            .ok_or_else(|| JwksError::UnknownKey(kid.to_string()))
    }
}
