//! Bearer token cache with single-flight refresh.
//!
//! States: no token → (obtain) → valid → (expiry within the safety margin, or a
//! 401 from the service) → no token. Reads are lock-free through an
//! `ArcSwapOption`; only a refresh takes the async gate, and a caller that waited
//! on the gate while another caller refreshed reuses that result.

use super::credentials::ClientCredentials;
use crate::config::ClientConfig;
use crate::{Error, Result};
use arc_swap::ArcSwapOption;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// `expires_at` values below this are seconds, not milliseconds.
const SECONDS_THRESHOLD: u64 = 100_000_000_000;

/// An issued bearer token. Immutable; a refresh replaces the whole value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at_ms: u64,
    scope: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at_ms: u64, scope: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at_ms,
            scope: scope.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Expiry in milliseconds since the Unix epoch.
    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    pub fn expires_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.expires_at_ms)
    }

    /// Whether the token stays valid for longer than `margin`.
    pub fn is_usable(&self, margin: Duration) -> bool {
        now_ms().saturating_add(margin.as_millis() as u64) < self.expires_at_ms
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("expires_at_ms", &self.expires_at_ms)
            .field("scope", &self.scope)
            .finish()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Parse an OAuth answer into a credential, failing fast on anything unusable.
pub fn parse_token_response(body: &str, scope: &str) -> Result<Credential> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        Error::token_request(None, format!("Failed to parse token response: {}", e))
    })?;

    let token = json
        .get("access_token")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| Error::token_request(None, "Token response is missing 'access_token'"))?;

    let raw_expiry = match json.get("expires_at") {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .filter(|v| *v > 0)
    .ok_or_else(|| {
        Error::token_request(None, "Token response has a missing or unparseable 'expires_at'")
    })?;

    let expires_at_ms = if raw_expiry < SECONDS_THRESHOLD {
        raw_expiry.saturating_mul(1000)
    } else {
        raw_expiry
    };

    Ok(Credential::new(token, expires_at_ms, scope))
}

/// Supplies a valid [`Credential`] on demand.
///
/// Constructed once per client and shared by every request it makes.
pub struct TokenManager {
    http: reqwest::Client,
    auth_url: String,
    scope: String,
    credentials: ClientCredentials,
    safety_margin: Duration,
    current: ArcSwapOption<Credential>,
    refresh_gate: Mutex<()>,
    /// Incremented after every successful refresh.
    generation: AtomicU64,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, config: &ClientConfig, credentials: ClientCredentials) -> Self {
        Self {
            http,
            auth_url: config.auth_url.clone(),
            scope: config.scope.clone(),
            credentials,
            safety_margin: config.token_safety_margin(),
            current: ArcSwapOption::empty(),
            refresh_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Cached credential if it is still usable.
    pub fn cached(&self) -> Option<Arc<Credential>> {
        self.current
            .load_full()
            .filter(|c| c.is_usable(self.safety_margin))
    }

    /// Return the cached credential or obtain a new one.
    pub async fn get_token(&self) -> Result<Arc<Credential>> {
        if let Some(credential) = self.cached() {
            return Ok(credential);
        }

        let observed = self.generation.load(Ordering::Acquire);
        let _gate = self.refresh_gate.lock().await;

        // Someone refreshed while we waited for the gate: share their result.
        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(credential) = self.current.load_full() {
                return Ok(credential);
            }
        }
        if let Some(credential) = self.cached() {
            return Ok(credential);
        }

        let credential = Arc::new(self.request_token().await?);
        self.current.store(Some(Arc::clone(&credential)));
        self.generation.fetch_add(1, Ordering::AcqRel);
        info!(
            scope = %self.scope,
            expires_at_ms = credential.expires_at_ms(),
            "access token refreshed"
        );
        Ok(credential)
    }

    /// Drop `stale` after the service rejected it (HTTP 401).
    ///
    /// A credential that has already been replaced is left alone.
    pub fn invalidate(&self, stale: &Credential) {
        let current = self.current.load();
        if let Some(c) = &*current {
            if c.token() == stale.token() {
                warn!(scope = %self.scope, "access token rejected, dropping cached token");
                self.current.store(None);
            }
        }
    }

    /// Forget the cached credential unconditionally.
    pub fn clear(&self) {
        self.current.store(None);
    }

    async fn request_token(&self) -> Result<Credential> {
        let rq_uid = Uuid::new_v4().to_string();
        debug!(rq_uid = %rq_uid, url = %self.auth_url, "requesting access token");

        let response = self
            .http
            .post(&self.auth_url)
            .header(AUTHORIZATION, self.credentials.basic_header())
            .header("RqUID", &rq_uid)
            .header(ACCEPT, "application/json")
            .form(&[("scope", self.scope.as_str())])
            .send()
            .await
            .map_err(|e| Error::token_request(None, format!("Token request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::token_request(Some(status), format!("Failed to read token response: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(Error::token_request(Some(status), body));
        }

        parse_token_response(&body, &self.scope)
    }
}
