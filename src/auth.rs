//! Bearer credentials for outgoing GraphQL operations
//!
//! Provides:
//! - A [`TokenSource`] reading the token written by the login flow
//! - A [`CredentialCache`] bounding how often that source is read
//! - The `authorization` header value attached to every operation

use crate::storage::{load_json, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default age after which the cached token is re-read
pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_millis(5000);

/// Default storage key of the login payload
pub const DEFAULT_TOKEN_KEY: &str = "user";

/// Millisecond wall clock
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Where the current login token comes from
pub trait TokenSource: Send + Sync {
    /// Read the token, `None` when nobody is logged in
    fn read_token(&self) -> Option<String>;
}

/// Payload the login flow stores under the token key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Reads the token out of the persisted login payload
pub struct StoredTokenSource {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl StoredTokenSource {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

impl TokenSource for StoredTokenSource {
    fn read_token(&self) -> Option<String> {
        match load_json::<LoginPayload>(self.store.as_ref(), &self.key) {
            Ok(payload) => payload
                .and_then(|p| p.token)
                .filter(|token| !token.is_empty()),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "unreadable login payload");
                None
            }
        }
    }
}

/// Token snapshot held by [`CredentialCache`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCredential {
    pub token: Option<String>,
    pub fetched_at_epoch_millis: i64,
}

/// Short-lived in-memory cache in front of a [`TokenSource`]
///
/// The read-check-refresh sequence runs under one lock, so concurrent
/// callers never observe a credential older than the TTL and the source
/// is read at most once per TTL window.
pub struct CredentialCache {
    source: Arc<dyn TokenSource>,
    clock: Arc<dyn Clock>,
    ttl_millis: i64,
    state: Mutex<Option<CachedCredential>>,
}

impl CredentialCache {
    pub fn new(source: Arc<dyn TokenSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl_millis: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            state: Mutex::new(None),
        }
    }

    /// Cache with the system clock and the default TTL
    pub fn with_defaults(source: Arc<dyn TokenSource>) -> Self {
        Self::new(source, Arc::new(SystemClock), DEFAULT_CREDENTIAL_TTL)
    }

    /// Current credential, refreshed first when absent or expired
    pub async fn credential(&self) -> CachedCredential {
        let mut state = self.state.lock().await;
        let now = self.clock.now_millis();

        let expired = match state.as_ref() {
            Some(cached) => now - cached.fetched_at_epoch_millis > self.ttl_millis,
            None => true,
        };

        if expired {
            let token = self.source.read_token();
            tracing::debug!(has_token = token.is_some(), "refreshed cached credential");
            *state = Some(CachedCredential {
                token,
                fetched_at_epoch_millis: now,
            });
        }

        match state.as_ref() {
            Some(cached) => cached.clone(),
            None => CachedCredential {
                token: None,
                fetched_at_epoch_millis: now,
            },
        }
    }

    /// Value for the `authorization` header
    ///
    /// `"Bearer <token>"`, or the empty string when no token is stored.
    pub async fn auth_header(&self) -> String {
        bearer_header(self.credential().await.token.as_deref())
    }

    /// Drop the cached credential so the next call re-reads the source
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

/// Format a token as an `authorization` header value
pub fn bearer_header(token: Option<&str>) -> String {
    match token {
        Some(token) if !token.is_empty() => format!("Bearer {token}"),
        _ => String::new(),
    }
}

/// Extract the token from an `authorization` header value
pub fn strip_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}
