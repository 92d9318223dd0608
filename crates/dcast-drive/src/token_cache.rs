//! Token caching for Drive authentication.
//!
//! Provides a thread-safe, async-aware token cache with:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight pattern to prevent thundering herd on refresh
//! - Graceful fallback to existing valid token on refresh failure

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{DriveError, DriveResult};

// =============================================================================
// Constants
// =============================================================================

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when expiry is unknown (50 minutes).
/// OAuth tokens are typically valid for 60 minutes.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

// =============================================================================
// Token Cache
// =============================================================================

/// OAuth client credentials for the refresh-token grant.
#[derive(Debug, Clone)]
pub struct OauthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Token endpoint, normally `https://oauth2.googleapis.com/token`.
    pub token_url: String,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Check if token is still valid with refresh margin.
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Check if token is technically still usable (even if refresh is needed).
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    http: Client,
    credentials: OauthCredentials,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a new token cache.
    pub fn new(http: Client, credentials: OauthCredentials) -> Self {
        Self {
            http,
            credentials,
            cache: RwLock::new(None),
        }
    }

    /// Invalidate the cached token.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    ///
    /// This method implements the single-flight pattern:
    /// - Fast path: return cached token if still valid
    /// - Slow path: acquire write lock and refresh (double-check first)
    /// - Fallback: on refresh failure, use existing token if still usable
    pub async fn get_token(&self) -> DriveResult<String> {
        // Fast path: check read lock first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        // Slow path: acquire write lock and refresh
        let mut cache = self.cache.write().await;

        // Double-check: another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        // Attempt refresh
        self.refresh_token(&mut cache).await
    }

    /// Exchange the refresh token for an access token, updating the cache.
    async fn refresh_token(&self, cache: &mut Option<CachedToken>) -> DriveResult<String> {
        let refresh_result = self.request_access_token().await;

        match refresh_result {
            Ok(token) => {
                let expires_at = match token.expires_in {
                    Some(secs) if secs > 0 => Instant::now() + Duration::from_secs(secs),
                    _ => Instant::now() + TOKEN_DEFAULT_TTL,
                };

                *cache = Some(CachedToken {
                    access_token: token.access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed Drive access token");
                Ok(token.access_token)
            }
            Err(e) => {
                // On refresh failure, check if existing token is still usable
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }

                // No valid token available
                Err(DriveError::auth_error(format!(
                    "Failed to obtain access token: {}",
                    e
                )))
            }
        }
    }

    async fn request_access_token(&self) -> DriveResult<TokenResponse> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.credentials.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::auth_error(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_credentials(token_url: String) -> OauthCredentials {
        OauthCredentials {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            refresh_token: "refresh-token".to_string(),
            token_url,
        }
    }

    #[test]
    fn test_token_refresh_margin() {
        assert_eq!(TOKEN_REFRESH_MARGIN, Duration::from_secs(60));
    }

    #[test]
    fn test_token_default_ttl() {
        assert_eq!(TOKEN_DEFAULT_TTL, Duration::from_secs(50 * 60));
    }

    #[tokio::test]
    async fn test_token_is_cached_between_calls() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.cached",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cache = TokenCache::new(
            Client::new(),
            test_credentials(format!("{}/token", server.uri())),
        );

        let first = cache.get_token().await.unwrap();
        let second = cache.get_token().await.unwrap();
        assert_eq!(first, "ya29.cached");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.fresh",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let cache = TokenCache::new(
            Client::new(),
            test_credentials(format!("{}/token", server.uri())),
        );

        cache.get_token().await.unwrap();
        cache.invalidate().await;
        cache.get_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let cache = TokenCache::new(
            Client::new(),
            test_credentials(format!("{}/token", server.uri())),
        );

        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, DriveError::AuthError(_)));
    }
}
