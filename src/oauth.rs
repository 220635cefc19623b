// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Credential Store
//!
//! Single source of truth for the Oura bearer token. Owns the OAuth2
//! refresh-token exchange and the persistence of rotated tokens through a
//! caller-supplied [`TokenSink`].
//!
//! Refresh tokens are single-use: the store serializes refresh attempts
//! behind an internal lock, and a caller that arrives after another caller
//! already rotated the token gets the fresh token without a second
//! exchange.

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::constants::{endpoints, limits, oauth};
use crate::errors::{ApiError, ProblemDetails};
use crate::logging::AppLogger;

/// Authorization URL the user visits to grant this application access.
/// The code delivered to `redirect_uri` is then exchanged for the initial
/// token pair out of band.
pub fn authorization_url(client_id: &str, redirect_uri: &str, state: &str) -> Result<String> {
    let url = url::Url::parse_with_params(
        endpoints::OURA_AUTH_URL,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("scope", oauth::OURA_DEFAULT_SCOPES),
            ("state", state),
        ],
    )?;
    Ok(url.into())
}

/// Persistence sink invoked with the new token pair after a successful
/// refresh. The storage format (token file, keychain, database) is the
/// implementor's concern; see `config::FileTokenSink` for the default.
#[async_trait]
pub trait TokenSink: Send + Sync {
    async fn save(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()>;
}

/// OAuth2 credential set loaded at startup.
///
/// `refresh_token`, `client_id` and `client_secret` are only needed for
/// token refresh; with just an access token the store operates in static
/// token mode and any auth failure is terminal.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Credentials {
    /// Personal-access-token mode: no refresh capability.
    pub fn static_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            client_id: None,
            client_secret: None,
        }
    }

    fn refreshable(&self) -> bool {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.is_empty())
        }
        present(&self.refresh_token) && present(&self.client_id) && present(&self.client_secret)
    }
}

/// Successful token-endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
    #[allow(dead_code)]
    expires_in: Option<u64>,
    refresh_token: Option<String>,
}

/// Owns the in-memory token pair and the refresh protocol.
///
/// Constructed once at startup and shared by reference; no other
/// component mutates the credentials.
pub struct CredentialStore {
    credentials: RwLock<Credentials>,
    refresh_lock: Mutex<()>,
    sink: Option<Box<dyn TokenSink>>,
    http: Client,
    token_url: String,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(credentials: Credentials, sink: Option<Box<dyn TokenSink>>) -> Result<Self> {
        if credentials.access_token.is_empty() {
            bail!(
                "no access token available; set OURA_ACCESS_TOKEN or authenticate via OAuth"
            );
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(limits::HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            credentials: RwLock::new(credentials),
            refresh_lock: Mutex::new(()),
            sink,
            http,
            token_url: crate::constants::env_config::oura_token_url(),
        })
    }

    /// Override the token endpoint (tests point this at a mock server).
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Current in-memory access token. Never performs I/O.
    pub async fn current_access_token(&self) -> String {
        self.credentials.read().await.access_token.clone()
    }

    /// True iff refresh token and both client credentials are configured.
    pub async fn can_refresh(&self) -> bool {
        self.credentials.read().await.refreshable()
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// `observed_token` is the access token the caller saw the 401 with.
    /// If the stored token has already moved past it, another caller won
    /// the race and this call returns without a second exchange.
    ///
    /// On success the new pair replaces the in-memory credentials and the
    /// sink is invoked before returning. On any failure the previous
    /// credentials are left untouched.
    pub async fn refresh(&self, observed_token: &str) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        let (refresh_token, client_id, client_secret) = {
            let creds = self.credentials.read().await;
            if creds.access_token != observed_token {
                debug!("Token already rotated by a concurrent refresh, skipping exchange");
                return Ok(());
            }
            if !creds.refreshable() {
                return Err(ApiError::Auth {
                    detail: "token refresh unavailable: OURA_REFRESH_TOKEN, OURA_CLIENT_ID \
                             and OURA_CLIENT_SECRET must all be configured"
                        .to_string(),
                });
            }
            (
                creds.refresh_token.clone().unwrap_or_default(),
                creds.client_id.clone().unwrap_or_default(),
                creds.client_secret.clone().unwrap_or_default(),
            )
        };

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ApiError::Auth {
                detail: format!("token refresh request failed: {e}"),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Auth {
            detail: format!("token refresh response unreadable: {e}"),
        })?;

        if !status.is_success() {
            let detail = ProblemDetails::parse(&body)
                .map(|p| p.message())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            AppLogger::log_oauth_event("token_refresh", false);
            return Err(ApiError::Auth {
                detail: format!("token refresh rejected: {detail}"),
            });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| ApiError::Auth {
            detail: format!("malformed token response: {e}"),
        })?;

        let (new_access, new_refresh) = {
            let mut creds = self.credentials.write().await;
            creds.access_token = token.access_token;
            if token.refresh_token.is_some() {
                creds.refresh_token = token.refresh_token;
            }
            (creds.access_token.clone(), creds.refresh_token.clone())
        };

        if let Some(sink) = &self.sink {
            // Tokens stay usable in memory even if persistence fails
            if let Err(e) = sink.save(&new_access, new_refresh.as_deref()).await {
                warn!("Could not persist refreshed tokens: {e}");
            }
        }

        AppLogger::log_oauth_event("token_refresh", true);
        info!("Access token refreshed");
        Ok(())
    }
}
