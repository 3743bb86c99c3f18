//! Identity provider interface and the hosted-auth HTTP implementation.
//!
//! DESIGN
//! ======
//! The hosted auth service owns sessions; we only ever hold a borrowed copy.
//! `HttpIdentityProvider` talks to a GoTrue-style REST API: password grant for
//! sign-in, refresh-token grant for startup restore, bearer endpoints for
//! profile reads and sign-out.

use async_trait::async_trait;
use uuid::Uuid;

/// Stable subset of the provider session used for role resolution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Identity {
    /// Provider-issued stable user id.
    pub id: Uuid,
    /// Sign-in email.
    pub email: String,
    /// Free-form profile metadata, when the provider has it.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Borrowed view of the provider's session. Refreshed on every change event.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub access_token: String,
    pub identity: Identity,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("too many sign-in attempts, try again later")]
    RateLimited,
    #[error("auth provider error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Network(String),
}

/// External identity provider. Implemented over HTTP in production and by
/// in-memory fakes in tests.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError>;

    /// Restore a previously issued session, if the provider has one for us.
    async fn get_session(&self) -> Result<Option<ProviderSession>, AuthError>;

    /// Re-read the profile behind an access token.
    async fn get_current_user(&self, access_token: &str) -> Result<Identity, AuthError>;

    /// Invalidate the session server-side. Best-effort for callers.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

/// Hosted auth configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct AuthProviderConfig {
    /// Base URL of the auth API, e.g. `https://xyz.example.co/auth/v1`.
    pub base_url: String,
    /// Project API key sent with every request.
    pub api_key: String,
    /// Refresh token used to restore the operator session at startup.
    pub refresh_token: Option<String>,
}

impl AuthProviderConfig {
    /// Load from `AUTH_URL`, `AUTH_API_KEY`, and optional `AUTH_REFRESH_TOKEN`.
    /// Returns `None` if the required variables are missing.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("AUTH_URL").ok()?;
        let api_key = std::env::var("AUTH_API_KEY").ok()?;
        let refresh_token = std::env::var("AUTH_REFRESH_TOKEN").ok();
        Some(Self { base_url, api_key, refresh_token })
    }
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserPayload,
}

#[derive(Debug, serde::Deserialize)]
struct UserPayload {
    id: Uuid,
    email: String,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl UserPayload {
    fn into_identity(self) -> Identity {
        let meta_str = |key: &str| {
            self.user_metadata
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_owned)
        };
        let first_name = meta_str("first_name");
        let last_name = meta_str("last_name");
        Identity { id: self.id, email: self.email, first_name, last_name }
    }
}

pub struct HttpIdentityProvider {
    config: AuthProviderConfig,
    client: reqwest::Client,
}

impl HttpIdentityProvider {
    #[must_use]
    pub fn new(config: AuthProviderConfig) -> Self {
        Self { config, client: reqwest::Client::new() }
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<ProviderSession, AuthError> {
        let url = format!("{}/token?grant_type={grant_type}", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AuthError::RateLimited);
        }
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!("{status}: {body}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("unexpected token response: {e}")))?;
        Ok(ProviderSession { access_token: token.access_token, identity: token.user.into_identity() })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError> {
        self.token_grant("password", serde_json::json!({ "email": email, "password": password }))
            .await
    }

    async fn get_session(&self) -> Result<Option<ProviderSession>, AuthError> {
        let Some(refresh_token) = &self.config.refresh_token else {
            return Ok(None);
        };
        match self
            .token_grant("refresh_token", serde_json::json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(session) => Ok(Some(session)),
            // EDGE: a revoked or expired refresh token means "no session", not
            // a startup failure.
            Err(AuthError::InvalidCredentials) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_current_user(&self, access_token: &str) -> Result<Identity, AuthError> {
        let url = format!("{}/user", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!("{status}: {body}")));
        }

        let user: UserPayload = resp
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("unexpected user response: {e}")))?;
        Ok(user.into_identity())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/logout", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(AuthError::Provider(status.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;
