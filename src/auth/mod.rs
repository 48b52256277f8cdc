//! Bearer-credential gate for paid endpoints.
//!
//! Auth precedes cost: every handler that spends quota or model credits
//! verifies the caller first, so an invalid token never consumes either.
//! Token validation itself is delegated to the identity provider's
//! introspection endpoint behind the `IdentityProvider` trait.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Authentication failures. Both map to HTTP 401.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or malformed authorization header")]
    MalformedHeader,
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// The verified caller.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
}

/// Token introspection backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate a bearer token and return the user id it belongs to.
    async fn introspect(&self, token: &str) -> Result<String, AuthError>;
}

/// Identity provider reached over HTTP (GET `{base_url}/auth/v1/user`).
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    id: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn introspect(&self, token: &str) -> Result<String, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| {
                debug!("identity provider unreachable: {}", e);
                AuthError::InvalidToken
            })?;

        if !resp.status().is_success() {
            debug!("identity provider rejected token: HTTP {}", resp.status());
            return Err(AuthError::InvalidToken);
        }

        let user: UserInfo = resp.json().await.map_err(|_| AuthError::InvalidToken)?;
        if user.id.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(user.id)
    }
}

/// Request-level authentication gate.
#[derive(Clone)]
pub struct AuthGate {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthGate {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Verify the `Authorization: Bearer <token>` header on a request.
    pub async fn verify(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MalformedHeader)?;

        let token = value
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedHeader)?;
        if token.is_empty() {
            return Err(AuthError::MalformedHeader);
        }

        let user_id = self.provider.introspect(token).await?;
        Ok(AuthContext { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    struct StubProvider {
        accept: &'static str,
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn introspect(&self, token: &str) -> Result<String, AuthError> {
            if token == self.accept {
                Ok("user-1".to_string())
            } else {
                Err(AuthError::InvalidToken)
            }
        }
    }

    fn gate() -> AuthGate {
        AuthGate::new(Arc::new(StubProvider { accept: "good" }))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_missing_header_is_malformed() {
        let err = gate().verify(&HeaderMap::new()).await.unwrap_err();
        assert_eq!(err, AuthError::MalformedHeader);
    }

    #[tokio::test]
    async fn test_wrong_scheme_is_malformed() {
        let err = gate()
            .verify(&headers_with("Basic dXNlcjpwYXNz"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::MalformedHeader);

        let err = gate().verify(&headers_with("Bearer ")).await.unwrap_err();
        assert_eq!(err, AuthError::MalformedHeader);
    }

    #[tokio::test]
    async fn test_provider_rejection_is_invalid_token() {
        let err = gate()
            .verify(&headers_with("Bearer expired"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn test_valid_token() {
        let ctx = gate().verify(&headers_with("Bearer good")).await.unwrap();
        assert_eq!(ctx.user_id, "user-1");
    }
}
