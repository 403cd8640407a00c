//! Caller identity resolution.

use crate::{AuthMode, AuthSettings};
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use parley_error::{AuthenticationError, ConfigError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Authenticated user on whose behalf a request runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct UserId(String);

impl UserId {
    /// Wrap a resolved user id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolves the calling user from request headers.
pub trait IdentityResolver: Send + Sync {
    /// Resolve the caller, or fail with an authentication error.
    fn resolve(&self, headers: &HeaderMap) -> ParleyResult<UserId>;
}

/// Claims read from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Option<String>,
    /// Expiry as a Unix timestamp
    pub exp: Option<usize>,
}

/// Verifies `Authorization: Bearer <jwt>` tokens signed with HS256.
pub struct JwtIdentityResolver {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtIdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityResolver").finish_non_exhaustive()
    }
}

impl JwtIdentityResolver {
    /// Resolver verifying tokens against a shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityResolver for JwtIdentityResolver {
    fn resolve(&self, headers: &HeaderMap) -> ParleyResult<UserId> {
        let token = extract_bearer(headers.get(header::AUTHORIZATION))
            .ok_or_else(|| AuthenticationError::new("Missing bearer token"))?;

        let data = decode::<Claims>(&token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AuthenticationError::new("Invalid bearer token")
        })?;

        data.claims
            .sub
            .filter(|s| !s.trim().is_empty())
            .map(UserId::new)
            .ok_or_else(|| AuthenticationError::new("Bearer token has no subject").into())
    }
}

/// Trusts a user id header set by an upstream auth proxy.
#[derive(Debug, Clone)]
pub struct HeaderIdentityResolver {
    header: HeaderName,
}

impl HeaderIdentityResolver {
    /// Resolver reading the named header.
    pub fn new(header: &str) -> ParleyResult<Self> {
        let header = HeaderName::from_bytes(header.trim().as_bytes()).map_err(|e| {
            ConfigError {
                setting: Some("auth.user_header".to_string()),
                ..ConfigError::new(format!("Invalid header name '{}': {}", header, e))
            }
        })?;
        Ok(Self { header })
    }
}

impl IdentityResolver for HeaderIdentityResolver {
    fn resolve(&self, headers: &HeaderMap) -> ParleyResult<UserId> {
        headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(UserId::new)
            .ok_or_else(|| {
                AuthenticationError::new(format!("Missing {} header", self.header.as_str())).into()
            })
    }
}

/// Build the resolver the settings ask for.
pub fn resolver_from_settings(settings: &AuthSettings) -> ParleyResult<Arc<dyn IdentityResolver>> {
    match settings.mode {
        AuthMode::Jwt => {
            let secret = settings
                .jwt_secret
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| ConfigError::missing("auth.jwt_secret"))?;
            Ok(Arc::new(JwtIdentityResolver::new(secret)))
        }
        AuthMode::Header => Ok(Arc::new(HeaderIdentityResolver::new(&settings.user_header)?)),
    }
}

fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
