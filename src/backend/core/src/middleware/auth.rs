//! Authentication middleware: bearer credential -> [`Principal`].
//!
//! Features:
//! - JWT validation (HMAC) with issuer, audience and leeway checks
//! - Role tags resolved once into a [`RoleSet`]; unknown tags are dropped and logged
//! - Pluggable identity resolution through [`IdentityResolver`]
//! - Request principal injection for the permission gate and handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use salon_core::middleware::auth::{AuthConfig, AuthLayer, Authenticator};
//!
//! let config = AuthConfig::builder()
//!     .jwt_secret("your-secret-key")
//!     .build();
//!
//! let app = Router::new()
//!     .route("/me/permissions", get(my_permissions))
//!     .layer(AuthLayer::new(Arc::new(Authenticator::new(config)?)));
//! ```

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use thiserror::Error;
use tower::{Layer, Service};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ErrorCode, SalonError};
use crate::rbac::{Principal, RoleSet};

// ═══════════════════════════════════════════════════════════════════════════════
// Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication errors.
///
/// A credential that fails to resolve is recorded in the request extensions
/// rather than answered immediately, so it only surfaces on routes that
/// require a principal.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Missing authentication credentials")]
    MissingCredentials,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    fn metric_label(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidToken => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<AuthError> for SalonError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MissingCredentials => {
                SalonError::new(ErrorCode::Unauthorized, "Authentication credentials are required")
            }
            AuthError::InvalidToken => {
                SalonError::new(ErrorCode::InvalidToken, "The provided token is invalid")
            }
            AuthError::TokenExpired => SalonError::new(
                ErrorCode::TokenExpired,
                "The authentication token has expired",
            ),
            AuthError::Internal(message) => SalonError::internal(message),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        counter!("salon_auth_failures_total", "reason" => self.metric_label()).increment(1);
        SalonError::from(self).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JWT Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// The `roles` claim: a JSON array of tags, or one delimited string such as
/// `"customer,businessOwner"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RolesClaim {
    List(Vec<String>),
    Delimited(String),
}

impl RolesClaim {
    /// Raw tags in claim order.
    pub fn tags(&self) -> Vec<&str> {
        match self {
            Self::List(tags) => tags.iter().map(String::as_str).collect(),
            Self::Delimited(joined) => joined.split(',').collect(),
        }
    }
}

impl Default for RolesClaim {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// JWT token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id (a UUID).
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub roles: RolesClaim,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Expiration (Unix seconds).
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Token id.
    pub jti: String,
}

impl Claims {
    pub fn builder(user_id: Uuid) -> ClaimsBuilder {
        ClaimsBuilder::new(user_id)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Resolve the claims into a principal. Fails only when `sub` is not a UUID.
    pub fn into_principal(self) -> Result<Principal, AuthError> {
        let user_id = Uuid::parse_str(&self.sub).map_err(|_| {
            debug!(sub = %self.sub, "Token subject is not a UUID");
            AuthError::InvalidToken
        })?;

        let (roles, unknown) = RoleSet::from_tags(self.roles.tags());
        if !unknown.is_empty() {
            warn!(
                user_id = %user_id,
                unknown_roles = ?unknown,
                "Ignoring unknown role tags in token"
            );
        }

        Ok(Principal::new(user_id, roles))
    }
}

/// Builder for JWT claims.
pub struct ClaimsBuilder {
    claims: Claims,
}

impl ClaimsBuilder {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            claims: Claims {
                sub: user_id.to_string(),
                name: None,
                roles: RolesClaim::default(),
                iat: now.timestamp(),
                exp: (now + Duration::hours(1)).timestamp(),
                iss: None,
                aud: None,
                jti: Uuid::new_v4().to_string(),
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.claims.name = Some(name.into());
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims.roles = RolesClaim::List(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Encode the roles as one comma-separated string.
    pub fn delimited_roles(mut self, joined: impl Into<String>) -> Self {
        self.claims.roles = RolesClaim::Delimited(joined.into());
        self
    }

    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.claims.exp = (Utc::now() + duration).timestamp();
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.claims.iss = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.claims.aud = Some(audience.into());
        self
    }

    pub fn build(self) -> Claims {
        self.claims
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret.
    pub jwt_secret: Option<String>,

    /// HS256, HS384 or HS512.
    pub jwt_algorithm: Algorithm,

    pub issuer: Option<String>,

    pub audience: Option<String>,

    /// Clock skew tolerance (seconds).
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_algorithm: Algorithm::HS256,
            issuer: None,
            audience: None,
            leeway_secs: 60,
        }
    }
}

impl AuthConfig {
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct AuthConfigBuilder {
    config: AuthConfig,
}

impl AuthConfigBuilder {
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = Some(secret.into());
        self
    }

    pub fn jwt_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.jwt_algorithm = algorithm;
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.config.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.config.audience = Some(audience.into());
        self
    }

    pub fn leeway_secs(mut self, secs: u64) -> Self {
        self.config.leeway_secs = secs;
        self
    }

    pub fn build(self) -> AuthConfig {
        self.config
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Identity Resolution
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves a bearer credential into a principal.
#[async_trait::async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Principal, AuthError>;
}

/// JWT-backed [`IdentityResolver`].
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        if !matches!(
            config.jwt_algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::Internal(format!(
                "Unsupported JWT algorithm: {:?}",
                config.jwt_algorithm
            )));
        }

        let secret = config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::Internal("JWT secret required for HMAC algorithms".into()))?;

        let mut validation = Validation::new(config.jwt_algorithm);
        validation.leeway = config.leeway_secs;

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        match config.audience {
            Some(ref audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: config.jwt_algorithm,
            validation,
        })
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })
    }

    /// Generate a signed token for the given claims.
    pub fn generate_token(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to encode token: {}", e)))
    }
}

#[async_trait::async_trait]
impl IdentityResolver for Authenticator {
    async fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        self.validate(token)?.into_principal()
    }
}

/// Extract a bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer ")))
        .map(str::trim)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication layer.
///
/// A request without credentials passes through with no principal attached;
/// the permission gate decides whether that is acceptable. A request with a
/// credential that fails to resolve is rejected here with 401.
#[derive(Clone)]
pub struct AuthLayer {
    resolver: Arc<dyn IdentityResolver>,
}

impl AuthLayer {
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            resolver: self.resolver.clone(),
        }
    }
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    resolver: Arc<dyn IdentityResolver>,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let resolver = self.resolver.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let token = bearer_token(request.headers()).map(str::to_owned);

            if let Some(token) = token {
                match resolver.resolve(&token).await {
                    Ok(principal) => {
                        debug!(user_id = %principal.user_id, roles = %principal.roles, "Authenticated");
                        request.extensions_mut().insert(principal);
                    }
                    Err(e) => {
                        debug!(reason = e.metric_label(), "Bearer credential rejected");
                        request.extensions_mut().insert(e);
                    }
                }
            }

            inner.call(request).await
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Extractor
// ═══════════════════════════════════════════════════════════════════════════════

/// Extractor for the authenticated principal in handlers. Rejects with 401,
/// reporting why a presented credential was refused.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }
        Err(parts
            .extensions
            .get::<AuthError>()
            .cloned()
            .unwrap_or(AuthError::MissingCredentials))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
