//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use platform::client::extract_client_ip;
use platform::password::PasswordHasher;
use platform::rate_limit::FixedWindowLimiter;

use crate::application::config::{AuthConfig, ConfigError};
use crate::application::token::{SessionClaims, TokenService};
use crate::application::{
    LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
};
use crate::domain::repository::CredentialStore;
use crate::error::AuthResult;
use crate::presentation::dto::{
    IdentityDto, LoginRequest, LoginResponse, MeResponse, MessageResponse, RegisterRequest,
    RegisterResponse,
};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<S>
where
    S: CredentialStore + Clone + Send + Sync + 'static,
{
    pub store: Arc<S>,
    pub config: Arc<AuthConfig>,
    pub hasher: Arc<PasswordHasher>,
    pub tokens: Arc<TokenService>,
    pub login_limiter: Arc<FixedWindowLimiter>,
    pub register_limiter: Arc<FixedWindowLimiter>,
}

impl<S> AuthAppState<S>
where
    S: CredentialStore + Clone + Send + Sync + 'static,
{
    /// Validate the configuration and build every component from it.
    pub fn new(store: S, config: AuthConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let hasher = PasswordHasher::new(&config.hashing)?;
        let tokens = TokenService::from_config(&config);
        let login_limiter = FixedWindowLimiter::new(config.login_limit);
        let register_limiter = FixedWindowLimiter::new(config.register_limit);

        Ok(Self {
            store: Arc::new(store),
            config: Arc::new(config),
            hasher: Arc::new(hasher),
            tokens: Arc::new(tokens),
            login_limiter: Arc::new(login_limiter),
            register_limiter: Arc::new(register_limiter),
        })
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/auth/register
pub async fn register<S>(
    State(state): State<AuthAppState<S>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: CredentialStore + Clone + Send + Sync + 'static,
{
    let source = extract_client_ip(&headers, Some(addr.ip()));

    let use_case = RegisterUseCase::new(
        state.store.clone(),
        state.hasher.clone(),
        state.register_limiter.clone(),
        state.config.clone(),
    );

    let input = RegisterInput {
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input, source).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User successfully registered".to_string(),
            user_id: output.identity_id.as_i64(),
        }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<S>(
    State(state): State<AuthAppState<S>>,
    headers: HeaderMap,
    axum::extract::ConnectInfo(addr): axum::extract::ConnectInfo<std::net::SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    S: CredentialStore + Clone + Send + Sync + 'static,
{
    let source = extract_client_ip(&headers, Some(addr.ip()));

    let use_case = LoginUseCase::new(
        state.store.clone(),
        state.tokens.clone(),
        state.login_limiter.clone(),
        state.config.clone(),
    );

    let input = LoginInput {
        email: req.email,
        password: req.password,
    };

    let output = use_case.execute(input, source).await?;

    // Token travels both in the body and as an HttpOnly cookie whose
    // lifetime matches the token TTL
    let cookie = state.config.cookie_config().build_set_cookie(&output.token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            message: "Successfully logged in".to_string(),
            token: output.token,
            expires_at_ms: output.expires_at_ms,
            identity: IdentityDto {
                id: output.identity_id.as_i64(),
                email: output.email.into_db(),
            },
        }),
    ))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
///
/// Tokens are stateless, so this cannot invalidate a copy the client
/// keeps; it clears the cookie and the client discards the token.
pub async fn logout<S>(
    State(state): State<AuthAppState<S>>,
    axum::extract::Extension(claims): axum::extract::Extension<SessionClaims>,
) -> AuthResult<impl IntoResponse>
where
    S: CredentialStore + Clone + Send + Sync + 'static,
{
    let cookie = state.config.cookie_config().build_delete_cookie();

    tracing::info!(
        identity_id = claims.id,
        email = %claims.email,
        "User logged out"
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

// ============================================================================
// Current identity
// ============================================================================

/// GET /api/auth/me
pub async fn me(
    axum::extract::Extension(claims): axum::extract::Extension<SessionClaims>,
) -> AuthResult<Json<MeResponse>> {
    Ok(Json(MeResponse {
        identity: IdentityDto {
            id: claims.id,
            email: claims.email,
        },
    }))
}
