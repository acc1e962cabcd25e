//! Auth Middleware
//!
//! Gates protected routes behind session verification. The token is
//! read from the session cookie when present, else from the
//! `Authorization: Bearer` header. Verified claims are stored in the
//! request extensions for downstream handlers.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use std::sync::Arc;

use crate::application::VerifySessionUseCase;
use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct SessionGate {
    pub tokens: Arc<TokenService>,
    pub config: Arc<AuthConfig>,
}

/// Middleware that requires a valid session token
pub async fn require_session(
    State(gate): State<SessionGate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = match extract_token(req.headers(), &gate.config.session_cookie_name) {
        Some(token) => token,
        None => {
            tracing::warn!(path = %req.uri().path(), "Unauthorized access attempt");
            return Err(AuthError::Unauthorized.into_response());
        }
    };

    let use_case = VerifySessionUseCase::new(gate.tokens.clone());
    let claims = use_case
        .execute(&token, Utc::now())
        .map_err(|e| e.into_response())?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Token from the session cookie, falling back to the bearer header.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    platform::cookie::extract_cookie(headers, cookie_name).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.to_string())
    })
}
