//! Verify Session Use Case
//!
//! Checks a bearer token and returns its embedded claims. Pure and
//! side-effect-free; gates every protected operation. Expired and
//! malformed tokens are told apart in the log only; the caller sees
//! one generic unauthorized error for both.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::token::{SessionClaims, TokenError, TokenService};
use crate::error::{AuthError, AuthResult};

/// Verify session use case
pub struct VerifySessionUseCase {
    tokens: Arc<TokenService>,
}

impl VerifySessionUseCase {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Verify a token at `now` and return its claims.
    pub fn execute(&self, token: &str, now: DateTime<Utc>) -> AuthResult<SessionClaims> {
        match self.tokens.verify(token, now) {
            Ok(claims) => Ok(claims),
            Err(TokenError::Expired) => {
                tracing::warn!("Session token expired");
                Err(AuthError::Unauthorized)
            }
            Err(TokenError::Malformed) => {
                tracing::warn!("Malformed session token");
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// Just check whether a token is currently valid.
    pub fn is_valid(&self, token: &str) -> bool {
        self.tokens.verify(token, Utc::now()).is_ok()
    }
}
