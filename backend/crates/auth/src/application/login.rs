//! Login Use Case
//!
//! Authenticates an identity and issues a session token. The limiter is
//! keyed by the submitted email when it parses (punishing targeted
//! attacks on one account), falling back to the source address. The
//! counter moves on every attempt, success or failure, and once the
//! limit trips the credential check does not run at all.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use platform::crypto::{sha256, to_base64};
use platform::rate_limit::FixedWindowLimiter;

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::application::validate::validate_credentials;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};
use kernel::id::IdentityId;

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login output
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed session token
    pub token: String,
    /// Expiry recorded in the token
    pub expires_at_ms: i64,
    /// Public identity view
    pub identity_id: IdentityId,
    pub email: Email,
}

/// Login use case
pub struct LoginUseCase<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    tokens: Arc<TokenService>,
    limiter: Arc<FixedWindowLimiter>,
    config: Arc<AuthConfig>,
}

impl<S> LoginUseCase<S>
where
    S: CredentialStore,
{
    pub fn new(
        store: Arc<S>,
        tokens: Arc<TokenService>,
        limiter: Arc<FixedWindowLimiter>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            store,
            tokens,
            limiter,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: LoginInput,
        source: Option<IpAddr>,
    ) -> AuthResult<LoginOutput> {
        if !self.config.rate_limit_disabled {
            let decision = self
                .limiter
                .check_and_increment(&login_key(&input.email, source));
            if !decision.allowed {
                return Err(AuthError::RateLimited {
                    retry_after_secs: decision.retry_after.map(|d| d.as_secs()),
                });
            }
        }

        let (email, password) = validate_credentials(&input.email, input.password, &self.config)
            .map_err(AuthError::Validation)?;

        // Unknown email and wrong password fall through to the same
        // error; nothing in the response distinguishes them.
        let identity = match self.store.find_by_email(&email).await? {
            Some(identity) => identity,
            None => {
                tracing::warn!(email = %email, "Login attempt with unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let password_hash = identity.password_hash.clone();
        let password_valid = tokio::task::spawn_blocking(move || password_hash.verify(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {e}")))?;

        if !password_valid {
            tracing::warn!(email = %email, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.tokens.issue(identity.id, &identity.email, Utc::now());

        tracing::info!(
            identity_id = %identity.id,
            email = %identity.email,
            "User logged in"
        );

        Ok(LoginOutput {
            token: issued.token,
            expires_at_ms: issued.expires_at_ms,
            identity_id: identity.id,
            email: identity.email,
        })
    }
}

/// Login attempts are bucketed by the submitted identity when it parses
/// as an email, else by source address. The email is digested so the
/// window table never stores attacker-chosen strings verbatim.
fn login_key(raw_email: &str, source: Option<IpAddr>) -> String {
    match Email::new(raw_email) {
        Ok(email) => format!("login:{}", to_base64(&sha256(email.as_str().as_bytes()))),
        Err(_) => match source {
            Some(ip) => format!("login:ip:{ip}"),
            None => "login:ip:unknown".to_string(),
        },
    }
}
