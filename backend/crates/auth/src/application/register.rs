//! Register Use Case
//!
//! Creates a new identity. The registration limiter is keyed by source
//! address to blunt mass account creation; the gate runs before any
//! other work so a limited caller learns nothing from side effects.

use std::net::IpAddr;
use std::sync::Arc;

use platform::password::PasswordHasher;
use platform::rate_limit::FixedWindowLimiter;

use crate::application::config::AuthConfig;
use crate::application::validate::validate_credentials;
use crate::domain::repository::CredentialStore;
use crate::error::{AuthError, AuthResult};
use kernel::id::IdentityId;

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

/// Register output
#[derive(Debug)]
pub struct RegisterOutput {
    pub identity_id: IdentityId,
}

/// Register use case
pub struct RegisterUseCase<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    hasher: Arc<PasswordHasher>,
    limiter: Arc<FixedWindowLimiter>,
    config: Arc<AuthConfig>,
}

impl<S> RegisterUseCase<S>
where
    S: CredentialStore,
{
    pub fn new(
        store: Arc<S>,
        hasher: Arc<PasswordHasher>,
        limiter: Arc<FixedWindowLimiter>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            store,
            hasher,
            limiter,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: RegisterInput,
        source: Option<IpAddr>,
    ) -> AuthResult<RegisterOutput> {
        if !self.config.rate_limit_disabled {
            let decision = self.limiter.check_and_increment(&registration_key(source));
            if !decision.allowed {
                return Err(AuthError::RateLimited {
                    retry_after_secs: decision.retry_after.map(|d| d.as_secs()),
                });
            }
        }

        let (email, password) = validate_credentials(&input.email, input.password, &self.config)
            .map_err(AuthError::Validation)?;

        // Early exit; the store's unique index remains the authoritative
        // guard against a concurrent registration winning the race.
        if self.store.find_by_email(&email).await?.is_some() {
            tracing::warn!(email = %email, "Registration attempt with existing email");
            return Err(AuthError::IdentityExists);
        }

        // Argon2id is deliberately expensive; keep it off the async
        // executor threads.
        let hasher = Arc::clone(&self.hasher);
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {e}")))?
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let identity_id = self.store.create(&email, &password_hash).await?;

        tracing::info!(
            identity_id = %identity_id,
            email = %email,
            "User registered"
        );

        Ok(RegisterOutput { identity_id })
    }
}

/// Registration attempts are bucketed per source address.
fn registration_key(source: Option<IpAddr>) -> String {
    match source {
        Some(ip) => format!("register:{ip}"),
        None => "register:unknown".to_string(),
    }
}
