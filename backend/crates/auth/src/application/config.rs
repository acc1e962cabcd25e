//! Application Configuration
//!
//! Configuration for the Auth application layer. Validated once at
//! startup; components receive it by shared reference and cannot weaken
//! individual operations afterwards.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::password::{HashingParams, PasswordHashError, PasswordPolicy};
use platform::rate_limit::RateLimitConfig;
use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Minimum token signing secret length (bytes)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Token secret must be at least {min} bytes (got {actual})")]
    SecretTooShort { min: usize, actual: usize },

    #[error("Token TTL must be greater than zero")]
    ZeroTokenTtl,

    #[error(transparent)]
    Hashing(#[from] PasswordHashError),

    #[error("Password minimum length must be at least 1 and not exceed the maximum")]
    InvalidPasswordBounds,

    #[error("Email maximum length is too small")]
    InvalidEmailBound,

    #[error("Rate limit policy must allow at least one attempt in a non-zero window")]
    InvalidRateLimit,
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Token signing secret for HMAC (min 32 bytes)
    pub token_secret: Vec<u8>,
    /// Token lifetime (30 minutes in the reference policy)
    pub token_ttl: Duration,
    /// Argon2id work factor
    pub hashing: HashingParams,
    /// Password length bounds
    pub password_policy: PasswordPolicy,
    /// Email length bound
    pub email_max_length: usize,
    /// Login attempt policy (shorter window, fewer attempts)
    pub login_limit: RateLimitConfig,
    /// Registration attempt policy (longer window, keyed by source)
    pub register_limit: RateLimitConfig,
    /// Explicit switch for test/ephemeral environments. Logged at
    /// startup; never flipped silently.
    pub rate_limit_disabled: bool,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "token".to_string(),
            token_secret: vec![0u8; MIN_SECRET_LENGTH],
            token_ttl: Duration::from_secs(30 * 60), // 30 minutes
            hashing: HashingParams::default(),
            password_policy: PasswordPolicy::default(),
            email_max_length: 255,
            login_limit: RateLimitConfig::new(5, 15 * 60),
            register_limit: RateLimitConfig::new(10, 60 * 60),
            rate_limit_disabled: false,
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
        }
    }
}

impl AuthConfig {
    /// Create config with a random token secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = vec![0u8; MIN_SECRET_LENGTH];
        rand::rng().fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Validate the configuration. Call once at startup, before any
    /// component is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SECRET_LENGTH,
                actual: self.token_secret.len(),
            });
        }

        if self.token_ttl.is_zero() {
            return Err(ConfigError::ZeroTokenTtl);
        }

        self.hashing.validate()?;

        if self.password_policy.min_length == 0
            || self.password_policy.min_length > self.password_policy.max_length
        {
            return Err(ConfigError::InvalidPasswordBounds);
        }

        // "a@b.cd" is the shortest address worth accepting
        if self.email_max_length < 6 {
            return Err(ConfigError::InvalidEmailBound);
        }

        for limit in [&self.login_limit, &self.register_limit] {
            if limit.max_attempts == 0 || limit.window.is_zero() {
                return Err(ConfigError::InvalidRateLimit);
            }
        }

        Ok(())
    }

    /// Get token TTL in milliseconds
    pub fn token_ttl_ms(&self) -> i64 {
        self.token_ttl.as_millis() as i64
    }

    /// Session cookie settings; Max-Age matches the token TTL.
    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.token_ttl.as_secs() as i64),
        }
    }
}
