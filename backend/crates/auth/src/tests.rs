//! Scenario tests for the auth crate
//!
//! Exercise the use cases end to end against the in-memory store.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use platform::password::PasswordHasher;
use platform::rate_limit::{FixedWindowLimiter, RateLimitConfig};

use crate::application::config::AuthConfig;
use crate::application::token::TokenService;
use crate::application::{
    LoginInput, LoginUseCase, RegisterInput, RegisterUseCase, VerifySessionUseCase,
};
use crate::error::AuthError;
use crate::infra::memory::MemoryCredentialStore;

struct Harness {
    store: MemoryCredentialStore,
    config: Arc<AuthConfig>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenService>,
    login_limiter: Arc<FixedWindowLimiter>,
    register_limiter: Arc<FixedWindowLimiter>,
}

impl Harness {
    fn new(config: AuthConfig) -> Self {
        config.validate().unwrap();

        Self {
            store: MemoryCredentialStore::new(),
            hasher: Arc::new(PasswordHasher::new(&config.hashing).unwrap()),
            tokens: Arc::new(TokenService::from_config(&config)),
            login_limiter: Arc::new(FixedWindowLimiter::new(config.login_limit)),
            register_limiter: Arc::new(FixedWindowLimiter::new(config.register_limit)),
            config: Arc::new(config),
        }
    }

    fn register(&self) -> RegisterUseCase<MemoryCredentialStore> {
        RegisterUseCase::new(
            Arc::new(self.store.clone()),
            self.hasher.clone(),
            self.register_limiter.clone(),
            self.config.clone(),
        )
    }

    fn login(&self) -> LoginUseCase<MemoryCredentialStore> {
        LoginUseCase::new(
            Arc::new(self.store.clone()),
            self.tokens.clone(),
            self.login_limiter.clone(),
            self.config.clone(),
        )
    }

    fn verify_session(&self) -> VerifySessionUseCase {
        VerifySessionUseCase::new(self.tokens.clone())
    }
}

fn register_input(email: &str, password: &str) -> RegisterInput {
    RegisterInput {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn login_input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn source(ip: &str) -> Option<IpAddr> {
    Some(ip.parse().unwrap())
}

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

mod register_login_flow {
    use super::*;

    #[tokio::test]
    async fn test_register_then_login_then_verify() {
        let harness = Harness::new(AuthConfig::with_random_secret());

        let registered = harness
            .register()
            .execute(register_input("a@x.com", "secret1"), source("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(registered.identity_id.as_i64(), 1);

        let logged_in = harness
            .login()
            .execute(login_input("a@x.com", "secret1"), source("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(logged_in.identity_id, registered.identity_id);
        assert_eq!(logged_in.email.as_str(), "a@x.com");

        let claims = harness
            .verify_session()
            .execute(&logged_in.token, Utc::now())
            .unwrap();
        assert_eq!(claims.id, registered.identity_id.as_i64());
        assert_eq!(claims.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_email_comparison_is_case_insensitive() {
        let harness = Harness::new(AuthConfig::with_random_secret());

        harness
            .register()
            .execute(register_input("User@Example.COM", "secret1"), None)
            .await
            .unwrap();

        // Login with a different casing reaches the same identity
        let logged_in = harness
            .login()
            .execute(login_input("user@example.com", "secret1"), None)
            .await
            .unwrap();
        assert_eq!(logged_in.email.as_str(), "user@example.com");

        // And a duplicate registration under another casing is refused
        let result = harness
            .register()
            .execute(register_input("USER@EXAMPLE.COM", "other-secret"), None)
            .await;
        assert!(matches!(result, Err(AuthError::IdentityExists)));
    }

    #[tokio::test]
    async fn test_duplicate_register_keeps_original_credentials() {
        let harness = Harness::new(AuthConfig::with_random_secret());

        harness
            .register()
            .execute(register_input("a@x.com", "secret1"), None)
            .await
            .unwrap();

        let result = harness
            .register()
            .execute(register_input("a@x.com", "different2"), None)
            .await;
        assert!(matches!(result, Err(AuthError::IdentityExists)));

        // The stored hash did not change: the original password still
        // works, the rejected one does not
        assert!(
            harness
                .login()
                .execute(login_input("a@x.com", "secret1"), None)
                .await
                .is_ok()
        );
        assert!(matches!(
            harness
                .login()
                .execute(login_input("a@x.com", "different2"), None)
                .await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_validation_failures_reported_per_field() {
        let harness = Harness::new(AuthConfig::with_random_secret());

        let result = harness
            .register()
            .execute(register_input("not-an-email", "x"), None)
            .await;

        match result {
            Err(AuthError::Validation(details)) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert!(fields.contains(&"email"));
                assert!(fields.contains(&"password"));
            }
            Err(other) => panic!("Expected validation error, got {other:?}"),
            Ok(_) => panic!("Expected validation error, got success"),
        }
    }
}

mod enumeration_resistance {
    use super::*;

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_identical() {
        let harness = Harness::new(AuthConfig::with_random_secret());

        harness
            .register()
            .execute(register_input("a@x.com", "secret1"), None)
            .await
            .unwrap();

        let unknown_email = harness
            .login()
            .execute(login_input("nobody@x.com", "secret1"), None)
            .await
            .unwrap_err();

        let wrong_password = harness
            .login()
            .execute(login_input("a@x.com", "wrong-password"), None)
            .await
            .unwrap_err();

        // Same variant, same message, same status code: the response
        // must not reveal whether the email is registered
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
        assert_eq!(unknown_email.status_code(), wrong_password.status_code());
    }
}

mod session_expiry {
    use super::*;

    #[tokio::test]
    async fn test_token_rejected_at_ttl() {
        let harness = Harness::new(AuthConfig::with_random_secret());
        let ttl_ms = harness.config.token_ttl_ms();

        harness
            .register()
            .execute(register_input("a@x.com", "secret1"), None)
            .await
            .unwrap();
        let logged_in = harness
            .login()
            .execute(login_input("a@x.com", "secret1"), None)
            .await
            .unwrap();

        let issued_at_ms = logged_in.expires_at_ms - ttl_ms;
        let verify = harness.verify_session();

        // Accepted through the whole window
        assert!(verify.execute(&logged_in.token, at(issued_at_ms)).is_ok());
        assert!(
            verify
                .execute(&logged_in.token, at(logged_in.expires_at_ms - 1))
                .is_ok()
        );

        // Rejected from the expiry instant on, with the generic error
        let expired = verify
            .execute(&logged_in.token, at(logged_in.expires_at_ms))
            .unwrap_err();
        assert!(matches!(expired, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected_with_same_error() {
        let harness = Harness::new(AuthConfig::with_random_secret());

        let malformed = harness
            .verify_session()
            .execute("not-a-token", Utc::now())
            .unwrap_err();

        assert!(matches!(malformed, AuthError::Unauthorized));
    }
}

mod rate_limiting {
    use super::*;

    fn limited_config(login_max: u32, window_secs: u64) -> AuthConfig {
        AuthConfig {
            login_limit: RateLimitConfig::new(login_max, window_secs),
            ..AuthConfig::with_random_secret()
        }
    }

    #[tokio::test]
    async fn test_sixth_login_attempt_rejected_regardless_of_credentials() {
        let harness = Harness::new(limited_config(5, 900));

        harness
            .register()
            .execute(register_input("a@x.com", "secret1"), None)
            .await
            .unwrap();

        // Five wrong-password attempts reach the credential check
        for _ in 0..5 {
            let err = harness
                .login()
                .execute(login_input("a@x.com", "wrong-password"), None)
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }

        // The sixth attempt is rejected before the check runs, even
        // with the correct password
        let err = harness
            .login()
            .execute(login_input("a@x.com", "secret1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_login_limit_keyed_by_identity() {
        let harness = Harness::new(limited_config(2, 900));

        harness
            .register()
            .execute(register_input("a@x.com", "secret1"), None)
            .await
            .unwrap();
        harness
            .register()
            .execute(register_input("b@x.com", "secret1"), None)
            .await
            .unwrap();

        // Exhaust the window for one identity, from two sources
        for ip in ["10.0.0.1", "10.0.0.2"] {
            harness
                .login()
                .execute(login_input("a@x.com", "wrong-password"), source(ip))
                .await
                .unwrap_err();
        }
        let err = harness
            .login()
            .execute(login_input("a@x.com", "secret1"), source("10.0.0.3"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RateLimited { .. }));

        // A different identity is unaffected
        assert!(
            harness
                .login()
                .execute(login_input("b@x.com", "secret1"), source("10.0.0.3"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_login_window_resets() {
        let harness = Harness::new(limited_config(1, 1));

        harness
            .register()
            .execute(register_input("a@x.com", "secret1"), None)
            .await
            .unwrap();

        assert!(
            harness
                .login()
                .execute(login_input("a@x.com", "secret1"), None)
                .await
                .is_ok()
        );
        assert!(matches!(
            harness
                .login()
                .execute(login_input("a@x.com", "secret1"), None)
                .await,
            Err(AuthError::RateLimited { .. })
        ));

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(
            harness
                .login()
                .execute(login_input("a@x.com", "secret1"), None)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_registration_limit_keyed_by_source() {
        let config = AuthConfig {
            register_limit: RateLimitConfig::new(2, 3600),
            ..AuthConfig::with_random_secret()
        };
        let harness = Harness::new(config);

        for i in 0..2 {
            harness
                .register()
                .execute(
                    register_input(&format!("user{i}@x.com"), "secret1"),
                    source("10.0.0.1"),
                )
                .await
                .unwrap();
        }

        // Third registration from the same source is rejected
        let err = harness
            .register()
            .execute(register_input("user2@x.com", "secret1"), source("10.0.0.1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RateLimited { .. }));

        // Another source can still register
        assert!(
            harness
                .register()
                .execute(register_input("user3@x.com", "secret1"), source("10.0.0.9"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_disabled_rate_limiting_is_explicit() {
        let config = AuthConfig {
            login_limit: RateLimitConfig::new(1, 900),
            rate_limit_disabled: true,
            ..AuthConfig::with_random_secret()
        };
        let harness = Harness::new(config);

        harness
            .register()
            .execute(register_input("a@x.com", "secret1"), None)
            .await
            .unwrap();

        // Far past the configured limit; every attempt still runs
        for _ in 0..5 {
            assert!(
                harness
                    .login()
                    .execute(login_input("a@x.com", "secret1"), None)
                    .await
                    .is_ok()
            );
        }
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_registrations_only_one_wins() {
        let harness = Harness::new(AuthConfig::with_random_secret());
        let register = Arc::new(harness.register());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let register = register.clone();
            handles.push(tokio::spawn(async move {
                register
                    .execute(register_input("a@x.com", "secret1"), None)
                    .await
            }));
        }

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AuthError::IdentityExists) => duplicates += 1,
                Err(other) => panic!("Unexpected error: {other:?}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 3);
    }
}
