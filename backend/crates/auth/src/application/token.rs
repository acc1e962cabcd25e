//! Token Service
//!
//! Issues and verifies stateless session tokens. A token is the
//! base64url-encoded claims JSON followed by an HMAC-SHA256 signature
//! over those bytes: `payload.signature`. The expiry is part of the
//! signed payload, so a client cannot extend its own session.
//!
//! Tokens are never persisted server-side; the only invalidation is
//! expiry.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use kernel::id::IdentityId;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use thiserror::Error;

use crate::application::config::AuthConfig;
use crate::domain::value_object::email::Email;

/// Claims embedded in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub id: i64,
    pub email: String,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

/// Token verification failures.
///
/// Distinguishable to the orchestrator for logging; both collapse to one
/// generic unauthorized response at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature verifies but the expiry has passed
    #[error("Token expired")]
    Expired,

    /// Unparseable structure or invalid signature
    #[error("Invalid token")]
    Malformed,
}

/// A freshly issued token with its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at_ms: i64,
}

/// Issues and verifies signed session tokens
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token_secret.clone(), config.token_ttl)
    }

    /// Issue a token binding the identity at `now`, expiring after the
    /// configured TTL.
    pub fn issue(&self, id: IdentityId, email: &Email, now: DateTime<Utc>) -> IssuedToken {
        let issued_at_ms = now.timestamp_millis();
        let expires_at_ms = issued_at_ms + self.ttl.as_millis() as i64;

        let claims = SessionClaims {
            id: id.as_i64(),
            email: email.as_str().to_string(),
            issued_at_ms,
            expires_at_ms,
        };

        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("claims serialize to JSON"));

        let token = format!("{}.{}", payload, self.sign(payload.as_bytes()));

        IssuedToken {
            token,
            expires_at_ms,
        }
    }

    /// Verify a token's signature and expiry at `now`.
    ///
    /// A token is valid for check times in `[issued_at, expires_at)`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 2 {
            return Err(TokenError::Malformed);
        }

        let payload = parts[0];
        let signature_b64 = parts[1];

        // Signature check comes first; nothing in the payload is trusted
        // before it passes.
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;

        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Malformed)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;

        let claims: SessionClaims =
            serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;

        if now.timestamp_millis() >= claims.expires_at_ms {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, data: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .expect("HMAC can take key of any size");
        mac.update(data);
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30 * 60);

    fn service() -> TokenService {
        TokenService::new(vec![7u8; 32], TTL)
    }

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn email() -> Email {
        Email::new("a@x.com").unwrap()
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let service = service();
        let issued = service.issue(IdentityId::new(42), &email(), at(1_000_000));

        let claims = service.verify(&issued.token, at(1_000_000)).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.issued_at_ms, 1_000_000);
        assert_eq!(claims.expires_at_ms, issued.expires_at_ms);
    }

    #[test]
    fn test_expiry_boundary() {
        let service = service();
        let issued_at = 1_000_000;
        let ttl_ms = TTL.as_millis() as i64;
        let issued = service.issue(IdentityId::new(1), &email(), at(issued_at));

        // Valid at issuance and just before expiry
        assert!(service.verify(&issued.token, at(issued_at)).is_ok());
        assert!(
            service
                .verify(&issued.token, at(issued_at + ttl_ms - 1))
                .is_ok()
        );

        // Rejected at the expiry instant and after
        assert_eq!(
            service.verify(&issued.token, at(issued_at + ttl_ms)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            service.verify(&issued.token, at(issued_at + ttl_ms + 1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_expires_at_matches_ttl() {
        let service = service();
        let issued = service.issue(IdentityId::new(1), &email(), at(5_000));
        assert_eq!(issued.expires_at_ms, 5_000 + TTL.as_millis() as i64);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = service();
        let issued = service.issue(IdentityId::new(1), &email(), at(1_000_000));

        // Forge claims for a different identity, keep the old signature
        let forged_claims = SessionClaims {
            id: 999,
            email: "a@x.com".to_string(),
            issued_at_ms: 1_000_000,
            expires_at_ms: i64::MAX,
        };
        let forged_payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let signature = issued.token.split('.').nth(1).unwrap();
        let forged = format!("{forged_payload}.{signature}");

        assert_eq!(
            service.verify(&forged, at(1_000_000)),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = service();
        let other = TokenService::new(vec![8u8; 32], TTL);

        let issued = service.issue(IdentityId::new(1), &email(), at(1_000_000));
        assert_eq!(
            other.verify(&issued.token, at(1_000_000)),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_garbage_rejected() {
        let service = service();

        assert_eq!(service.verify("", at(0)), Err(TokenError::Malformed));
        assert_eq!(service.verify("abc", at(0)), Err(TokenError::Malformed));
        assert_eq!(
            service.verify("not-base64!.sig", at(0)),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            service.verify("a.b.c", at(0)),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_expired_still_requires_valid_signature() {
        // An expired token with a broken signature reports Malformed,
        // not Expired: nothing unsigned is ever interpreted.
        let service = service();
        let issued = service.issue(IdentityId::new(1), &email(), at(1_000_000));
        let ttl_ms = TTL.as_millis() as i64;

        let mut tampered = issued.token.clone();
        tampered.pop();
        assert_eq!(
            service.verify(&tampered, at(1_000_000 + ttl_ms + 1)),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_claims_serialization_camel_case() {
        let claims = SessionClaims {
            id: 1,
            email: "a@x.com".to_string(),
            issued_at_ms: 1,
            expires_at_ms: 2,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("issuedAtMs"));
        assert!(json.contains("expiresAtMs"));
    }
}
