//! Password Hashing and Verification
//!
//! Argon2id hashing with a configurable work factor:
//! - Salted, memory-hard hashing (OWASP recommended parameters by default)
//! - Zeroization of clear text password material
//! - Constant-time verification (inside the argon2 implementation)
//!
//! The work factor comes from validated configuration, never from the
//! caller of an individual hash operation.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Policy
// ============================================================================

/// Length bounds for clear text passwords.
///
/// The reference policy accepts 6 to 128 characters; both bounds are
/// configuration, not constants baked into call sites.
#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 128,
        }
    }
}

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters")]
    TooShort { min: usize },

    /// Password is too long
    #[error("Password must be at most {max} characters")]
    TooLong { max: usize },

    /// Password contains only whitespace
    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Password contains invalid characters (control characters)
    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed (entropy/parameter failure, not mismatch)
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,

    /// Work factor below the accepted minimum
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),
}

// ============================================================================
// Work factor
// ============================================================================

/// Minimum accepted Argon2 memory cost (KiB)
pub const MIN_MEMORY_KIB: u32 = 8192;

/// Minimum accepted Argon2 iteration count
pub const MIN_ITERATIONS: u32 = 1;

/// Argon2id work factor.
///
/// Defaults follow the OWASP recommendation: m=19456 (19 MiB), t=2, p=1.
#[derive(Debug, Clone, Copy)]
pub struct HashingParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl HashingParams {
    /// Reject work factors below the accepted minimum.
    pub fn validate(&self) -> Result<(), PasswordHashError> {
        if self.memory_kib < MIN_MEMORY_KIB {
            return Err(PasswordHashError::InvalidParams(format!(
                "memory cost {} KiB is below the minimum of {} KiB",
                self.memory_kib, MIN_MEMORY_KIB
            )));
        }
        if self.iterations < MIN_ITERATIONS {
            return Err(PasswordHashError::InvalidParams(format!(
                "iteration count {} is below the minimum of {}",
                self.iterations, MIN_ITERATIONS
            )));
        }
        if self.parallelism == 0 {
            return Err(PasswordHashError::InvalidParams(
                "parallelism must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new clear text password with policy validation.
    ///
    /// Unicode is normalized using NFKC before validation. Length is
    /// counted in Unicode code points, not bytes.
    pub fn new(raw: String, policy: &PasswordPolicy) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();

        if char_count < policy.min_length {
            return Err(PasswordPolicyError::TooShort {
                min: policy.min_length,
            });
        }

        if char_count > policy.max_length {
            return Err(PasswordPolicyError::TooLong {
                max: policy.max_length,
            });
        }

        // Control characters other than space/tab are rejected
        for ch in normalized.chars() {
            if ch.is_control() && ch != ' ' && ch != '\t' {
                return Err(PasswordPolicyError::InvalidCharacter);
            }
        }

        Ok(Self(normalized))
    }

    /// Create without validation (for already-validated or test input)
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    /// Get the password as bytes for hashing
    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Argon2id password hasher with a fixed, validated work factor.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Build a hasher from validated parameters.
    pub fn new(params: &HashingParams) -> Result<Self, PasswordHashError> {
        params.validate()?;

        let argon2_params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )
        .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params),
        })
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Returns a PHC-formatted hash string which embeds the salt and the
    /// cost parameters, so two hashes of the same plaintext differ.
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format.
///
/// The PHC string embeds the algorithm identifier, version, cost
/// parameters, salt, and digest, so verification needs no external
/// parameter source.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();

        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;

        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash.
    ///
    /// Never errors on mismatch; any failure (bad format included) is
    /// reported as `false`. The argon2 implementation compares digests
    /// in constant time.
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        // Verification reads the cost parameters from the PHC string
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
