//! Identity Entity
//!
//! A registered user, keyed by email. The password hash is opaque; the
//! plaintext never reaches this type. Identities are created by
//! registration and read by login; this core never updates or deletes
//! them.

use chrono::{DateTime, Utc};
use kernel::id::IdentityId;
use platform::password::HashedPassword;

use crate::domain::value_object::email::Email;

/// Identity entity
#[derive(Debug, Clone)]
pub struct Identity {
    /// Store-assigned integer identifier
    pub id: IdentityId,
    /// Normalized email (unique)
    pub email: Email,
    /// Password hash in PHC format
    pub password_hash: HashedPassword,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(
        id: IdentityId,
        email: Email,
        password_hash: HashedPassword,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            password_hash,
            created_at,
        }
    }
}
