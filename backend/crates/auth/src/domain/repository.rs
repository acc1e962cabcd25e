//! Repository Traits
//!
//! Interfaces for credential persistence. Implementations live in the
//! infrastructure layer.

use kernel::id::IdentityId;
use platform::password::HashedPassword;

use crate::domain::entity::identity::Identity;
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Credential store trait.
///
/// The storage layer is the authoritative uniqueness guard for emails:
/// `create` must fail with [`AuthError::IdentityExists`] when a
/// concurrent registration already claimed the address, whatever an
/// earlier existence check said.
///
/// [`AuthError::IdentityExists`]: crate::error::AuthError::IdentityExists
#[trait_variant::make(CredentialStore: Send)]
pub trait LocalCredentialStore {
    /// Find an identity by normalized email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>>;

    /// Create an identity and return the assigned identifier
    async fn create(
        &self,
        email: &Email,
        password_hash: &HashedPassword,
    ) -> AuthResult<IdentityId>;
}
