//! In-Memory Credential Store
//!
//! Used by tests and ephemeral environments. The check-then-insert in
//! `create` happens under a single lock, which plays the role the unique
//! index plays in PostgreSQL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use kernel::id::IdentityId;
use platform::password::HashedPassword;

use crate::domain::entity::identity::Identity;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// In-memory credential store
#[derive(Clone)]
pub struct MemoryCredentialStore {
    inner: Arc<Inner>,
}

struct Inner {
    identities: Mutex<HashMap<String, Identity>>,
    next_id: AtomicI64,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                identities: Mutex::new(HashMap::new()),
                next_id: AtomicI64::new(1),
            }),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>> {
        let identities = self
            .inner
            .identities
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        Ok(identities.get(email.as_str()).cloned())
    }

    async fn create(
        &self,
        email: &Email,
        password_hash: &HashedPassword,
    ) -> AuthResult<IdentityId> {
        let mut identities = self
            .inner
            .identities
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        if identities.contains_key(email.as_str()) {
            return Err(AuthError::IdentityExists);
        }

        let id = IdentityId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        identities.insert(
            email.as_str().to_string(),
            Identity::new(id, email.clone(), password_hash.clone(), Utc::now()),
        );

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> HashedPassword {
        // Syntactically valid PHC string; never verified in these tests
        HashedPassword::from_phc_string(
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0c2FsdA$L5Cq2zUtY2eeLqIMmsA8fzrks8UBHtyhdzGVLVYiJJU",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryCredentialStore::new();

        let first = store
            .create(&Email::new("a@x.com").unwrap(), &hash())
            .await
            .unwrap();
        let second = store
            .create(&Email::new("b@x.com").unwrap(), &hash())
            .await
            .unwrap();

        assert_eq!(first.as_i64(), 1);
        assert_eq!(second.as_i64(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let store = MemoryCredentialStore::new();
        let email = Email::new("a@x.com").unwrap();

        store.create(&email, &hash()).await.unwrap();
        let result = store.create(&email, &hash()).await;

        assert!(matches!(result, Err(AuthError::IdentityExists)));
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let store = MemoryCredentialStore::new();
        let email = Email::new("a@x.com").unwrap();

        assert!(store.find_by_email(&email).await.unwrap().is_none());

        let id = store.create(&email, &hash()).await.unwrap();
        let found = store.find_by_email(&email).await.unwrap().unwrap();

        assert_eq!(found.id, id);
        assert_eq!(found.email, email);
    }
}
