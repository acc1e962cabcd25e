//! PostgreSQL Credential Store
//!
//! The unique index on `identities.email` is the authoritative guard
//! against concurrent duplicate registration; the application-level
//! existence check is only an early exit.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use kernel::id::IdentityId;
use platform::password::HashedPassword;

use crate::domain::entity::identity::Identity;
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: i64,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl IdentityRow {
    fn into_identity(self) -> AuthResult<Identity> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Corrupt password hash in store: {e}")))?;

        Ok(Identity::new(
            IdentityId::new(self.id),
            Email::from_db(self.email),
            password_hash,
            self.created_at,
        ))
    }
}

impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_identity()).transpose()
    }

    async fn create(
        &self,
        email: &Email,
        password_hash: &HashedPassword,
    ) -> AuthResult<IdentityId> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO identities (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(email.as_str())
        .bind(password_hash.as_phc_string())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Ok(IdentityId::new(id)),
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(email = %email, "Duplicate registration lost the insert race");
                Err(AuthError::IdentityExists)
            }
            Err(e) => Err(AuthError::Database(e)),
        }
    }
}

/// PostgreSQL unique_violation
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}
