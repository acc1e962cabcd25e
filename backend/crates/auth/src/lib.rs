//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Identity entity, email value object, store trait
//! - `application/` - Use cases, token service, configuration
//! - `infra/` - Store implementations (PostgreSQL, in-memory)
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Identity registration and login with email + password
//! - Stateless, HMAC-signed bearer tokens with a fixed TTL
//! - Per-identity and per-source rate limiting of attempts
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (configurable work factor)
//! - Unknown-email and wrong-password failures are indistinguishable
//!   to the caller
//! - Tokens carry signed claims; expiry is part of the signed payload
//! - The credential check never runs once a rate limit has tripped

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult, FieldError};
pub use infra::memory::MemoryCredentialStore;
pub use infra::postgres::PgCredentialStore;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
