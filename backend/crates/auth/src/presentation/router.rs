//! Auth Router

use axum::{
    Router,
    routing::{get, post},
};

use crate::application::config::{AuthConfig, ConfigError};
use crate::domain::repository::CredentialStore;
use crate::infra::postgres::PgCredentialStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{SessionGate, require_session};

/// Create the Auth router with the PostgreSQL store
pub fn auth_router(store: PgCredentialStore, config: AuthConfig) -> Result<Router, ConfigError> {
    auth_router_generic(store, config)
}

/// Create an Auth router for any store implementation
pub fn auth_router_generic<S>(store: S, config: AuthConfig) -> Result<Router, ConfigError>
where
    S: CredentialStore + Clone + Send + Sync + 'static,
{
    let state = AuthAppState::new(store, config)?;

    if state.config.rate_limit_disabled {
        tracing::warn!("Rate limiting is explicitly disabled by configuration");
    }

    // Attempt windows are evicted in the background once they elapse
    state
        .login_limiter
        .start_cleanup_task(state.config.login_limit.window);
    state
        .register_limiter
        .start_cleanup_task(state.config.register_limit.window);

    let gate = SessionGate {
        tokens: state.tokens.clone(),
        config: state.config.clone(),
    };

    let protected = Router::new()
        .route("/logout", post(handlers::logout::<S>))
        .route("/me", get(handlers::me))
        .route_layer(axum::middleware::from_fn_with_state(gate, require_session));

    Ok(Router::new()
        .route("/register", post(handlers::register::<S>))
        .route("/login", post(handlers::login::<S>))
        .merge(protected)
        .with_state(state))
}
