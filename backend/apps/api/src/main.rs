//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::{AuthConfig, PgCredentialStore, auth_router};
use axum::{
    Json, Router, http,
    http::{Method, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use base64::Engine;
use base64::engine::general_purpose;
use platform::password::{HashingParams, PasswordPolicy};
use platform::rate_limit::RateLimitConfig;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Auth configuration (validated before anything is built from it)
    let auth_config = load_auth_config()?;
    auth_config.validate()?;

    if auth_config.rate_limit_disabled {
        tracing::warn!("Rate limiting disabled via AUTH_RATE_LIMIT_DISABLED");
    }

    let store = PgCredentialStore::new(pool.clone());

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .route("/", get(health))
        .nest("/api/auth", auth_router(store, auth_config)?)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port: u16 = env_parse("PORT", 5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Auth System API is running",
        "environment": if cfg!(debug_assertions) { "development" } else { "production" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Fallback for unknown routes
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Route not found",
            "statusCode": 404,
            "errorCode": "NOT_FOUND",
        })),
    )
}

/// Build the auth configuration from the environment.
///
/// The signing secret is mandatory outside debug builds; everything else
/// falls back to the reference policy.
fn load_auth_config() -> anyhow::Result<AuthConfig> {
    let base = match env::var("AUTH_TOKEN_SECRET") {
        Ok(secret_b64) => {
            let secret = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
            AuthConfig {
                token_secret: secret,
                ..AuthConfig::default()
            }
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("AUTH_TOKEN_SECRET not set, using a random development secret");
            AuthConfig::development()
        }
        Err(_) => anyhow::bail!("AUTH_TOKEN_SECRET must be set in production"),
    };

    Ok(AuthConfig {
        token_ttl: Duration::from_secs(env_parse("AUTH_TOKEN_TTL_SECS", 30 * 60)),
        hashing: HashingParams {
            memory_kib: env_parse("AUTH_HASH_MEMORY_KIB", base.hashing.memory_kib),
            iterations: env_parse("AUTH_HASH_ITERATIONS", base.hashing.iterations),
            parallelism: env_parse("AUTH_HASH_PARALLELISM", base.hashing.parallelism),
        },
        password_policy: PasswordPolicy {
            min_length: env_parse("AUTH_PASSWORD_MIN_LENGTH", 6),
            max_length: env_parse("AUTH_PASSWORD_MAX_LENGTH", 128),
        },
        email_max_length: env_parse("AUTH_EMAIL_MAX_LENGTH", 255),
        login_limit: RateLimitConfig::new(
            env_parse("AUTH_LOGIN_MAX_ATTEMPTS", 5),
            env_parse("AUTH_LOGIN_WINDOW_SECS", 15 * 60),
        ),
        register_limit: RateLimitConfig::new(
            env_parse("AUTH_REGISTER_MAX_ATTEMPTS", 10),
            env_parse("AUTH_REGISTER_WINDOW_SECS", 60 * 60),
        ),
        rate_limit_disabled: env_flag("AUTH_RATE_LIMIT_DISABLED"),
        cookie_secure: !env_flag("AUTH_COOKIE_INSECURE") && base.cookie_secure,
        ..base
    })
}

/// Parse an environment variable, falling back to a default.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// True when the variable is set to "1" or "true".
fn env_flag(key: &str) -> bool {
    matches!(
        env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("True")
    )
}
