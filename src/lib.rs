//! Miniblog - a minimal single-table blog server with Discord login
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                HTTP Layer (Axum)             │
//! │  - Post listing and creation (HTML)         │
//! │  - Discord OAuth login / callback / profile │
//! └─────────────────────────────────────────────┘
//!                       │
//! ┌─────────────────────────────────────────────┐
//! │                 Data Layer                   │
//! │  - SQLite (sqlx), single `post` table       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `web`: HTML handlers for listing and creating posts
//! - `auth`: Discord OAuth flow, signed-cookie sessions, session guard
//! - `data`: SQLite persistence
//! - `config`: Configuration management
//! - `error`: Error types

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod web;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains shared
/// resources like the database pool and the Discord OAuth client.
/// All of it is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Discord OAuth client
    pub oauth: Arc<auth::DiscordOAuth>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs schema migration)
    /// 2. Build HTTP client
    /// 3. Build Discord OAuth client
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        let http_client = reqwest::Client::builder()
            .user_agent("Miniblog/0.1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let oauth = auth::DiscordOAuth::new(&config, http_client);

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            oauth: Arc::new(oauth),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(web::posts_router())
        .merge(auth::auth_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
