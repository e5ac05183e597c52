//! Common test utilities for E2E tests

use miniblog::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Hex-encoded 32-byte session secret used by all tests
pub const TEST_SESSION_SECRET: &str =
    "6162636465666768696a6b6c6d6e6f707172737475767778797a303132333435";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server talking to Discord's real endpoints
    /// (never reached by these tests).
    pub async fn new() -> Self {
        Self::start(None).await
    }

    /// Create a test server whose OAuth client points at a stub
    /// identity provider.
    pub async fn with_identity_stub() -> Self {
        let stub_addr = spawn_identity_stub().await;
        Self::start(Some(stub_addr)).await
    }

    async fn start(identity_stub: Option<String>) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let (authorize_url, api_base) = match &identity_stub {
            Some(base) => (format!("{base}/oauth2/authorize"), base.clone()),
            None => (
                "https://discord.com/oauth2/authorize".to_string(),
                "https://discord.com/api".to_string(),
            ),
        };

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost".to_string(),
                protocol: "http".to_string(),
            },
            database: config::DatabaseConfig { path: db_path },
            auth: config::AuthConfig {
                session_secret: TEST_SESSION_SECRET.to_string(),
                session_max_age: 604800,
                redirect_uri: "http://127.0.0.1:8080/callback/".to_string(),
                discord: config::DiscordOAuthConfig {
                    client_id: "test-client-id".to_string(),
                    client_secret: "test-client-secret".to_string(),
                    authorize_url,
                    api_base,
                },
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = miniblog::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a signed session cookie value for the stub access token
    pub fn create_session_cookie(&self) -> String {
        use miniblog::auth::{Session, create_session_token};

        let session = Session::new(STUB_ACCESS_TOKEN.to_string(), 3600);
        let key = self.state.config.auth.session_key().unwrap();
        let token = create_session_token(&session, &key).expect("failed to create session token");
        format!("session={token}")
    }
}

/// Access token issued by the stub identity provider
pub const STUB_ACCESS_TOKEN: &str = "stub-access-token";

/// Discord user id served by the stub identity provider
pub const STUB_USER_ID: &str = "80351110224678912";

/// Spawn a stub identity provider implementing the two endpoints the
/// OAuth client calls: token exchange and profile fetch.
async fn spawn_identity_stub() -> String {
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };

    async fn token() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "access_token": STUB_ACCESS_TOKEN,
            "token_type": "Bearer",
            "scope": "identify",
        }))
    }

    async fn me(headers: HeaderMap) -> Result<Json<serde_json::Value>, StatusCode> {
        let authorized = headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {STUB_ACCESS_TOKEN}"));
        if !authorized {
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(Json(serde_json::json!({
            "id": STUB_USER_ID,
            "username": "testuser",
            "global_name": "Test User",
            "avatar": null,
        })))
    }

    let app = Router::new()
        .route("/oauth2/token", post(token))
        .route("/users/@me", get(me));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Client that does not follow redirects, for asserting on them
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build no-redirect client")
}
