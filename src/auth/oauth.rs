//! Discord OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with Discord:
//! redirect to the authorization endpoint, exchange the callback code
//! for an access token, and fetch the user profile with that token.
//! The protocol itself is plain HTTPS against Discord's endpoints.

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use super::middleware::SessionUser;
use super::session::{Session, create_session_token};
use crate::AppState;
use crate::config::AppConfig;
use crate::error::AppError;

/// Name of the signed session cookie
pub const SESSION_COOKIE: &str = "session";

/// Name of the transient CSRF state cookie set during login
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Create authentication router
///
/// Routes:
/// - GET /login/ - Redirect to Discord authorization
/// - GET /callback/ - OAuth callback
/// - GET /me/ - Profile page (requires session)
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login/", get(login))
        .route("/callback/", get(callback))
        .route("/me/", get(me))
}

// =============================================================================
// Discord client
// =============================================================================

/// Token response from Discord's token endpoint
#[derive(Debug, Deserialize)]
struct DiscordTokenResponse {
    access_token: String,
}

/// Discord user profile, fetched live on each profile view
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordUser {
    /// Snowflake id (decimal string)
    pub id: String,
    pub username: String,
    /// Display name; falls back to username when unset
    pub global_name: Option<String>,
    /// Avatar hash, if the user has a custom avatar
    pub avatar: Option<String>,
}

impl DiscordUser {
    /// Name shown on the profile page
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }

    /// CDN URL for the user's avatar image
    ///
    /// Users without a custom avatar get one of Discord's default
    /// embed avatars, indexed from the snowflake id.
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!(
                "https://cdn.discordapp.com/avatars/{}/{}.png",
                self.id, hash
            ),
            None => {
                let index = self.id.parse::<u64>().map(|id| (id >> 22) % 6).unwrap_or(0);
                format!("https://cdn.discordapp.com/embed/avatars/{}.png", index)
            }
        }
    }
}

/// Client for Discord's OAuth endpoints
///
/// Holds everything needed to begin and complete an authorization and
/// to fetch the authenticated user's profile.
pub struct DiscordOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_url: String,
    api_base: String,
}

impl DiscordOAuth {
    pub fn new(config: &AppConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            client_id: config.auth.discord.client_id.clone(),
            client_secret: config.auth.discord.client_secret.clone(),
            redirect_uri: config.auth.redirect_uri.clone(),
            authorize_url: config.auth.discord.authorize_url.clone(),
            api_base: config.auth.discord.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Build the authorization URL the browser is redirected to
    pub fn authorize_url(&self, state: &str) -> Result<String, AppError> {
        let url = url::Url::parse_with_params(
            &self.authorize_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "identify"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Config(format!("invalid authorize URL: {e}")))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .post(format!("{}/oauth2/token", self.api_base))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::OAuth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: DiscordTokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Fetch the authenticated user's profile
    pub async fn fetch_user(&self, access_token: &str) -> Result<DiscordUser, AppError> {
        let response = self
            .http
            .get(format!("{}/users/@me", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::OAuth(format!(
                "user endpoint returned {}",
                response.status()
            )));
        }

        let user: DiscordUser = response.json().await?;
        Ok(user)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /login/
///
/// Redirects the browser to Discord's authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to Discord with client_id, redirect_uri, scope, state
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let csrf_state = generate_csrf_state();
    let authorize_url = state.oauth.authorize_url(&csrf_state)?;

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, csrf_state))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.should_use_secure_cookies())
        .build();

    Ok((jar.add(cookie), Redirect::to(&authorize_url)))
}

/// Query parameters from the Discord callback
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    /// Authorization code
    code: String,
    /// CSRF state token
    state: String,
}

/// GET /callback/
///
/// Handles the OAuth callback from Discord.
///
/// # Steps
/// 1. Verify CSRF state against the login cookie
/// 2. Exchange code for access token
/// 3. Create signed session cookie
/// 4. Redirect to /me/
async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    verify_csrf_state(&query.state, &jar)?;

    let access_token = state.oauth.exchange_code(&query.code).await?;

    let session = Session::new(access_token, state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_key()?)?;

    let session_cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.should_use_secure_cookies())
        .build();
    let state_removal = Cookie::build((OAUTH_STATE_COOKIE, "")).path("/").build();

    let jar = jar.add(session_cookie).remove(state_removal);

    tracing::info!("OAuth callback completed, session established");

    Ok((jar, Redirect::to("/me/")))
}

/// GET /me/
///
/// Renders the authenticated user's Discord profile. The profile is
/// fetched live with the session's access token; nothing is cached.
/// Unauthenticated requests are redirected to /login/ by the
/// `SessionUser` rejection.
async fn me(
    State(state): State<AppState>,
    SessionUser(session): SessionUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.oauth.fetch_user(&session.access_token).await?;

    let name = html_escape::encode_text(user.display_name());
    let id = html_escape::encode_text(&user.id);
    let avatar_url = user.avatar_url();
    let avatar = html_escape::encode_double_quoted_attribute(&avatar_url);

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{name}</title></head>
<body>
    <img src="{avatar}" alt="avatar" />
    <h1>{name}</h1>
    <p>{id}</p>
</body>
</html>"#
    )))
}

// =============================================================================
// Helpers
// =============================================================================

/// Generate a random CSRF state token (32 random bytes, URL-safe base64)
fn generate_csrf_state() -> String {
    use base64::{Engine as _, engine::general_purpose};
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Verify CSRF state from the cookie matches the callback state
fn verify_csrf_state(state: &str, jar: &CookieJar) -> Result<(), AppError> {
    let cookie_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value())
        .ok_or(AppError::Unauthorized)?;

    if cookie_state != state {
        return Err(AppError::Unauthorized);
    }

    Ok(())
}
