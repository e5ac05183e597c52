//! Authentication guard
//!
//! Protects routes that require a session. The guard is an explicit
//! extractor; its rejection is `AppError::Unauthorized`, which renders
//! as a redirect to `/login/`.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::extract::CookieJar;

use super::oauth::SESSION_COOKIE;
use super::session::{Session, verify_session_token};
use crate::AppState;
use crate::error::AppError;

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

/// Extractor for the current authenticated session
///
/// # Usage
/// ```ignore
/// async fn handler(
///     SessionUser(session): SessionUser,
/// ) -> impl IntoResponse {
///     // session.access_token is available here
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Extract and verify the session cookie
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(SessionUser(session));
        }

        let app_state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = verify_session_token(&token, &app_state.config.auth.session_key()?)?;
        parts.extensions.insert(session.clone());

        Ok(SessionUser(session))
    }
}
