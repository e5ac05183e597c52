//! Discord OAuth authentication
//!
//! Handles:
//! - Discord OAuth flow
//! - Session management
//! - Session guard for protected routes

mod middleware;
mod oauth;
pub mod session;

pub use middleware::SessionUser;
pub use oauth::{DiscordOAuth, DiscordUser, auth_router};
pub use session::{Session, create_session_token, verify_session_token};
