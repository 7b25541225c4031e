use crate::config::Config;
use crate::errors::AppError;
use crate::models::SessionUser;
use axum::response::Redirect;
use std::time::Duration;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::info;

pub const SESSION_USER_KEY: &str = "user";
pub const LANDING_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

pub fn session_layer(config: &Config) -> SessionManagerLayer<MemoryStore> {
    // Out-of-range idle times fall back to browser-session cookies.
    let expiry = Duration::from_secs(config.session_idle_secs)
        .try_into()
        .map(Expiry::OnInactivity)
        .unwrap_or(Expiry::OnSessionEnd);
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(expiry)
}

/// Starts an authenticated session for `user` and sends the browser to the
/// landing page. The identity is written as a single value so a session
/// never holds part of it.
pub async fn establish(session: &Session, user: SessionUser) -> Result<Redirect, AppError> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_KEY, &user).await?;
    info!(user_id = user.id, username = %user.username, "session established");
    Ok(Redirect::to(LANDING_PATH))
}

pub async fn current_user(session: &Session) -> Result<Option<SessionUser>, AppError> {
    Ok(session.get::<SessionUser>(SESSION_USER_KEY).await?)
}

pub async fn require_user(session: &Session) -> Result<SessionUser, AppError> {
    current_user(session).await?.ok_or_else(AppError::unauthorized)
}

pub async fn destroy(session: &Session) -> Result<(), AppError> {
    if let Some(user) = current_user(session).await? {
        info!(user_id = user.id, "session destroyed");
    }
    session.flush().await?;
    Ok(())
}
