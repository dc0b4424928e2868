use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{
    HeaderMap,
    header::{AUTHORIZATION, COOKIE},
    request::Parts,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;
use crate::store::{SESSION_TTL_SECS, SessionToken};
use crate::web::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "campus_session";

/// The authenticated user behind a request.
///
/// Extracting it from a request without a live session rejects with
/// [`AppError::Unauthenticated`], which redirects to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: SessionToken,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());

        let Some(token) = request_token(&parts.headers) else {
            debug!(path = %next, "No session token on request");
            return Err(AppError::Unauthenticated { next });
        };

        match state.store.session_user(token).await? {
            Some(user) => Ok(CurrentUser { user, token }),
            None => {
                debug!(path = %next, "Session token not recognised");
                Err(AppError::Unauthenticated { next })
            }
        }
    }
}

/// Reads the session token from `Authorization: Bearer`, falling back to
/// the session cookie.
fn request_token(headers: &HeaderMap) -> Option<SessionToken> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

fn cookie_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

/// `Set-Cookie` value that stores `token` in the browser.
pub fn session_cookie(token: SessionToken) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={SESSION_TTL_SECS}")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}
