//! Authentication extractors.
//!
//! The signed-in user lives in the session as a [`CurrentUser`]. A user whose
//! backend access token has expired is treated as signed out and dropped from
//! the session, since every user-scoped table request would be refused.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, redirects to the login page with a `next`
/// parameter pointing back at the requested page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but nobody is signed in.
pub enum AuthRejection {
    /// Redirect to the login page, then back to `next`.
    RedirectToLogin { next: String },
    /// No session layer is installed.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login page URL returning to `next` after sign-in.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("/auth/login?next={}", urlencoding::encode(next))
}

/// Return path for a request: `GET` pages return to themselves, form posts
/// return to the page the form lives on.
fn return_path(parts: &Parts) -> String {
    let path = parts.uri.path();
    if parts.method == axum::http::Method::GET {
        return parts
            .uri
            .path_and_query()
            .map_or_else(|| path.to_string(), ToString::to_string);
    }
    let section = path.split('/').nth(1).unwrap_or_default();
    format!("/{section}")
}

/// Read the signed-in user, dropping one whose token has expired.
async fn load_user(session: &Session) -> Option<CurrentUser> {
    let user: CurrentUser = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()?;

    if user.is_expired() {
        tracing::debug!(user_id = %user.id, "Access token expired, signing out");
        if let Err(e) = clear_current_user(session).await {
            tracing::warn!(error = %e, "Failed to clear expired user");
        }
        return None;
    }
    Some(user)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::Unauthorized)?;

        let user = load_user(&session)
            .await
            .ok_or_else(|| AuthRejection::RedirectToLogin {
                next: return_path(parts),
            })?;

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(user.id.to_string()),
                ..Default::default()
            }));
        });

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>().cloned() {
            Some(session) => load_user(&session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the signed-in user in the session.
///
/// The session id is cycled first so a session fixed before login can't be
/// reused after it.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the signed-in user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use chrono::{Duration, Utc};
    use tower_sessions::MemoryStore;

    use eco_brews_core::{Email, UserId};

    use super::*;

    fn user(expires_in: Duration) -> CurrentUser {
        CurrentUser {
            id: UserId::new(uuid::Uuid::from_u128(42)),
            email: Email::parse("ada@example.com").unwrap(),
            access_token: "jwt".to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    fn parts(method: &str, uri: &str, session: Option<Session>) -> Parts {
        let mut request = Request::builder().method(method).uri(uri).body(()).unwrap();
        if let Some(session) = session {
            request.extensions_mut().insert(session);
        }
        request.into_parts().0
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_signed_in_user_is_extracted() {
        let session = session();
        session
            .insert(session_keys::CURRENT_USER, user(Duration::hours(1)))
            .await
            .unwrap();

        let mut parts = parts("GET", "/account", Some(session));
        let RequireAuth(found) = RequireAuth::from_request_parts(&mut parts, &()).await.ok().unwrap();
        assert_eq!(found.email.as_str(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_expired_user_is_signed_out() {
        let session = session();
        session
            .insert(session_keys::CURRENT_USER, user(-Duration::minutes(1)))
            .await
            .unwrap();

        let mut parts = parts("GET", "/loyalty", Some(session.clone()));
        let OptionalAuth(found) = OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(found.is_none());

        let stored: Option<CurrentUser> = session.get(session_keys::CURRENT_USER).await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_post_returns_to_section() {
        let mut parts = parts("POST", "/events/abc/book", Some(session()));
        let rejection = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();

        assert!(matches!(rejection, AuthRejection::RedirectToLogin { ref next } if next == "/events"));
    }

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(
            login_url("/blog?category=coffee"),
            "/auth/login?next=%2Fblog%3Fcategory%3Dcoffee"
        );
    }
}
