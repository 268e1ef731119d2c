//! Per-request data every rendered page needs.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::auth::OptionalAuth;
use super::csp::CspNonce;
use crate::models::flash::{self, Flash};
use crate::models::{CurrentUser, ShopBasket};

/// Layout context: script nonce, pending notices, the signed-in user and the
/// current path for navigation state.
///
/// Extracting it takes the pending notices out of the session, so only the
/// handler that renders a page should extract it.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub nonce: String,
    pub flashes: Vec<Flash>,
    pub user: Option<CurrentUser>,
    pub path: String,
    /// Units in the session shop basket, for the header badge.
    pub basket_count: u32,
}

impl PageContext {
    /// Whether the navigation entry for `prefix` is the current section.
    #[must_use]
    pub fn is_current(&self, prefix: &str) -> bool {
        if prefix == "/" {
            return self.path == "/";
        }
        self.path == prefix || self.path.starts_with(&format!("{prefix}/"))
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Email of the signed-in user, empty for visitors.
    #[must_use]
    pub fn user_email(&self) -> &str {
        self.user.as_ref().map_or("", |user| user.email.as_str())
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;

        let (flashes, basket_count) = match parts.extensions.get::<Session>().cloned() {
            Some(session) => (
                flash::take(&session).await,
                ShopBasket::load(&session).await.total_quantity(),
            ),
            None => (Vec::new(), 0),
        };

        Ok(Self {
            nonce,
            flashes,
            user,
            path: parts.uri.path().to_string(),
            basket_count,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_context_takes_flashes_once() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        flash::push(&session, Flash::info("Welcome back", "")).await;

        let mut request = Request::builder().uri("/menu").body(()).unwrap();
        request.extensions_mut().insert(session.clone());
        request
            .extensions_mut()
            .insert(CspNonce("n0nce".to_string()));
        let (mut parts, ()) = request.into_parts();

        let ctx = PageContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.nonce, "n0nce");
        assert_eq!(ctx.flashes.len(), 1);
        assert!(!ctx.signed_in());
        assert!(ctx.is_current("/menu"));
        assert!(!ctx.is_current("/"));

        let again = PageContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(again.flashes.is_empty());
    }
}
