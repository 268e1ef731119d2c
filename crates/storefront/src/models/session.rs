//! Session-related types.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eco_brews_core::{Email, UserId};

use crate::backend::AuthSession;

/// Session-stored user identity.
///
/// Holds the backend access token so user-scoped table requests run under the
/// user's row policies.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend auth user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Backend access token (JWT).
    pub access_token: String,
    /// When the access token expires.
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl CurrentUser {
    /// Build the session identity from a fresh sign-in.
    ///
    /// Falls back to `fallback_email` when the backend omits the user email.
    #[must_use]
    pub fn from_auth(session: &AuthSession, fallback_email: &Email) -> Self {
        let email = session
            .user
            .email
            .as_deref()
            .and_then(|e| Email::parse(e).ok())
            .unwrap_or_else(|| fallback_email.clone());

        Self {
            id: session.user.id,
            email,
            access_token: session.access_token.clone(),
            expires_at: session.expires_at(),
        }
    }

    /// Whether the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for pending flash messages.
    pub const FLASHES: &str = "flashes";

    /// Key for the shop product basket.
    pub const SHOP_BASKET: &str = "shop_basket";

    /// Key for the date of the last loyalty check-in.
    pub const LAST_CHECK_IN: &str = "last_check_in";
}
