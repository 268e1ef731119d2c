//! Client for the hosted data backend.
//!
//! # Architecture
//!
//! - The backend owns every table, row policy and auth account. There is no
//!   local database: rows are read on request and re-read after mutations.
//! - Tables are reached through a PostgREST-style REST interface
//!   (`/rest/v1/{table}`) using [`TableQuery`] builders.
//! - Accounts are managed through the auth interface (`/auth/v1`).
//! - Catalog reads (menu, shop, events, blog) are cached in memory via
//!   `moka` with a 5 minute TTL.
//!
//! # Example
//!
//! ```rust,ignore
//! use eco_brews_storefront::backend::{BackendClient, Order, Table};
//!
//! let client = BackendClient::new(&config.backend);
//!
//! let items: Vec<MenuItem> = client
//!     .from(Table::MenuItems)
//!     .eq("is_available", true)
//!     .order("category", Order::Asc)
//!     .fetch()
//!     .await?;
//! ```

mod auth;
mod cache;
mod client;
mod query;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use auth::{AuthSession, AuthUser, SignUpOutcome};
pub use cache::{CacheKey, CacheValue};
pub use client::{BackendClient, Credential, TableQuery};
pub use query::{Filter, FilterOp, Order, QueryParams};

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Postgres unique-violation error code.
const UNIQUE_VIOLATION: &str = "23505";

/// Named backend tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    MenuItems,
    CartItems,
    Reservations,
    Events,
    EventBookings,
    LoyaltyPoints,
    LoyaltyTransactions,
    BlogPosts,
    ShopProducts,
    Profiles,
    NewsletterSubscriptions,
}

impl Table {
    /// The table name in the REST path.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MenuItems => "menu_items",
            Self::CartItems => "cart_items",
            Self::Reservations => "reservations",
            Self::Events => "events",
            Self::EventBookings => "event_bookings",
            Self::LoyaltyPoints => "loyalty_points",
            Self::LoyaltyTransactions => "loyalty_transactions",
            Self::BlogPosts => "blog_posts",
            Self::ShopProducts => "shop_products",
            Self::Profiles => "profiles",
            Self::NewsletterSubscriptions => "newsletter_subscriptions",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error body.
    #[error("Backend error ({status}): {}", .error.summary())]
    Api {
        /// HTTP status code.
        status: u16,
        /// Decoded error body.
        error: ApiError,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The table or endpoint does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A mutation returned no representation where one row was expected.
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// The request's credentials were rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Sign-in with email and password failed.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The service-role key is required but not configured.
    #[error("Service key not configured")]
    MissingServiceKey,

    /// Update or delete without any filter would touch every row.
    #[error("Refusing unfiltered {0} on {1}")]
    UnfilteredMutation(&'static str, Table),
}

impl BackendError {
    /// Whether the backend rejected the write because of a unique constraint.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Api { status, error } => {
                *status == 409 || error.code.as_deref() == Some(UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }

    /// The short machine-readable code, if the backend sent one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { error, .. } => error.code.as_deref(),
            _ => None,
        }
    }
}

/// Error body returned by the REST and auth interfaces.
///
/// The REST interface sends `{code, message, details, hint}`; the auth
/// interface sends `{error, error_description}` or `{msg}`. All shapes decode
/// into this struct.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default, alias = "msg", alias = "error_description")]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiError {
    /// Decode an error body, keeping the raw text when it is not JSON.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str::<Self>(body).unwrap_or_else(|_| Self {
            message: Some(body.chars().take(200).collect()),
            ..Self::default()
        })
    }

    /// One-line human readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(code) = self
            .error_code
            .as_deref()
            .or(self.code.as_deref())
            .or(self.error.as_deref())
        {
            parts.push(format!("[{code}]"));
        }
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        if let Some(details) = &self.details {
            parts.push(format!("({details})"));
        }
        if parts.is_empty() {
            return "(no error details provided)".to_string();
        }
        parts.join(" ")
    }
}

/// The auth interface sends numeric codes, the REST interface string codes.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
