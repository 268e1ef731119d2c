//! Page-area services over the backend tables.
//!
//! Each area (menu, shop, cart, loyalty, reservations, events, blog) has one
//! service that reads its own table and performs its writes. Services borrow
//! the [`BackendClient`](crate::backend::BackendClient) and, for user-scoped
//! areas, the signed-in [`CurrentUser`](crate::models::CurrentUser), in the
//! same way repositories borrow a connection pool.
//!
//! # Services
//!
//! - `catalog` - Category tabs and substring search over catalog lists
//! - `menu` / `shop` / `events` / `blog` - Cached catalog reads
//! - `cart` - Menu cart rows for the signed-in user
//! - `loyalty` - Points balance, ledger, redemptions and check-ins
//! - `reservations` - Table bookings, including guest bookings
//! - `newsletter` / `profile` - Subscriptions and account details

pub mod blog;
pub mod cart;
pub mod catalog;
pub mod events;
pub mod loyalty;
pub mod menu;
pub mod newsletter;
pub mod profile;
pub mod reservations;
pub mod shop;

pub use blog::BlogService;
pub use cart::CartService;
pub use events::EventService;
pub use loyalty::LoyaltyService;
pub use menu::MenuService;
pub use newsletter::NewsletterService;
pub use profile::ProfileService;
pub use reservations::ReservationService;
pub use shop::ShopService;

use thiserror::Error;

use crate::backend::BackendError;

/// Errors from service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The backend request failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Input was rejected before reaching the backend.
    #[error("{0}")]
    Validation(String),

    /// The row does not exist or is not visible to the user.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A redemption asked for more points than the balance holds.
    #[error("You need {needed} points but have {balance}")]
    InsufficientPoints { balance: i64, needed: i64 },

    /// The product or event has no capacity left.
    #[error("{0} is sold out")]
    SoldOut(String),

    /// The action was already done (e.g. event already booked).
    #[error("{0}")]
    AlreadyDone(String),

    /// The loyalty balance kept changing underneath the update.
    #[error("Your balance changed while updating, please try again")]
    Conflict,
}

impl ServiceError {
    /// Message safe to show in a notice.
    ///
    /// Backend failures collapse to a generic line; everything else is
    /// already written for the visitor.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(BackendError::RateLimited(_)) => {
                "We're a little busy right now, please try again in a moment".to_string()
            }
            Self::Backend(BackendError::Unauthorized(_)) => {
                "Your session has expired, please sign in again".to_string()
            }
            Self::Backend(_) => "Something went wrong, please try again".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this is a server-side failure worth reporting.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Backend(
                BackendError::Http(_)
                    | BackendError::Parse(_)
                    | BackendError::EmptyResponse(_)
                    | BackendError::NotFound(_)
                    | BackendError::MissingServiceKey
                    | BackendError::UnfilteredMutation(..)
            ) | Self::Backend(BackendError::Api { status: 500..=599, .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_backend_details() {
        let err = ServiceError::Backend(BackendError::EmptyResponse("cart_items".to_string()));
        assert_eq!(err.user_message(), "Something went wrong, please try again");
        assert!(err.is_internal());

        let err = ServiceError::InsufficientPoints {
            balance: 40,
            needed: 150,
        };
        assert_eq!(err.user_message(), "You need 150 points but have 40");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_expired_token_message() {
        let err = ServiceError::Backend(BackendError::Unauthorized("JWT expired".to_string()));
        assert_eq!(
            err.user_message(),
            "Your session has expired, please sign in again"
        );
        assert!(!err.is_internal());
    }
}
