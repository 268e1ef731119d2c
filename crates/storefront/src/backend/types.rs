//! Row types for the backend tables.
//!
//! Read rows mirror the table columns; nullable columns stay `Option` here and
//! are normalized by the services. Insert and update bodies only carry the
//! columns the storefront writes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use eco_brews_core::{
    BlogPostId, BookingStatus, CartItemId, EventBookingId, EventId, LoyaltyAccountId,
    LoyaltyTransactionId, MenuItemId, Price, ProfileId, ReservationId, ReservationStatus,
    ShopProductId, SubscriptionId, TransactionKind, UserId,
};

// =============================================================================
// Catalog
// =============================================================================

/// A drink or food item on the café menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub allergens: Option<Vec<String>>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub is_organic: Option<bool>,
    #[serde(default)]
    pub is_vegan: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A retail product (beans, merchandise, brewing gear).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopProduct {
    pub id: ShopProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub is_organic: Option<bool>,
    #[serde(default)]
    pub is_bestseller: Option<bool>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A scheduled café event (cupping, workshop, tasting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub max_attendees: Option<i32>,
    #[serde(default)]
    pub current_attendees: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A blog article. `content` is markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub author_id: Option<UserId>,
    pub author_name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub read_time: Option<i32>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Cart
// =============================================================================

/// Menu item columns embedded in a cart row read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMenuItem {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A `cart_items` row with its embedded menu item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub menu_item_id: MenuItemId,
    pub quantity: i32,
    /// `None` when the menu item was deleted after being added.
    #[serde(default)]
    pub menu_items: Option<CartMenuItem>,
}

/// Column list for cart reads, embedding the menu item.
pub const CART_ITEM_SELECT: &str = "id,menu_item_id,quantity,menu_items(name,price,image_url)";

/// Upsert body for `cart_items`, keyed on `(user_id, menu_item_id)`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub menu_item_id: MenuItemId,
    pub quantity: i32,
}

/// Update body for a cart row quantity.
#[derive(Debug, Clone, Serialize)]
pub struct CartQuantity {
    pub quantity: i32,
}

// =============================================================================
// Reservations
// =============================================================================

/// A `reservations` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub party_size: i32,
    pub reservation_date: NaiveDate,
    pub reservation_time: String,
    pub location_id: String,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub status: Option<ReservationStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert body for `reservations`. Guests insert with `user_id: null`.
#[derive(Debug, Clone, Serialize)]
pub struct NewReservation {
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub party_size: i32,
    pub reservation_date: NaiveDate,
    pub reservation_time: String,
    pub location_id: String,
    pub special_requests: Option<String>,
    pub status: ReservationStatus,
}

/// Update body that only changes the status.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationStatusUpdate {
    pub status: ReservationStatus,
}

// =============================================================================
// Events
// =============================================================================

/// Event columns embedded in a booking read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedEvent {
    pub title: String,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
}

/// An `event_bookings` row with its embedded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventBooking {
    pub id: EventBookingId,
    pub event_id: EventId,
    pub user_id: UserId,
    #[serde(default)]
    pub booking_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub events: Option<BookedEvent>,
}

/// Column list for booking reads, embedding the event.
pub const EVENT_BOOKING_SELECT: &str =
    "id,event_id,user_id,booking_date,status,events(title,event_date,location)";

/// Insert body for `event_bookings`.
#[derive(Debug, Clone, Serialize)]
pub struct NewEventBooking {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: BookingStatus,
}

/// Update body that only changes the booking status.
#[derive(Debug, Clone, Serialize)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

// =============================================================================
// Loyalty
// =============================================================================

/// A `loyalty_points` row: one per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub id: LoyaltyAccountId,
    pub user_id: UserId,
    pub points: i64,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub total_spent: Option<Price>,
    #[serde(default)]
    pub visits_this_month: Option<i32>,
    #[serde(default)]
    pub rewards_earned: Option<i32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert body for a fresh loyalty account.
#[derive(Debug, Clone, Serialize)]
pub struct NewLoyaltyAccount {
    pub user_id: UserId,
    pub points: i64,
    pub tier: String,
    pub total_spent: Price,
    pub visits_this_month: i32,
    pub rewards_earned: i32,
}

/// Balance update written with a compare-and-swap filter on the old balance.
#[derive(Debug, Clone, Serialize)]
pub struct LoyaltyBalanceUpdate {
    pub points: i64,
    pub tier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards_earned: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visits_this_month: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<Price>,
}

/// A `loyalty_transactions` ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub id: LoyaltyTransactionId,
    pub user_id: UserId,
    pub points: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert body for a ledger row.
#[derive(Debug, Clone, Serialize)]
pub struct NewLoyaltyTransaction {
    pub user_id: UserId,
    pub points: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
}

// =============================================================================
// Accounts
// =============================================================================

/// A `profiles` row, created by the backend when a user signs up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// "First Last", or whichever part is set.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Upsert body for the editable profile fields, keyed on `user_id`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub user_id: UserId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// =============================================================================
// Newsletter
// =============================================================================

/// A `newsletter_subscriptions` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterSubscription {
    pub id: SubscriptionId,
    pub email: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub preferences: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert body for a subscription.
#[derive(Debug, Clone, Serialize)]
pub struct NewSubscription {
    pub email: String,
    pub is_active: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_item_with_embedded_menu_item() {
        let json = r#"[{
            "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
            "menu_item_id": "0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33",
            "quantity": 2,
            "menu_items": {"name": "Oat Latte", "price": 5.25, "image_url": null}
        }]"#;
        let rows: Vec<CartItem> = serde_json::from_str(json).unwrap();
        let item = rows[0].menu_items.as_ref().unwrap();
        assert_eq!(item.name, "Oat Latte");
        assert_eq!(item.price, Price::from_cents(525));
        assert_eq!(rows[0].quantity, 2);
    }

    #[test]
    fn test_cart_item_with_deleted_menu_item() {
        let json = r#"{
            "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
            "menu_item_id": "0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33",
            "quantity": 1,
            "menu_items": null
        }"#;
        let row: CartItem = serde_json::from_str(json).unwrap();
        assert!(row.menu_items.is_none());
    }

    #[test]
    fn test_transaction_type_column() {
        let json = r#"{
            "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
            "user_id": "0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33",
            "points": -100,
            "type": "redeemed",
            "description": "Free drink",
            "created_at": "2024-05-01T10:00:00+00:00"
        }"#;
        let row: LoyaltyTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(row.kind, TransactionKind::Redeemed);
        assert_eq!(row.points, -100);
    }

    #[test]
    fn test_reservation_date_and_time_columns() {
        let json = r#"{
            "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
            "user_id": null,
            "name": "Ada",
            "email": "ada@example.com",
            "party_size": 4,
            "reservation_date": "2024-06-01",
            "reservation_time": "18:30",
            "location_id": "downtown",
            "status": "confirmed"
        }"#;
        let row: Reservation = serde_json::from_str(json).unwrap();
        assert_eq!(row.reservation_date.to_string(), "2024-06-01");
        assert_eq!(row.status, Some(ReservationStatus::Confirmed));
        assert!(row.user_id.is_none());
    }

    #[test]
    fn test_balance_update_skips_unchanged_columns() {
        let update = LoyaltyBalanceUpdate {
            points: 300,
            tier: "Sprout".to_string(),
            rewards_earned: None,
            visits_this_month: Some(3),
            total_spent: None,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"points": 300, "tier": "Sprout", "visits_this_month": 3})
        );
    }

    #[test]
    fn test_profile_display_name() {
        let mut profile: Profile = serde_json::from_str(
            r#"{"id":"6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11","user_id":"0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33","first_name":"Ada","last_name":" "}"#,
        )
        .unwrap();
        assert_eq!(profile.display_name().as_deref(), Some("Ada"));
        profile.first_name = None;
        assert_eq!(profile.display_name(), None);
    }
}
