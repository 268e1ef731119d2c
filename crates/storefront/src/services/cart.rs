//! Menu cart rows for the signed-in user.
//!
//! Every mutation is a single backend call; pages re-read the cart afterwards
//! instead of patching a local copy.

use tracing::instrument;

use eco_brews_core::{CartItemId, MenuItemId, Price};

use crate::backend::types::{CartItem, CartQuantity, NewCartItem, CART_ITEM_SELECT};
use crate::backend::{BackendClient, Order, Table};
use crate::models::CurrentUser;

use super::ServiceError;

/// Largest quantity of one menu item a cart row may hold.
pub const MAX_ITEM_QUANTITY: i32 = 20;

/// Cart operations scoped to one user.
pub struct CartService<'a> {
    client: &'a BackendClient,
    user: &'a CurrentUser,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient, user: &'a CurrentUser) -> Self {
        Self { client, user }
    }

    /// The user's cart rows with their menu items, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn items(&self) -> Result<Vec<CartItem>, ServiceError> {
        Ok(self
            .client
            .from(Table::CartItems)
            .select(CART_ITEM_SELECT)
            .eq("user_id", self.user.id)
            .order("created_at", Order::Asc)
            .as_user(&self.user.access_token)
            .fetch()
            .await?)
    }

    /// Add `quantity` of a menu item, on top of any already in the cart.
    ///
    /// The existing row is read and the sum upserted, so two concurrent adds
    /// of the same item can lose one increment.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a non-positive quantity, or a backend error.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn add(&self, menu_item_id: MenuItemId, quantity: i32) -> Result<CartItem, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let existing: Option<CartItem> = self
            .client
            .from(Table::CartItems)
            .select(CART_ITEM_SELECT)
            .eq("user_id", self.user.id)
            .eq("menu_item_id", menu_item_id)
            .as_user(&self.user.access_token)
            .fetch_optional()
            .await?;

        let current = existing.map_or(0, |item| item.quantity);
        Ok(self
            .client
            .from(Table::CartItems)
            .select(CART_ITEM_SELECT)
            .as_user(&self.user.access_token)
            .upsert(
                &NewCartItem {
                    user_id: self.user.id,
                    menu_item_id,
                    quantity: merged_quantity(current, quantity),
                },
                "user_id,menu_item_id",
            )
            .await?)
    }

    /// Set a row's quantity. Zero or less removes the row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the row is not the user's, or a backend error.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn update_quantity(&self, id: CartItemId, quantity: i32) -> Result<(), ServiceError> {
        if quantity <= 0 {
            return self.remove(id).await;
        }

        let updated: Vec<CartItem> = self
            .client
            .from(Table::CartItems)
            .select(CART_ITEM_SELECT)
            .eq("id", id)
            .eq("user_id", self.user.id)
            .as_user(&self.user.access_token)
            .update(&CartQuantity {
                quantity: quantity.min(MAX_ITEM_QUANTITY),
            })
            .await?;

        if updated.is_empty() {
            return Err(ServiceError::NotFound("Cart item"));
        }
        Ok(())
    }

    /// Remove one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn remove(&self, id: CartItemId) -> Result<(), ServiceError> {
        self.client
            .from(Table::CartItems)
            .eq("id", id)
            .eq("user_id", self.user.id)
            .as_user(&self.user.access_token)
            .delete()
            .await?;
        Ok(())
    }

    /// Remove every row of the user's.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn clear(&self) -> Result<(), ServiceError> {
        self.client
            .from(Table::CartItems)
            .eq("user_id", self.user.id)
            .as_user(&self.user.access_token)
            .delete()
            .await?;
        Ok(())
    }
}

fn merged_quantity(current: i32, added: i32) -> i32 {
    current.saturating_add(added).min(MAX_ITEM_QUANTITY)
}

/// Line total of one row; rows whose menu item is gone count as zero.
#[must_use]
pub fn line_total(item: &CartItem) -> Price {
    item.menu_items.as_ref().map_or_else(Price::default, |menu_item| {
        menu_item.price * u32::try_from(item.quantity).unwrap_or(0)
    })
}

/// Σ price × quantity over the rows.
#[must_use]
pub fn total_price(items: &[CartItem]) -> Price {
    items.iter().map(line_total).sum()
}

/// Σ quantity over the rows.
#[must_use]
pub fn total_items(items: &[CartItem]) -> i64 {
    items.iter().map(|item| i64::from(item.quantity.max(0))).sum()
}
