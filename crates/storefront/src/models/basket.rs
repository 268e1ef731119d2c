//! Session-held basket of shop products.
//!
//! Shop products live in their own table and cannot be stored as menu cart
//! rows, so their lines are kept in the session until checkout.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use eco_brews_core::ShopProductId;

use super::session::keys;

/// Most units of one product a basket line may hold.
pub const MAX_LINE_QUANTITY: u32 = 20;

/// A product and how many units of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketLine {
    pub product_id: ShopProductId,
    pub quantity: u32,
}

/// Shop product lines in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopBasket {
    lines: Vec<BasketLine>,
}

impl ShopBasket {
    /// Load the basket from the session; missing or unreadable is empty.
    pub async fn load(session: &Session) -> Self {
        session
            .get(keys::SHOP_BASKET)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Write the basket back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        if self.lines.is_empty() {
            session.remove::<Self>(keys::SHOP_BASKET).await?;
            return Ok(());
        }
        session.insert(keys::SHOP_BASKET, self).await
    }

    #[must_use]
    pub fn lines(&self) -> &[BasketLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units of `product_id` already in the basket.
    #[must_use]
    pub fn quantity_of(&self, product_id: ShopProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    /// Add units of a product, merging with an existing line.
    ///
    /// The line is capped at `limit` (remaining stock) and
    /// [`MAX_LINE_QUANTITY`]. Returns the resulting line quantity.
    pub fn add(&mut self, product_id: ShopProductId, quantity: u32, limit: u32) -> u32 {
        let cap = limit.min(MAX_LINE_QUANTITY);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity).min(cap);
            return line.quantity;
        }

        let quantity = quantity.min(cap);
        if quantity > 0 {
            self.lines.push(BasketLine {
                product_id,
                quantity,
            });
        }
        quantity
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ShopProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}
