//! Cart route handlers.
//!
//! The cart page shows two kinds of lines: menu items stored as backend
//! `cart_items` rows for the signed-in user, and shop products held in the
//! session basket. The subtotal covers both.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eco_brews_core::{CartItemId, MenuItemId, Price, ShopProductId};

use crate::backend::types::CartItem;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, RequireAuth, login_url};
use crate::models::{Flash, ShopBasket};
use crate::services::shop::{BasketItem, basket_total};
use crate::services::{CartService, ShopService, cart};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A menu cart row ready for display.
pub struct CartLineView {
    pub id: CartItemId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: String,
    pub quantity: i32,
    pub line_total: String,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        let (name, image_url, unit_price) = item.menu_items.as_ref().map_or_else(
            || ("Item no longer on the menu".to_string(), None, Price::ZERO),
            |menu_item| {
                (
                    menu_item.name.clone(),
                    menu_item.image_url.clone(),
                    menu_item.price,
                )
            },
        );
        Self {
            id: item.id,
            name,
            image_url,
            unit_price: unit_price.display(),
            quantity: item.quantity,
            line_total: cart::line_total(item).display(),
        }
    }
}

/// A shop basket line ready for display.
pub struct BasketLineView {
    pub product_id: ShopProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&BasketItem> for BasketLineView {
    fn from(item: &BasketItem) -> Self {
        Self {
            product_id: item.product.id,
            name: item.product.name.clone(),
            image_url: item.product.image_url.clone(),
            unit_price: item.product.price.display(),
            quantity: item.quantity,
            line_total: item.line_total.display(),
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub lines: Vec<CartLineView>,
    pub basket: Vec<BasketLineView>,
    /// Units across both kinds of lines.
    pub item_count: i64,
    pub subtotal: String,
    pub max_quantity: i32,
    /// Login link for visitors, returning to the cart.
    pub sign_in_url: String,
}

impl CartTemplate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.basket.is_empty()
    }
}

/// Display the cart.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> impl IntoResponse {
    let mut rows: Vec<CartItem> = Vec::new();
    let mut ctx = ctx;

    if let Some(user) = &ctx.user {
        match CartService::new(state.backend(), user).items().await {
            Ok(items) => rows = items,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load cart");
                ctx.flashes
                    .push(Flash::error("Error loading cart", e.user_message()));
            }
        }
    }

    let basket = ShopBasket::load(&session).await;
    let basket_items = match ShopService::new(state.backend())
        .basket_items(&basket)
        .await
    {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load shop basket products");
            ctx.flashes
                .push(Flash::error("Error loading cart", e.user_message()));
            Vec::new()
        }
    };

    let basket_units: i64 = basket_items.iter().map(|i| i64::from(i.quantity)).sum();
    let subtotal = cart::total_price(&rows) + basket_total(&basket_items);

    CartTemplate {
        ctx,
        lines: rows.iter().map(CartLineView::from).collect(),
        basket: basket_items.iter().map(BasketLineView::from).collect(),
        item_count: cart::total_items(&rows) + basket_units,
        subtotal: subtotal.display(),
        max_quantity: cart::MAX_ITEM_QUANTITY,
        sign_in_url: login_url("/cart"),
    }
}

// =============================================================================
// Menu cart actions
// =============================================================================

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub menu_item_id: MenuItemId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Page to return to, defaults to the menu.
    #[serde(default)]
    pub return_to: Option<String>,
}

const fn default_quantity() -> i32 {
    1
}

/// Add a menu item to the signed-in user's cart.
///
/// Visitors get a "Please sign in" notice and stay on the page they came from.
#[instrument(skip(state, session, user), fields(menu_item_id = %form.menu_item_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddItemForm>,
) -> Redirect {
    let back = super::local_path(form.return_to.as_deref()).unwrap_or("/menu");

    let Some(user) = user else {
        return super::flash_redirect(
            &session,
            Flash::info("Please sign in", "Sign in to add items to your cart"),
            back,
        )
        .await;
    };

    match CartService::new(state.backend(), &user)
        .add(form.menu_item_id, form.quantity)
        .await
    {
        Ok(item) => {
            let name = item
                .menu_items
                .map_or_else(|| "Item".to_string(), |m| m.name);
            add_breadcrumb("cart", "Added item", Some(&[("item", name.as_str())]));
            super::flash_redirect(&session, Flash::success("Added to cart", name), back).await
        }
        Err(e) => {
            super::flash_failure(&session, "Error adding to cart", &e).await;
            Redirect::to(back)
        }
    }
}

/// Quantity update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateItemForm {
    pub cart_item_id: CartItemId,
    pub quantity: i32,
}

/// Set a cart row's quantity; zero removes it.
#[instrument(skip(state, session, user))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<UpdateItemForm>,
) -> Redirect {
    if let Err(e) = CartService::new(state.backend(), &user)
        .update_quantity(form.cart_item_id, form.quantity)
        .await
    {
        super::flash_failure(&session, "Error updating cart", &e).await;
    }
    Redirect::to("/cart")
}

/// Remove form data.
#[derive(Debug, Deserialize)]
pub struct RemoveItemForm {
    pub cart_item_id: CartItemId,
}

/// Remove one cart row.
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<RemoveItemForm>,
) -> Redirect {
    match CartService::new(state.backend(), &user)
        .remove(form.cart_item_id)
        .await
    {
        Ok(()) => {
            super::flash_redirect(&session, Flash::info("Removed from cart", ""), "/cart").await
        }
        Err(e) => {
            super::flash_failure(&session, "Error removing item", &e).await;
            Redirect::to("/cart")
        }
    }
}

/// Empty the cart: every menu row and the shop basket.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Redirect {
    if let Some(user) = user
        && let Err(e) = CartService::new(state.backend(), &user).clear().await
    {
        super::flash_failure(&session, "Error clearing cart", &e).await;
        return Redirect::to("/cart");
    }

    let mut basket = ShopBasket::load(&session).await;
    basket.clear();
    if let Err(e) = basket.save(&session).await {
        tracing::error!(error = %e, "Failed to clear shop basket");
    }

    super::flash_redirect(&session, Flash::info("Cart cleared", ""), "/cart").await
}

// =============================================================================
// Shop basket actions
// =============================================================================

/// Basket line removal form data.
#[derive(Debug, Deserialize)]
pub struct RemoveShopLineForm {
    pub product_id: ShopProductId,
}

/// Remove a shop product line from the session basket.
#[instrument(skip(session))]
pub async fn remove_shop_line(session: Session, Form(form): Form<RemoveShopLineForm>) -> Redirect {
    let mut basket = ShopBasket::load(&session).await;
    if !basket.remove(form.product_id) {
        return Redirect::to("/cart");
    }

    if let Err(e) = basket.save(&session).await {
        tracing::error!(error = %e, "Failed to save shop basket");
        return super::flash_redirect(
            &session,
            Flash::error("Error removing item", "Please try again"),
            "/cart",
        )
        .await;
    }
    super::flash_redirect(&session, Flash::info("Removed from cart", ""), "/cart").await
}
