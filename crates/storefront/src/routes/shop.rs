//! Shop route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eco_brews_core::ShopProductId;

use crate::backend::types::ShopProduct;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{Flash, ShopBasket};
use crate::services::ShopService;
use crate::services::catalog::{self, CatalogQuery, CategoryTab};
use crate::state::AppState;

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopTemplate {
    pub ctx: PageContext,
    pub tabs: Vec<CategoryTab>,
    pub products: Vec<ShopProduct>,
    pub category: String,
    pub search: String,
    pub unavailable: bool,
}

/// Display the shop with category tabs and search.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let category = query.category().to_string();
    let search = query.search().to_string();

    let (all, unavailable) = match ShopService::new(state.backend()).products().await {
        Ok(products) => (products, false),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load shop products");
            (Vec::new(), true)
        }
    };

    ShopTemplate {
        ctx,
        tabs: catalog::tabs(&all, &category),
        products: catalog::filter_by(&all, &category, &search)
            .into_iter()
            .cloned()
            .collect(),
        category,
        search,
        unavailable,
    }
}

/// Add-to-basket form data.
#[derive(Debug, Deserialize)]
pub struct AddProductForm {
    pub product_id: ShopProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Page to return to, defaults to the shop.
    #[serde(default)]
    pub return_to: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Add a product to the session basket.
///
/// Shop products are not menu items, so they never reach the backend cart;
/// visitors can fill a basket without signing in.
#[instrument(skip(state, session), fields(product_id = %form.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddProductForm>,
) -> Redirect {
    let back = super::local_path(form.return_to.as_deref()).unwrap_or("/shop");
    let mut basket = ShopBasket::load(&session).await;
    let requested = basket
        .quantity_of(form.product_id)
        .saturating_add(form.quantity);

    let result = ShopService::new(state.backend())
        .add_to_basket(&mut basket, form.product_id, form.quantity)
        .await;

    match result {
        Ok((product, line_quantity)) => {
            if let Err(e) = basket.save(&session).await {
                tracing::error!(error = %e, "Failed to save shop basket");
                return super::flash_redirect(
                    &session,
                    Flash::error("Error adding to cart", "Please try again"),
                    back,
                )
                .await;
            }
            let description = if line_quantity < requested {
                format!("{} (limited to {line_quantity})", product.name)
            } else {
                product.name
            };
            super::flash_redirect(&session, Flash::success("Added to cart", description), back)
                .await
        }
        Err(e) => {
            super::flash_failure(&session, "Error adding to cart", &e).await;
            Redirect::to(back)
        }
    }
}
