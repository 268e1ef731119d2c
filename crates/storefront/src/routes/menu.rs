//! Café menu route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::backend::types::MenuItem;
use crate::filters;
use crate::middleware::PageContext;
use crate::services::MenuService;
use crate::services::catalog::{self, CatalogQuery, CategoryTab};
use crate::state::AppState;

/// Menu page template.
#[derive(Template, WebTemplate)]
#[template(path = "menu/index.html")]
pub struct MenuTemplate {
    pub ctx: PageContext,
    pub tabs: Vec<CategoryTab>,
    pub items: Vec<MenuItem>,
    pub category: String,
    pub search: String,
    /// The menu could not be read; the page shows a notice instead of items.
    pub unavailable: bool,
}

/// Display the menu with category tabs and search.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let category = query.category().to_string();
    let search = query.search().to_string();

    let (all, unavailable) = match MenuService::new(state.backend()).items().await {
        Ok(items) => (items, false),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load menu");
            (Vec::new(), true)
        }
    };

    MenuTemplate {
        ctx,
        tabs: catalog::tabs(&all, &category),
        items: catalog::filter_by(&all, &category, &search)
            .into_iter()
            .cloned()
            .collect(),
        category,
        search,
        unavailable,
    }
}
