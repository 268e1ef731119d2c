//! Home page route handler.

use std::time::{SystemTime, UNIX_EPOCH};

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::backend::types::MenuItem;
use crate::filters;
use crate::middleware::PageContext;
use crate::services::MenuService;
use crate::site::{
    self, FEATURED_DRINKS, IMPACT_STATS, MISSION_VALUES, MissionValue, REVIEW_ROTATION_SECS,
    REVIEWS, Review,
};
use crate::state::AppState;

/// Number of drinks shown in the featured section.
const FEATURED_COUNT: usize = 3;

/// A featured drink card.
#[derive(Clone)]
pub struct DrinkView {
    pub name: String,
    pub description: String,
    pub price: String,
    pub badges: Vec<String>,
    pub highlight: bool,
}

impl From<&MenuItem> for DrinkView {
    fn from(item: &MenuItem) -> Self {
        let mut badges = Vec::new();
        if item.is_organic.unwrap_or(false) {
            badges.push("Organic".to_string());
        }
        if item.is_vegan.unwrap_or(false) {
            badges.push("Vegan".to_string());
        }
        Self {
            name: item.name.clone(),
            description: item.description.clone().unwrap_or_default(),
            price: item.price.display(),
            highlight: item.is_organic.unwrap_or(false),
            badges,
        }
    }
}

impl From<&site::FeaturedDrink> for DrinkView {
    fn from(drink: &site::FeaturedDrink) -> Self {
        Self {
            name: drink.name.to_string(),
            description: drink.description.to_string(),
            price: drink.price.to_string(),
            badges: drink.badges.iter().map(ToString::to_string).collect(),
            highlight: drink.popular,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub drinks: Vec<DrinkView>,
    pub values: &'static [MissionValue],
    pub stats: &'static [(&'static str, &'static str)],
    pub reviews: &'static [Review],
    /// Review shown first; the carousel script advances from here.
    pub review_index: usize,
    pub rotation_ms: u64,
}

/// Featured drinks from the menu, or the fixed list when the menu can't be read
/// or is empty.
async fn featured_drinks(state: &AppState) -> Vec<DrinkView> {
    match MenuService::new(state.backend()).featured(FEATURED_COUNT).await {
        Ok(items) if !items.is_empty() => items.iter().map(DrinkView::from).collect(),
        Ok(_) => FEATURED_DRINKS.iter().map(DrinkView::from).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured drinks, using defaults");
            FEATURED_DRINKS.iter().map(DrinkView::from).collect()
        }
    }
}

/// Display the home page.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());

    HomeTemplate {
        ctx,
        drinks: featured_drinks(&state).await,
        values: MISSION_VALUES,
        stats: IMPACT_STATS,
        reviews: REVIEWS,
        review_index: site::review_index_at(now),
        rotation_ms: REVIEW_ROTATION_SECS * 1000,
    }
}
