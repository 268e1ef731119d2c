//! Markdown content page route handlers (About, Sustainability).

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub description: String,
    pub tagline: Option<String>,
    pub content_html: String,
}

/// Serve a content page by slug.
fn serve_content_page(
    state: &AppState,
    ctx: PageContext,
    slug: &str,
) -> Result<ContentPageTemplate, AppError> {
    let page = state
        .content()
        .get_page(slug)
        .ok_or_else(|| AppError::NotFound(format!("page {slug}")))?;

    Ok(ContentPageTemplate {
        ctx,
        title: page.meta.title.clone(),
        description: page.meta.description.clone().unwrap_or_default(),
        tagline: page.meta.tagline.clone(),
        content_html: page.content_html.clone(),
    })
}

/// Display the About page.
///
/// # Errors
///
/// Returns 404 if the page wasn't loaded.
#[instrument(skip_all)]
pub async fn about(
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<impl IntoResponse, AppError> {
    serve_content_page(&state, ctx, "about")
}

/// Display the Sustainability page.
///
/// # Errors
///
/// Returns 404 if the page wasn't loaded.
#[instrument(skip_all)]
pub async fn sustainability(
    State(state): State<AppState>,
    ctx: PageContext,
) -> Result<impl IntoResponse, AppError> {
    serve_content_page(&state, ctx, "sustainability")
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about", get(about))
        .route("/sustainability", get(sustainability))
}
