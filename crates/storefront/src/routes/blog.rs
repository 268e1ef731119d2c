//! Blog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::backend::types::BlogPost;
use crate::content::estimate_reading_minutes;
use crate::error::AppError;
use crate::filters;
use crate::middleware::PageContext;
use crate::services::catalog::{self, CatalogQuery, CategoryTab};
use crate::services::{BlogService, ServiceError};
use crate::state::AppState;

/// Number of recent posts shown under a post.
const RECENT_POSTS_COUNT: usize = 3;

/// Post card for listings.
#[derive(Clone)]
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub published: String,
    pub read_minutes: u32,
}

impl From<&BlogPost> for PostView {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone().unwrap_or_default(),
            author: post.author_name.clone(),
            category: post.category.clone(),
            tags: post.tags.clone().unwrap_or_default(),
            image_url: post.image_url.clone(),
            published: published_label(post),
            read_minutes: post
                .read_time
                .and_then(|m| u32::try_from(m).ok())
                .filter(|m| *m > 0)
                .unwrap_or_else(|| estimate_reading_minutes(&post.content)),
        }
    }
}

fn published_label(post: &BlogPost) -> String {
    post.published_at
        .or(post.created_at)
        .map(|at| at.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub ctx: PageContext,
    pub tabs: Vec<CategoryTab>,
    pub posts: Vec<PostView>,
    pub category: String,
    pub search: String,
    pub unavailable: bool,
}

/// Blog post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub ctx: PageContext,
    pub post: PostView,
    pub content_html: String,
    pub recent_posts: Vec<PostView>,
}

/// Display the blog index with category tabs and search.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let category = query.category().to_string();
    let search = query.search().to_string();

    let (all, unavailable) = match BlogService::new(state.backend()).posts().await {
        Ok(posts) => (posts, false),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load blog posts");
            (Vec::new(), true)
        }
    };

    BlogIndexTemplate {
        ctx,
        tabs: catalog::tabs(&all, &category),
        posts: catalog::filter_by(&all, &category, &search)
            .into_iter()
            .map(PostView::from)
            .collect(),
        category,
        search,
        unavailable,
    }
}

/// Display a single blog post.
///
/// # Errors
///
/// Returns 404 for an unknown or unpublished slug.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let service = BlogService::new(state.backend());

    let rendered = match service.post(&slug).await {
        Ok(rendered) => rendered,
        Err(ServiceError::NotFound(_)) => {
            return Err(AppError::NotFound(format!("post {slug}")));
        }
        Err(e) => return Err(e.into()),
    };

    let recent_posts = service
        .posts()
        .await
        .map(|posts| {
            posts
                .iter()
                .filter(|p| p.slug != slug)
                .take(RECENT_POSTS_COUNT)
                .map(PostView::from)
                .collect()
        })
        .unwrap_or_default();

    let mut post = PostView::from(&rendered.post);
    post.read_minutes = rendered.read_minutes;

    Ok(BlogShowTemplate {
        ctx,
        post,
        content_html: rendered.content_html,
        recent_posts,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_post_view_defaults() {
        let post: BlogPost = serde_json::from_value(serde_json::json!({
            "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
            "title": "Why Shade-Grown Coffee Matters",
            "slug": "shade-grown",
            "content": "word ".repeat(450),
            "author_name": "Maya",
            "category": "sustainability",
            "published_at": "2024-03-05T09:00:00Z",
        }))
        .unwrap();

        let view = PostView::from(&post);
        assert_eq!(view.published, "March 5, 2024");
        assert_eq!(view.read_minutes, 3);
        assert!(view.tags.is_empty());
        assert!(view.excerpt.is_empty());
    }
}
