//! Published blog posts.

use tracing::instrument;

use crate::backend::types::BlogPost;
use crate::backend::{BackendClient, CacheKey, CacheValue, Order, Table};
use crate::content::{estimate_reading_minutes, render_markdown};

use super::ServiceError;

/// A post with its body rendered for display.
#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub post: BlogPost,
    pub content_html: String,
    pub read_minutes: u32,
}

/// Blog reads, cached for five minutes.
pub struct BlogService<'a> {
    client: &'a BackendClient,
}

impl<'a> BlogService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn posts(&self) -> Result<Vec<BlogPost>, ServiceError> {
        if let Some(CacheValue::BlogPosts(posts)) = self.client.cached(CacheKey::BlogPosts).await {
            return Ok(posts);
        }

        let posts: Vec<BlogPost> = self
            .client
            .from(Table::BlogPosts)
            .select("*")
            .eq("is_published", true)
            .order("published_at", Order::Desc)
            .fetch()
            .await?;

        self.client
            .store(CacheKey::BlogPosts, CacheValue::BlogPosts(posts.clone()))
            .await;
        Ok(posts)
    }

    /// A single published post with its markdown rendered.
    ///
    /// Backend-authored markdown is rendered without raw HTML passthrough.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown or unpublished slug.
    #[instrument(skip(self))]
    pub async fn post(&self, slug: &str) -> Result<RenderedPost, ServiceError> {
        let cached = self
            .posts()
            .await?
            .into_iter()
            .find(|post| post.slug == slug);

        let post = match cached {
            Some(post) => post,
            None => self
                .client
                .from(Table::BlogPosts)
                .eq("slug", slug)
                .eq("is_published", true)
                .fetch_optional()
                .await?
                .ok_or(ServiceError::NotFound("Post"))?,
        };

        Ok(render(post))
    }
}

fn render(post: BlogPost) -> RenderedPost {
    let read_minutes = post
        .read_time
        .and_then(|minutes| u32::try_from(minutes).ok())
        .filter(|minutes| *minutes > 0)
        .unwrap_or_else(|| estimate_reading_minutes(&post.content));
    RenderedPost {
        content_html: render_markdown(&post.content, false),
        read_minutes,
        post,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::extract::RawQuery;
    use axum::routing::get;

    use super::*;
    use crate::backend::testing::spawn_backend;

    fn post_json(slug: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "5b0c6a1e-2f1d-4e8b-9d55-0a1f6f3a2b10",
            "title": "Why We Compost Every Cup",
            "slug": slug,
            "excerpt": "Closing the loop",
            "content": "Our cups **return to the soil**.\n\n<script>alert(1)</script>",
            "author_name": "Maya",
            "category": "sustainability",
            "tags": ["compost", "zero waste"],
            "read_time": null,
            "is_published": true,
            "published_at": "2024-04-22T09:00:00Z"
        })
    }

    fn blog_router() -> Router {
        Router::new().route(
            "/rest/v1/blog_posts",
            get(|RawQuery(query): RawQuery| async move {
                let query = query.unwrap_or_default();
                if query.contains("slug=eq.draft") {
                    axum::Json(serde_json::json!([]))
                } else {
                    axum::Json(serde_json::json!([post_json("compost-cups")]))
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_post_renders_markdown_safely() {
        let client = spawn_backend(blog_router()).await;

        let rendered = BlogService::new(&client).post("compost-cups").await.unwrap();

        assert!(rendered.content_html.contains("<strong>return to the soil</strong>"));
        assert!(!rendered.content_html.contains("<script>"));
        assert_eq!(rendered.read_minutes, 1);
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let client = spawn_backend(blog_router()).await;

        let err = BlogService::new(&client).post("draft").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Post")));
    }
}
