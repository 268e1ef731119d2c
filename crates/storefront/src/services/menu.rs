//! Café menu reads.

use tracing::instrument;

use crate::backend::types::MenuItem;
use crate::backend::{BackendClient, CacheKey, CacheValue, Order, Table};

use super::ServiceError;

/// Menu items, cached for five minutes.
pub struct MenuService<'a> {
    client: &'a BackendClient,
}

impl<'a> MenuService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Available menu items ordered by category, then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn items(&self) -> Result<Vec<MenuItem>, ServiceError> {
        if let Some(CacheValue::MenuItems(items)) = self.client.cached(CacheKey::MenuItems).await {
            return Ok(items);
        }

        let items: Vec<MenuItem> = self
            .client
            .from(Table::MenuItems)
            .select("*")
            .eq("is_available", true)
            .order("category", Order::Asc)
            .order("name", Order::Asc)
            .fetch()
            .await?;

        self.client
            .store(CacheKey::MenuItems, CacheValue::MenuItems(items.clone()))
            .await;
        Ok(items)
    }

    /// Up to `limit` items for the home page, preferring organic ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    pub async fn featured(&self, limit: usize) -> Result<Vec<MenuItem>, ServiceError> {
        let mut items = self.items().await?;
        items.sort_by_key(|item| !item.is_organic.unwrap_or(false));
        items.truncate(limit);
        Ok(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::RawQuery;
    use axum::routing::get;

    use super::*;
    use crate::backend::testing::spawn_backend;

    fn menu_router(hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/rest/v1/menu_items",
            get(move |RawQuery(query): RawQuery| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    assert!(query.unwrap_or_default().contains("is_available=eq.true"));
                    axum::Json(serde_json::json!([
                        {
                            "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
                            "name": "Cold Brew",
                            "price": 4.25,
                            "category": "coffee",
                        },
                        {
                            "id": "0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33",
                            "name": "Oat Flat White",
                            "price": 4.75,
                            "category": "coffee",
                            "is_organic": true,
                        },
                        {
                            "id": "3c2d1e0f-7f1e-4b5a-8968-5a4b77665a4b",
                            "name": "Rooibos Chai",
                            "price": 4.25,
                            "category": "tea",
                            "is_organic": true,
                        }
                    ]))
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_items_are_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = spawn_backend(menu_router(hits.clone())).await;
        let service = MenuService::new(&client);

        assert_eq!(service.items().await.unwrap().len(), 3);
        assert_eq!(service.items().await.unwrap().len(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_featured_prefers_organic() {
        let client = spawn_backend(menu_router(Arc::new(AtomicUsize::new(0)))).await;

        let featured = MenuService::new(&client).featured(2).await.unwrap();
        let names: Vec<&str> = featured.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Oat Flat White", "Rooibos Chai"]);
    }
}
