//! Shop product reads and the session basket.

use tracing::instrument;

use eco_brews_core::{Price, ShopProductId};

use crate::backend::types::ShopProduct;
use crate::backend::{BackendClient, CacheKey, CacheValue, Order, Table};
use crate::models::ShopBasket;

use super::ServiceError;

/// A basket line joined with its product.
#[derive(Debug, Clone)]
pub struct BasketItem {
    pub product: ShopProduct,
    pub quantity: u32,
    pub line_total: Price,
}

/// Shop products, cached for five minutes.
pub struct ShopService<'a> {
    client: &'a BackendClient,
}

impl<'a> ShopService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Available products, bestsellers first, then by rating.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<ShopProduct>, ServiceError> {
        if let Some(CacheValue::ShopProducts(products)) =
            self.client.cached(CacheKey::ShopProducts).await
        {
            return Ok(products);
        }

        let products: Vec<ShopProduct> = self
            .client
            .from(Table::ShopProducts)
            .select("*")
            .eq("is_available", true)
            .order("is_bestseller", Order::Desc)
            .order("rating", Order::Desc)
            .fetch()
            .await?;

        self.client
            .store(
                CacheKey::ShopProducts,
                CacheValue::ShopProducts(products.clone()),
            )
            .await;
        Ok(products)
    }

    /// Read one product fresh, bypassing the cache, for stock checks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such product exists.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ShopProductId) -> Result<ShopProduct, ServiceError> {
        self.client
            .from(Table::ShopProducts)
            .eq("id", id)
            .fetch_optional()
            .await?
            .ok_or(ServiceError::NotFound("Product"))
    }

    /// Add units of a product to the basket.
    ///
    /// Refused when the product is unavailable or has no stock left beyond
    /// what the basket already holds. Returns the product and the resulting
    /// line quantity.
    ///
    /// # Errors
    ///
    /// Returns `SoldOut` when nothing more can be added, `NotFound` for an
    /// unknown product, or a backend error.
    pub async fn add_to_basket(
        &self,
        basket: &mut ShopBasket,
        product_id: ShopProductId,
        quantity: u32,
    ) -> Result<(ShopProduct, u32), ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let product = self.product(product_id).await?;
        let line_quantity = add_checked(basket, &product, quantity)?;
        Ok((product, line_quantity))
    }

    /// Join basket lines with the cached product list.
    ///
    /// Lines for products that are no longer listed are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list cannot be read.
    pub async fn basket_items(&self, basket: &ShopBasket) -> Result<Vec<BasketItem>, ServiceError> {
        if basket.is_empty() {
            return Ok(Vec::new());
        }
        let products = self.products().await?;
        Ok(join_basket(basket, &products))
    }
}

/// Units available to sell; a missing stock count means none.
fn stock_of(product: &ShopProduct) -> u32 {
    product
        .stock
        .and_then(|s| u32::try_from(s).ok())
        .unwrap_or(0)
}

fn add_checked(
    basket: &mut ShopBasket,
    product: &ShopProduct,
    quantity: u32,
) -> Result<u32, ServiceError> {
    let stock = stock_of(product);
    if !product.is_available.unwrap_or(false) || basket.quantity_of(product.id) >= stock {
        return Err(ServiceError::SoldOut(product.name.clone()));
    }
    Ok(basket.add(product.id, quantity, stock))
}

fn join_basket(basket: &ShopBasket, products: &[ShopProduct]) -> Vec<BasketItem> {
    basket
        .lines()
        .iter()
        .filter_map(|line| {
            products
                .iter()
                .find(|p| p.id == line.product_id)
                .map(|product| BasketItem {
                    product: product.clone(),
                    quantity: line.quantity,
                    line_total: product.price * line.quantity,
                })
        })
        .collect()
}

/// Sum of basket line totals.
#[must_use]
pub fn basket_total(items: &[BasketItem]) -> Price {
    items.iter().map(|item| item.line_total).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::routing::get;

    use super::*;
    use crate::backend::testing::spawn_backend;

    fn product(n: u128, stock: Option<i32>, available: Option<bool>) -> ShopProduct {
        ShopProduct {
            id: ShopProductId::new(uuid::Uuid::from_u128(n)),
            name: format!("Product {n}"),
            description: None,
            price: Price::from_cents(1200),
            category: "beans".to_string(),
            image_url: None,
            rating: Some(4.5),
            is_organic: Some(true),
            is_bestseller: Some(false),
            stock,
            is_available: available,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_add_respects_stock() {
        let mut basket = ShopBasket::default();
        let beans = product(1, Some(3), Some(true));

        assert_eq!(add_checked(&mut basket, &beans, 2).unwrap(), 2);
        assert_eq!(add_checked(&mut basket, &beans, 5).unwrap(), 3);
        assert!(matches!(
            add_checked(&mut basket, &beans, 1),
            Err(ServiceError::SoldOut(_))
        ));
    }

    #[test]
    fn test_unavailable_or_unstocked_is_sold_out() {
        let mut basket = ShopBasket::default();
        assert!(add_checked(&mut basket, &product(1, Some(10), Some(false)), 1).is_err());
        assert!(add_checked(&mut basket, &product(2, None, Some(true)), 1).is_err());
        assert!(add_checked(&mut basket, &product(3, Some(5), None), 1).is_err());
        assert!(basket.is_empty());
    }

    #[test]
    fn test_join_drops_unlisted_products() {
        let mut basket = ShopBasket::default();
        let listed = product(1, Some(10), Some(true));
        basket.add(listed.id, 2, 10);
        basket.add(ShopProductId::new(uuid::Uuid::from_u128(99)), 1, 10);

        let items = join_basket(&basket, &[listed]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line_total, Price::from_cents(2400));
        assert_eq!(basket_total(&items), Price::from_cents(2400));
    }

    #[tokio::test]
    async fn test_add_to_basket_reads_fresh_stock() {
        let router = Router::new().route(
            "/rest/v1/shop_products",
            get(|| async {
                axum::Json(serde_json::json!([{
                    "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
                    "name": "Eco Brews Travel Mug",
                    "price": 24.0,
                    "category": "accessories",
                    "stock": 1,
                    "is_available": true,
                }]))
            }),
        );
        let client = spawn_backend(router).await;
        let service = ShopService::new(&client);
        let id: ShopProductId = "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11".parse().unwrap();
        let mut basket = ShopBasket::default();

        let (product, quantity) = service.add_to_basket(&mut basket, id, 3).await.unwrap();
        assert_eq!(product.name, "Eco Brews Travel Mug");
        assert_eq!(quantity, 1);

        let err = service.add_to_basket(&mut basket, id, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::SoldOut(_)));

        let err = service.add_to_basket(&mut basket, id, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
