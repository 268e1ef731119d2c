//! Cache types for catalog reads.

use super::types::{BlogPost, Event, MenuItem, ShopProduct};

/// Cache key for catalog lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    MenuItems,
    ShopProducts,
    Events,
    BlogPosts,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    MenuItems(Vec<MenuItem>),
    ShopProducts(Vec<ShopProduct>),
    Events(Vec<Event>),
    BlogPosts(Vec<BlogPost>),
}
