//! Seed catalog tables from a YAML file.
//!
//! The file holds up to four lists, each optional:
//!
//! ```yaml
//! menu_items:
//!   - id: 7d0c4b1e-2f43-4a6e-9d0a-7b7f3a1c9e01
//!     name: Oat Flat White
//!     price: "4.75"
//!     category: coffee
//! shop_products: []
//! events: []
//! blog_posts: []
//! ```
//!
//! Rows carry stable ids and are upserted on `id`, so re-running a seed file
//! updates rows in place. Fields left out keep the backend's defaults.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use eco_brews_core::Price;
use eco_brews_storefront::backend::types::{BlogPost, Event, MenuItem, ShopProduct};
use eco_brews_storefront::backend::{BackendClient, Table};

/// Parsed seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub shop_products: Vec<ShopProduct>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub blog_posts: Vec<BlogPost>,
}

impl SeedFile {
    /// Total rows across every table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.menu_items.len() + self.shop_products.len() + self.events.len() + self.blog_posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Problems in a seed file, one message per problem.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut problems = Vec::new();

    let mut check_ids = |table: &str, ids: Vec<String>| {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id.clone()) {
                problems.push(format!("{table}: duplicate id {id}"));
            }
        }
    };
    check_ids("menu_items", seed.menu_items.iter().map(|r| r.id.to_string()).collect());
    check_ids("shop_products", seed.shop_products.iter().map(|r| r.id.to_string()).collect());
    check_ids("events", seed.events.iter().map(|r| r.id.to_string()).collect());
    check_ids("blog_posts", seed.blog_posts.iter().map(|r| r.id.to_string()).collect());

    for item in &seed.menu_items {
        if item.name.trim().is_empty() {
            problems.push(format!("menu_items {}: name is empty", item.id));
        }
        if item.category.trim().is_empty() {
            problems.push(format!("menu_items {}: category is empty", item.id));
        }
        if item.price <= Price::ZERO {
            problems.push(format!("menu_items {}: price must be positive", item.name));
        }
    }

    for product in &seed.shop_products {
        if product.name.trim().is_empty() {
            problems.push(format!("shop_products {}: name is empty", product.id));
        }
        if product.price <= Price::ZERO {
            problems.push(format!("shop_products {}: price must be positive", product.name));
        }
        if product.stock.is_some_and(|s| s < 0) {
            problems.push(format!("shop_products {}: stock is negative", product.name));
        }
        if product.rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
            problems.push(format!("shop_products {}: rating must be 0-5", product.name));
        }
    }

    for event in &seed.events {
        if event.title.trim().is_empty() {
            problems.push(format!("events {}: title is empty", event.id));
        }
        if event.max_attendees.is_some_and(|m| m < 1) {
            problems.push(format!("events {}: max_attendees must be at least 1", event.title));
        }
        if event.price.is_some_and(|p| p < Price::ZERO) {
            problems.push(format!("events {}: price is negative", event.title));
        }
    }

    let mut slugs = HashSet::new();
    for post in &seed.blog_posts {
        if post.slug.trim().is_empty() || post.slug.contains(char::is_whitespace) {
            problems.push(format!("blog_posts {}: slug must be non-empty without spaces", post.title));
        }
        if !slugs.insert(post.slug.as_str()) {
            problems.push(format!("blog_posts: duplicate slug {}", post.slug));
        }
    }

    problems
}

/// A row as JSON with null fields dropped, so backend defaults apply.
fn without_nulls<T: Serialize>(row: &T) -> Result<serde_json::Value, serde_json::Error> {
    let mut value = serde_json::to_value(row)?;
    if let serde_json::Value::Object(map) = &mut value {
        map.retain(|_, field| !field.is_null());
    }
    Ok(value)
}

/// Upsert every row of one table, returning how many were written.
async fn upsert_rows<T: Serialize>(
    client: &BackendClient,
    table: Table,
    rows: &[T],
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut written = 0;
    for row in rows {
        let body = without_nulls(row)?;
        let result: Result<serde_json::Value, _> =
            client.from(table).as_service().upsert(&body, "id").await;
        match result {
            Ok(_) => written += 1,
            Err(e) => {
                error!(table = table.as_str(), error = %e, "Failed to upsert row");
                return Err(e.into());
            }
        }
    }
    info!(table = table.as_str(), rows = written, "Table seeded");
    Ok(written)
}

/// Seed catalog tables from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// the service key is missing, or the backend rejects a row.
pub async fn catalog(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    info!(
        menu_items = seed.menu_items.len(),
        shop_products = seed.shop_products.len(),
        events = seed.events.len(),
        blog_posts = seed.blog_posts.len(),
        "Parsed seed file"
    );

    let problems = validate(&seed);
    if !problems.is_empty() {
        error!("Seed file validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(format!("{} validation errors found", problems.len()).into());
    }

    if seed.is_empty() {
        warn!("Seed file has no rows");
        return Ok(());
    }

    if dry_run {
        info!(rows = seed.len(), "Dry run: seed file is valid, nothing written");
        return Ok(());
    }

    let client = super::backend_client()?;
    if !client.has_service_key() {
        return Err("BACKEND_SERVICE_KEY not set".into());
    }

    let written = upsert_rows(&client, Table::MenuItems, &seed.menu_items).await?
        + upsert_rows(&client, Table::ShopProducts, &seed.shop_products).await?
        + upsert_rows(&client, Table::Events, &seed.events).await?
        + upsert_rows(&client, Table::BlogPosts, &seed.blog_posts).await?;

    info!(rows = written, "Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SEED: &str = r##"
menu_items:
  - id: 7d0c4b1e-2f43-4a6e-9d0a-7b7f3a1c9e01
    name: Oat Flat White
    price: "4.75"
    category: coffee
    is_vegan: true
events:
  - id: 2b6f0c55-93d4-4f0e-8d1c-5a0f1e2d3c44
    title: Latte Art Workshop
    event_date: 2030-06-12T18:30:00Z
    max_attendees: 12
blog_posts:
  - id: 9a1d2c3b-4e5f-4a6b-8c7d-0e1f2a3b4c5d
    title: Why Shade-Grown Coffee Matters
    slug: shade-grown
    content: "# Shade\n\nTrees matter."
    author_name: Maya
    category: sustainability
"##;

    #[test]
    fn test_parses_and_validates_seed() {
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        assert_eq!(seed.len(), 3);
        assert!(seed.shop_products.is_empty());
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn test_reports_duplicates_and_bad_values() {
        let mut seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        let mut copy = seed.menu_items.first().cloned().unwrap();
        copy.price = Price::ZERO;
        seed.menu_items.push(copy);
        if let Some(post) = seed.blog_posts.first_mut() {
            post.slug = "shade grown".to_string();
        }

        let problems = validate(&seed);
        assert!(problems.iter().any(|p| p.contains("duplicate id")));
        assert!(problems.iter().any(|p| p.contains("price must be positive")));
        assert!(problems.iter().any(|p| p.contains("slug")));
    }

    #[test]
    fn test_unknown_sections_are_rejected() {
        assert!(serde_yaml::from_str::<SeedFile>("recipes: []\n").is_err());
    }

    #[test]
    fn test_nulls_are_dropped() {
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        let body = without_nulls(seed.menu_items.first().unwrap()).unwrap();
        let object = body.as_object().unwrap();
        assert!(object.contains_key("name"));
        assert!(!object.contains_key("created_at"));
        assert!(!object.contains_key("description"));
    }
}
