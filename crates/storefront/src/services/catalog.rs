//! Category tabs and substring search over small catalog lists.
//!
//! Lists are at most a few hundred rows and already cached, so filtering runs
//! in memory on every request.

use serde::Deserialize;

use crate::backend::types::{BlogPost, MenuItem, ShopProduct};

/// The category value that matches everything.
pub const ALL_CATEGORIES: &str = "all";

/// An item that can be filtered by category and searched by text.
pub trait Searchable {
    /// The item's category.
    fn category(&self) -> &str;

    /// Whether any searchable field contains `needle` (already lowercased).
    fn contains_text(&self, needle: &str) -> bool;
}

fn field_contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase().contains(needle))
}

impl Searchable for MenuItem {
    fn category(&self) -> &str {
        &self.category
    }

    fn contains_text(&self, needle: &str) -> bool {
        field_contains(Some(self.name.as_str()), needle)
            || field_contains(self.description.as_deref(), needle)
    }
}

impl Searchable for ShopProduct {
    fn category(&self) -> &str {
        &self.category
    }

    fn contains_text(&self, needle: &str) -> bool {
        field_contains(Some(self.name.as_str()), needle)
            || field_contains(self.description.as_deref(), needle)
    }
}

impl Searchable for BlogPost {
    fn category(&self) -> &str {
        &self.category
    }

    fn contains_text(&self, needle: &str) -> bool {
        field_contains(Some(self.title.as_str()), needle)
            || field_contains(self.excerpt.as_deref(), needle)
            || self
                .tags
                .iter()
                .flatten()
                .any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// `?category=&q=` query parameters of a catalog page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl CatalogQuery {
    /// Selected category, `all` when absent or blank.
    #[must_use]
    pub fn category(&self) -> &str {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(ALL_CATEGORIES)
    }

    /// Trimmed search text, empty when absent.
    #[must_use]
    pub fn search(&self) -> &str {
        self.q.as_deref().map_or("", str::trim)
    }
}

/// Items in `category` whose text contains `query`, case-insensitively.
///
/// An empty or `all` category and an empty query match everything. Order is
/// preserved.
pub fn filter_by<'a, T: Searchable>(items: &'a [T], category: &str, query: &str) -> Vec<&'a T> {
    let category = category.trim();
    let any_category = category.is_empty() || category.eq_ignore_ascii_case(ALL_CATEGORIES);
    let needle = query.trim().to_lowercase();

    items
        .iter()
        .filter(|item| any_category || item.category().eq_ignore_ascii_case(category))
        .filter(|item| needle.is_empty() || item.contains_text(&needle))
        .collect()
}

/// Distinct categories in first-seen order.
pub fn categories<T: Searchable>(items: &[T]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        let category = item.category();
        if !seen.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            seen.push(category.to_string());
        }
    }
    seen
}

/// A category tab on a catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTab {
    /// Value for the `category` query parameter.
    pub value: String,
    /// Tab label.
    pub label: String,
    pub active: bool,
}

/// "All" followed by every category present in `items`.
pub fn tabs<T: Searchable>(items: &[T], selected: &str) -> Vec<CategoryTab> {
    std::iter::once(ALL_CATEGORIES.to_string())
        .chain(categories(items))
        .map(|value| CategoryTab {
            label: title_case(&value),
            active: value.eq_ignore_ascii_case(selected),
            value,
        })
        .collect()
}

/// `"cold drinks"` → `"Cold Drinks"`.
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        category: &'static str,
        text: &'static str,
    }

    impl Searchable for Item {
        fn category(&self) -> &str {
            self.category
        }

        fn contains_text(&self, needle: &str) -> bool {
            self.text.to_lowercase().contains(needle)
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { category: "coffee", text: "Earth Blend Espresso" },
            Item { category: "tea", text: "Jasmine Green Tea" },
            Item { category: "coffee", text: "Rainforest Cold Brew" },
            Item { category: "pastries", text: "Vegan Blueberry Muffin" },
            Item { category: "Coffee", text: "Oat Flat White" },
        ]
    }

    fn texts(found: &[&Item]) -> Vec<&'static str> {
        found.iter().map(|i| i.text).collect()
    }

    #[test]
    fn test_all_and_empty_match_everything() {
        let items = items();
        assert_eq!(filter_by(&items, "all", "").len(), 5);
        assert_eq!(filter_by(&items, "", "  ").len(), 5);
        assert_eq!(filter_by(&items, "ALL", "").len(), 5);
    }

    #[test]
    fn test_category_is_case_insensitive() {
        let items = items();
        assert_eq!(
            texts(&filter_by(&items, "coffee", "")),
            vec!["Earth Blend Espresso", "Rainforest Cold Brew", "Oat Flat White"]
        );
    }

    #[test]
    fn test_search_within_category() {
        let items = items();
        assert_eq!(
            texts(&filter_by(&items, "coffee", "BREW")),
            vec!["Rainforest Cold Brew"]
        );
        assert!(filter_by(&items, "tea", "brew").is_empty());
    }

    #[test]
    fn test_categories_first_seen_order() {
        assert_eq!(categories(&items()), vec!["coffee", "tea", "pastries"]);
    }

    #[test]
    fn test_tabs_mark_selection() {
        let tabs = tabs(&items(), "tea");
        let labels: Vec<&str> = tabs.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["All", "Coffee", "Tea", "Pastries"]);
        assert!(tabs.iter().filter(|t| t.active).all(|t| t.value == "tea"));
    }

    #[test]
    fn test_catalog_query_defaults() {
        let query = CatalogQuery::default();
        assert_eq!(query.category(), "all");
        assert_eq!(query.search(), "");

        let query = CatalogQuery {
            category: Some("  ".to_string()),
            q: Some(" latte ".to_string()),
        };
        assert_eq!(query.category(), "all");
        assert_eq!(query.search(), "latte");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("cold drinks"), "Cold Drinks");
        assert_eq!(title_case("all"), "All");
    }
}
