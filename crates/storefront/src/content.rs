//! Markdown content: static pages loaded at startup and blog bodies rendered
//! on request.
//!
//! Pages live in `{content_dir}/pages/*.md` with YAML frontmatter:
//!
//! ```markdown
//! ---
//! title: About Eco Brews
//! description: Our story
//! ---
//! Body in **markdown**.
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;

/// Metadata for static pages (about, sustainability).
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Short line shown under the title.
    #[serde(default)]
    pub tagline: Option<String>,
}

/// A rendered page with metadata and HTML content
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// Content store that holds all loaded pages in memory
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load all pages from `{content_dir}/pages`.
    ///
    /// A missing directory yields an empty store; individual files that fail
    /// to parse are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the pages directory exists but cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        let mut pages = HashMap::new();

        if !dir.exists() {
            tracing::warn!("Pages directory does not exist: {:?}", dir);
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                match Self::load_page(&path) {
                    Ok(page) => {
                        tracing::info!("Loaded page: {}", page.slug);
                        pages.insert(page.slug.clone(), page);
                    }
                    Err(e) => {
                        tracing::error!("Failed to load page {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Load a single page from a markdown file
    fn load_page(path: &Path) -> Result<Page, ContentError> {
        let content = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;

        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?
            .to_string();

        parse_page(slug, &content)
    }

    /// Get a page by slug
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Number of loaded pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn parse_page(slug: String, content: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(content)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Page {
        slug,
        meta,
        content_html: render_markdown(&parsed.content, true),
    })
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
///
/// `allow_html` passes raw HTML through; it is only set for files shipped
/// with the site, never for backend-authored text.
#[must_use]
pub fn render_markdown(content: &str, allow_html: bool) -> String {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    options.render.r#unsafe = allow_html;

    markdown_to_html(content, &options)
}

/// Estimate reading time at 200 words per minute, at least one minute.
#[must_use]
pub fn estimate_reading_minutes(markdown: &str) -> u32 {
    let word_count = markdown.split_whitespace().count();
    u32::try_from(word_count.div_ceil(200)).unwrap_or(u32::MAX).max(1)
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_with_frontmatter() {
        let page = parse_page(
            "about".to_string(),
            "---\ntitle: About Eco Brews\ntagline: Brewing a better future\n---\n# Our story\n\nWe **roast** locally.\n",
        )
        .unwrap();

        assert_eq!(page.meta.title, "About Eco Brews");
        assert_eq!(page.meta.tagline.as_deref(), Some("Brewing a better future"));
        assert!(page.content_html.contains("<strong>roast</strong>"));
    }

    #[test]
    fn test_page_without_frontmatter_is_rejected() {
        assert!(parse_page("x".to_string(), "just text").is_err());
    }

    #[test]
    fn test_raw_html_only_when_allowed() {
        let md = "hello <script>alert(1)</script>";
        assert!(render_markdown(md, true).contains("<script>"));
        assert!(!render_markdown(md, false).contains("<script>"));
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(estimate_reading_minutes(""), 1);
        assert_eq!(estimate_reading_minutes(&"word ".repeat(200)), 1);
        assert_eq!(estimate_reading_minutes(&"word ".repeat(201)), 2);
    }

    #[test]
    fn test_load_missing_directory_is_empty() {
        let store = ContentStore::load(Path::new("/nonexistent/content")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_shipped_pages_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("content");
        let store = ContentStore::load(&dir).unwrap();
        assert!(store.get_page("about").is_some());
        assert!(store.get_page("sustainability").is_some());
    }
}
