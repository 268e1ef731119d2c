//! Public page tests against a running storefront.
//!
//! These tests require:
//! - The storefront running (cargo run -p eco-brews-storefront)
//! - A reachable backend with the catalog tables
//!
//! Run with: cargo test -p eco-brews-integration-tests -- --ignored

use eco_brews_integration_tests::{client, storefront_base_url};
use reqwest::StatusCode;

async fn get_page(path: &str) -> (StatusCode, String) {
    let resp = client()
        .get(format!("{}{path}", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    let status = resp.status();
    (status, resp.text().await.expect("Failed to read response"))
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_health_reports_ok() {
    let resp = client()
        .get(format!("{}/health", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.expect("Health is JSON");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_readiness_checks_backend() {
    let resp = client()
        .get(format!("{}/health/ready", storefront_base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = resp.json().await.expect("Readiness is JSON");
    assert_eq!(body["backend"], "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_home_page_renders_sections() {
    let (status, body) = get_page("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Featured drinks"));
    assert!(body.contains("Our mission"));
    assert!(body.contains("data-review"));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_markdown_pages_render() {
    for (path, heading) in [("/about", "About Us"), ("/sustainability", "Sustainability")] {
        let (status, body) = get_page(path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert!(body.contains(heading), "{path} is missing its title");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_catalog_pages_render() {
    for path in ["/menu", "/shop", "/events", "/blog", "/reservation", "/contact"] {
        let (status, _) = get_page(path).await;
        assert_eq!(status, StatusCode::OK, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_menu_search_filters() {
    let (status, body) = get_page("/menu?category=all&q=zzzz-no-such-drink").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No items match"));
}

#[tokio::test]
#[ignore = "Requires running storefront and backend"]
async fn test_unknown_blog_post_is_not_found() {
    let (status, _) = get_page("/blog/no-such-post-slug").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_security_headers_present() {
    let resp = client()
        .get(storefront_base_url())
        .send()
        .await
        .expect("Failed to reach storefront");

    let headers = resp.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    let csp = headers["content-security-policy"]
        .to_str()
        .expect("CSP is ASCII");
    assert!(csp.contains("'nonce-"));
    assert!(headers.contains_key("x-request-id"));
}
