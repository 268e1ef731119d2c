//! Integration tests for the Eco Brews storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the storefront against a backend
//! cargo run -p eco-brews-storefront
//!
//! # Run the ignored integration tests
//! cargo test -p eco-brews-integration-tests -- --ignored
//! ```
//!
//! The tests talk to a running server over HTTP. Set `STOREFRONT_BASE_URL`
//! to point them somewhere other than `http://localhost:3000`.

use reqwest::{Client, redirect};

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client with a cookie jar that does not follow redirects, so tests can
/// assert on `Location` headers.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// `Location` header of a redirect response, or an empty string.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
