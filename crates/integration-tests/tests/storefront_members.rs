//! Sign-in gating and form handling against a running storefront.
//!
//! These tests require:
//! - The storefront running (cargo run -p eco-brews-storefront)
//! - A reachable backend
//!
//! Run with: cargo test -p eco-brews-integration-tests -- --ignored

use eco_brews_integration_tests::{client, location, storefront_base_url};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_member_pages_redirect_to_login() {
    let client = client();
    for path in ["/loyalty", "/account"] {
        let resp = client
            .get(format!("{}{path}", storefront_base_url()))
            .send()
            .await
            .expect("Failed to reach storefront");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(
            location(&resp),
            format!("/auth/login?next=%2F{}", path.trim_start_matches('/'))
        );
    }
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_visitor_add_to_cart_asks_to_sign_in() {
    let client = client();
    let base = storefront_base_url();

    let resp = client
        .post(format!("{base}/cart/add"))
        .form(&[
            ("menu_item_id", "7d0c4b1e-2f43-4a6e-9d0a-7b7f3a1c9e01"),
            ("quantity", "1"),
            ("return_to", "/menu"),
        ])
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/menu");

    // The notice shows once on the next page
    let page = client
        .get(format!("{base}/menu"))
        .send()
        .await
        .expect("Failed to reach storefront")
        .text()
        .await
        .expect("Failed to read response");
    assert!(page.contains("Please sign in"));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_offsite_return_to_is_ignored() {
    let resp = client()
        .post(format!("{}/cart/add", storefront_base_url()))
        .form(&[
            ("menu_item_id", "7d0c4b1e-2f43-4a6e-9d0a-7b7f3a1c9e01"),
            ("return_to", "//evil.example.com"),
        ])
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(location(&resp), "/menu");
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_invalid_reservation_rerenders_with_errors() {
    let resp = client()
        .post(format!("{}/reservation", storefront_base_url()))
        .form(&[
            ("name", ""),
            ("email", "not-an-email"),
            ("party_size", "40"),
            ("date", "2000-01-01"),
            ("time", "03:00"),
            ("location", "moon"),
        ])
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Please fix the following"));
    assert!(body.contains("not-an-email"));
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_invalid_contact_form_rerenders() {
    let resp = client()
        .post(format!("{}/contact", storefront_base_url()))
        .form(&[("name", "Ada"), ("email", ""), ("subject", ""), ("message", "")])
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running storefront"]
async fn test_bad_login_returns_to_form() {
    let resp = client()
        .post(format!("{}/auth/login", storefront_base_url()))
        .form(&[
            ("email", "nobody@example.com"),
            ("password", "definitely-wrong"),
            ("next", "/loyalty"),
        ])
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/auth/login"));
}
