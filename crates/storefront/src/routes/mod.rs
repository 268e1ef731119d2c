//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /about                  - About page (markdown)
//! GET  /sustainability         - Sustainability page (markdown)
//! GET  /contact                - Locations and contact form
//! POST /contact                - Contact form submission
//! POST /newsletter             - Newsletter sign-up
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Catalog
//! GET  /menu                   - Menu (?category=&q=)
//! GET  /shop                   - Shop products (?category=&q=)
//! POST /shop/add               - Add a product to the session basket
//! GET  /blog                   - Blog index (?category=&q=)
//! GET  /blog/{slug}            - Blog post
//!
//! # Cart (menu items need sign-in)
//! GET  /cart                   - Cart page (menu cart + shop basket)
//! POST /cart/add               - Add a menu item
//! POST /cart/update            - Set a row quantity (0 removes)
//! POST /cart/remove            - Remove a row
//! POST /cart/clear             - Remove every row
//! POST /cart/shop/remove       - Remove a basket line
//!
//! # Bookings
//! GET  /reservation            - Reservation form (+ own reservations)
//! POST /reservation            - Create a reservation (guests allowed)
//! POST /reservation/{id}/cancel
//! GET  /events                 - Upcoming events (+ own bookings)
//! POST /events/{id}/book
//! POST /events/bookings/{id}/cancel
//!
//! # Loyalty (requires auth)
//! GET  /loyalty                - Balance, tier, rewards, history
//! POST /loyalty/redeem         - Redeem a reward
//! POST /loyalty/check-in       - Visit check-in
//!
//! # Account
//! GET  /account                - Profile, reservations, bookings
//! POST /account/profile        - Update first/last name
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```

pub mod account;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod contact;
pub mod events;
pub mod health;
pub mod home;
pub mod loyalty;
pub mod menu;
pub mod newsletter;
pub mod pages;
pub mod reservations;
pub mod shop;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::{action_rate_limiter, auth_rate_limiter, form_rate_limiter};
use crate::models::Flash;
use crate::models::flash;
use crate::services::ServiceError;
use crate::state::AppState;

/// A same-site path that is safe to redirect to.
///
/// Absolute URLs, protocol-relative `//host` paths, backslashes and control
/// characters are refused. Browsers strip tab and newline from URLs, so
/// `/\t/host` would otherwise become `//host`.
pub(crate) fn local_path(candidate: Option<&str>) -> Option<&str> {
    candidate.map(str::trim).filter(|path| {
        path.starts_with('/')
            && !path.starts_with("//")
            && !path.contains('\\')
            && !path.chars().any(char::is_control)
    })
}

/// Queue an error notice for a failed service call and log it.
///
/// Server-side failures are logged at error level; rejections the visitor can
/// fix (validation, sold out, insufficient points) at info.
pub(crate) async fn flash_failure(session: &Session, title: &str, err: &ServiceError) {
    if err.is_internal() {
        tracing::error!(error = %err, "{title}");
    } else {
        tracing::info!(error = %err, "{title}");
    }
    flash::push(session, Flash::error(title, err.user_message())).await;
}

/// Queue a notice and redirect.
pub(crate) async fn flash_redirect(session: &Session, notice: Flash, to: &str) -> Redirect {
    flash::push(session, notice).await;
    Redirect::to(to)
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/shop/remove", post(cart::remove_shop_line))
        .route_layer(action_rate_limiter())
}

/// Create the event routes router.
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::index))
        .route("/{id}/book", post(events::book))
        .route("/bookings/{id}/cancel", post(events::cancel_booking))
}

/// Create the loyalty routes router.
pub fn loyalty_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(loyalty::show))
        .route("/redeem", post(loyalty::redeem))
        .route("/check-in", post(loyalty::check_in))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/profile", post(account::update_profile))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let forms = form_rate_limiter();

    Router::new()
        // Pages
        .route("/", get(home::home))
        .merge(pages::router())
        .route(
            "/contact",
            get(contact::page).merge(post(contact::submit).layer(forms.clone())),
        )
        .route("/newsletter", post(newsletter::subscribe).layer(forms.clone()))
        // Catalog
        .route("/menu", get(menu::index))
        .route("/shop", get(shop::index))
        .route("/shop/add", post(shop::add).layer(action_rate_limiter()))
        .route("/blog", get(blog::index))
        .route("/blog/{slug}", get(blog::show))
        // Cart
        .nest("/cart", cart_routes())
        // Bookings
        .route(
            "/reservation",
            get(reservations::page).merge(post(reservations::create).layer(forms)),
        )
        .route("/reservation/{id}/cancel", post(reservations::cancel))
        .nest("/events", event_routes())
        // Members
        .nest("/loyalty", loyalty_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        // Health
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
