//! Authentication route handlers.
//!
//! Handles login, registration and logout against the backend auth endpoint.
//! The issued access token is kept in the server-side session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eco_brews_core::Email;

use crate::backend::{AuthSession, BackendError, SignUpOutcome};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{PageContext, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Flash, flash};
use crate::state::AppState;

/// Where to land after sign-in when no `next` was given.
const DEFAULT_NEXT: &str = "/account";

/// Shortest password the register form accepts.
const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

/// `?next=` on the auth pages.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed after sign-in.
fn safe_next(next: Option<&str>) -> &str {
    super::local_path(next).unwrap_or(DEFAULT_NEXT)
}

fn with_next(page: &str, next: &str) -> String {
    if next == DEFAULT_NEXT {
        return page.to_string();
    }
    format!("{page}?next={}", urlencoding::encode(next))
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub next: String,
    pub min_password_len: usize,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// A visitor who is already signed in goes straight to `next`.
pub async fn login_page(ctx: PageContext, Query(query): Query<NextQuery>) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();
    if ctx.signed_in() {
        return Redirect::to(&next).into_response();
    }
    LoginTemplate { ctx, next }.into_response()
}

/// Store the signed-in user and report it to Sentry.
async fn start_session(session: &Session, auth: &AuthSession, email: &Email) -> bool {
    let user = CurrentUser::from_auth(auth, email);

    if let Err(e) = set_current_user(session, &user).await {
        tracing::error!(error = %e, "Failed to store user in session");
        return false;
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Signed in", None);
    true
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Redirect {
    let next = safe_next(form.next.as_deref()).to_string();
    let retry = with_next("/auth/login", &next);

    let Ok(email) = Email::parse(&form.email) else {
        return super::flash_redirect(
            &session,
            Flash::error("Sign in failed", "Please enter a valid email address"),
            &retry,
        )
        .await;
    };

    let auth = match state.backend().sign_in(&email, &form.password).await {
        Ok(auth) => auth,
        Err(BackendError::InvalidCredentials) => {
            tracing::info!("Login rejected");
            return super::flash_redirect(
                &session,
                Flash::error("Sign in failed", "Invalid email or password"),
                &retry,
            )
            .await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            return super::flash_redirect(
                &session,
                Flash::error("Sign in failed", "Something went wrong, please try again"),
                &retry,
            )
            .await;
        }
    };

    if !start_session(&session, &auth, &email).await {
        return super::flash_redirect(
            &session,
            Flash::error("Sign in failed", "Could not start your session"),
            &retry,
        )
        .await;
    }

    super::flash_redirect(&session, Flash::success("Welcome back!", ""), &next).await
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(ctx: PageContext, Query(query): Query<NextQuery>) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();
    if ctx.signed_in() {
        return Redirect::to(&next).into_response();
    }
    RegisterTemplate {
        ctx,
        next,
        min_password_len: MIN_PASSWORD_LEN,
    }
    .into_response()
}

/// Check the register form, returning the parsed email.
fn validate_registration(form: &RegisterForm) -> Result<Email, &'static str> {
    let email = Email::parse(&form.email).map_err(|_| "Please enter a valid email address")?;
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    if form.password != form.password_confirm {
        return Err("Passwords do not match");
    }
    Ok(email)
}

fn trimmed(value: Option<&str>) -> &str {
    value.map_or("", str::trim)
}

/// Handle registration form submission.
///
/// When the backend requires email confirmation the visitor is sent to the
/// login page with a notice; otherwise they are signed in right away.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Redirect {
    let next = safe_next(form.next.as_deref()).to_string();
    let retry = with_next("/auth/register", &next);

    let email = match validate_registration(&form) {
        Ok(email) => email,
        Err(message) => {
            return super::flash_redirect(
                &session,
                Flash::error("Registration failed", message),
                &retry,
            )
            .await;
        }
    };

    let metadata = serde_json::json!({
        "first_name": trimmed(form.first_name.as_deref()),
        "last_name": trimmed(form.last_name.as_deref()),
    });

    match state
        .backend()
        .sign_up(&email, &form.password, &metadata)
        .await
    {
        Ok(SignUpOutcome::SignedIn(auth)) => {
            if start_session(&session, &auth, &email).await {
                return super::flash_redirect(
                    &session,
                    Flash::success("Welcome to Eco Brews!", "Your account is ready"),
                    &next,
                )
                .await;
            }
            super::flash_redirect(
                &session,
                Flash::info("Account created", "Please sign in to continue"),
                &with_next("/auth/login", &next),
            )
            .await
        }
        Ok(SignUpOutcome::ConfirmationRequired(_)) => {
            super::flash_redirect(
                &session,
                Flash::info(
                    "Check your email",
                    "We sent you a confirmation link to finish signing up",
                ),
                &with_next("/auth/login", &next),
            )
            .await
        }
        Err(e) => {
            let message = registration_error_message(&e);
            if matches!(e, BackendError::Api { status: 400..=499, .. }) {
                tracing::info!(error = %e, "Registration rejected");
            } else {
                tracing::error!(error = %e, "Registration failed");
            }
            super::flash_redirect(&session, Flash::error("Registration failed", message), &retry)
                .await
        }
    }
}

/// Notice text for a rejected sign-up.
fn registration_error_message(err: &BackendError) -> String {
    match err {
        BackendError::Api { status: 400..=499, error } => {
            let code = error.error_code.as_deref().unwrap_or_default();
            let message = error.message.as_deref().unwrap_or_default();
            if code == "user_already_exists" || message.contains("already registered") {
                "An account with this email already exists".to_string()
            } else if message.is_empty() {
                "Please check your details and try again".to_string()
            } else {
                message.to_string()
            }
        }
        BackendError::RateLimited(_) => {
            "Too many attempts, please try again in a moment".to_string()
        }
        _ => "Something went wrong, please try again".to_string(),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// The backend session is revoked best-effort; the local session is cleared
/// either way.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    let user: Option<CurrentUser> = session
        .get(crate::models::session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();

    if let Some(user) = user
        && let Err(e) = state.backend().sign_out(&user.access_token).await
    {
        tracing::warn!(error = %e, "Backend sign-out failed");
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session on logout");
    }
    clear_sentry_user();

    flash::push(&session, Flash::info("Signed out", "See you soon!")).await;
    Redirect::to("/")
}
