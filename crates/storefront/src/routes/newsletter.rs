//! Newsletter subscription route handler.

use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eco_brews_core::Email;

use crate::models::Flash;
use crate::services::NewsletterService;
use crate::services::newsletter::Subscribed;
use crate::state::AppState;

/// Newsletter subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
    /// Page the form was posted from, defaults to the home page.
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Subscribe an email address.
///
/// An address that is already subscribed is reported as success.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SubscribeForm>,
) -> Redirect {
    let back = super::local_path(form.return_to.as_deref()).unwrap_or("/");

    let Ok(email) = Email::parse(&form.email) else {
        return super::flash_redirect(
            &session,
            Flash::error("Subscription failed", "Please enter a valid email address"),
            back,
        )
        .await;
    };

    match NewsletterService::new(state.backend()).subscribe(&email).await {
        Ok(Subscribed::New) => {
            super::flash_redirect(
                &session,
                Flash::success(
                    "Welcome to our eco community!",
                    "Check your email for a welcome gift and sustainability tips.",
                ),
                back,
            )
            .await
        }
        Ok(Subscribed::Existing) => {
            super::flash_redirect(
                &session,
                Flash::info("You're already subscribed", "Thanks for staying in touch!"),
                back,
            )
            .await
        }
        Err(e) => {
            super::flash_failure(&session, "Subscription failed", &e).await;
            Redirect::to(back)
        }
    }
}
