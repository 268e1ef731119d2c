//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::types::Profile;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::Flash;
use crate::services::{EventService, ProfileService, ReservationService};
use crate::state::AppState;

use super::events::BookingView;
use super::reservations::{ReservationView, today};

/// Profile details for the account page.
#[derive(Clone, Default)]
pub struct ProfileView {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Greeting name, the email when no name is set.
    pub display_name: String,
    pub member_since: Option<String>,
}

impl ProfileView {
    fn new(email: &str, profile: Option<&Profile>) -> Self {
        let Some(profile) = profile else {
            return Self {
                email: email.to_string(),
                display_name: email.to_string(),
                ..Self::default()
            };
        };
        Self {
            email: email.to_string(),
            first_name: profile.first_name.clone().unwrap_or_default(),
            last_name: profile.last_name.clone().unwrap_or_default(),
            display_name: profile
                .display_name()
                .unwrap_or_else(|| email.to_string()),
            member_since: profile
                .created_at
                .map(|at| at.format("%B %Y").to_string()),
        }
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub ctx: PageContext,
    pub profile: ProfileView,
    pub reservations: Vec<ReservationView>,
    pub bookings: Vec<BookingView>,
}

/// Display the account overview: profile, reservations and event bookings.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
) -> impl IntoResponse {
    let backend = state.backend();
    let profile_service = ProfileService::new(backend, &user);
    let reservation_service = ReservationService::new(backend);
    let event_service = EventService::new(backend);

    let (profile, reservations, bookings) = tokio::join!(
        profile_service.get(),
        reservation_service.mine(&user),
        event_service.my_bookings(&user),
    );

    let profile = profile.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load profile");
        None
    });

    let today = today();
    let reservations = match reservations {
        Ok(rows) => rows.iter().map(|r| ReservationView::new(r, today)).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load reservations");
            ctx.flashes.push(Flash::error(
                "Error loading your reservations",
                e.user_message(),
            ));
            Vec::new()
        }
    };

    let bookings = match bookings {
        Ok(rows) => rows.iter().map(BookingView::from).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load bookings");
            ctx.flashes
                .push(Flash::error("Error loading your bookings", e.user_message()));
            Vec::new()
        }
    };

    AccountIndexTemplate {
        profile: ProfileView::new(user.email.as_str(), profile.as_ref()),
        reservations,
        bookings,
        ctx,
    }
}

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Update the user's first and last name.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Redirect {
    match ProfileService::new(state.backend(), &user)
        .update(&form.first_name, &form.last_name)
        .await
    {
        Ok(_) => {
            super::flash_redirect(&session, Flash::success("Profile updated", ""), "/account")
                .await
        }
        Err(e) => {
            super::flash_failure(&session, "Error updating profile", &e).await;
            Redirect::to("/account")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_view_falls_back_to_email() {
        let view = ProfileView::new("ada@example.com", None);
        assert_eq!(view.display_name, "ada@example.com");
        assert!(view.first_name.is_empty());

        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11",
            "user_id": "0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "created_at": "2024-02-10T08:00:00Z"
        }))
        .unwrap();
        let view = ProfileView::new("ada@example.com", Some(&profile));
        assert_eq!(view.display_name, "Ada Lovelace");
        assert_eq!(view.member_since.as_deref(), Some("February 2024"));
    }
}
