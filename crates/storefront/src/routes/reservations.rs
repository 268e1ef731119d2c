//! Table reservation route handlers.
//!
//! Guests may reserve without signing in; signed-in users also see and cancel
//! their own reservations here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use tower_sessions::Session;
use tracing::instrument;

use eco_brews_core::ReservationId;

use crate::backend::types::Reservation;
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{CurrentUser, Flash};
use crate::services::ReservationService;
use crate::services::reservations::{ReservationForm, confirmation_message};
use crate::site::{self, LOCATIONS, Location, MAX_PARTY_SIZE, TIME_SLOTS};
use crate::state::AppState;

/// One of the user's reservations, ready for display.
pub struct ReservationView {
    pub id: ReservationId,
    pub date: String,
    pub time: String,
    pub party_size: i32,
    pub location: String,
    pub status: &'static str,
    pub cancellable: bool,
}

impl ReservationView {
    pub(crate) fn new(reservation: &Reservation, today: NaiveDate) -> Self {
        let status = reservation.status.unwrap_or_default();
        Self {
            id: reservation.id,
            date: reservation
                .reservation_date
                .format("%a, %B %-d, %Y")
                .to_string(),
            time: reservation.reservation_time.clone(),
            party_size: reservation.party_size,
            location: site::location_name(&reservation.location_id).to_string(),
            status: status.as_str(),
            cancellable: status.is_cancellable() && reservation.reservation_date >= today,
        }
    }
}

/// Reservation page template.
#[derive(Template, WebTemplate)]
#[template(path = "reservations/page.html")]
pub struct ReservationTemplate {
    pub ctx: PageContext,
    pub form: ReservationForm,
    pub errors: Vec<String>,
    pub locations: &'static [Location],
    pub time_slots: &'static [&'static str],
    pub max_party_size: i32,
    /// `YYYY-MM-DD`, the earliest date the picker allows.
    pub min_date: String,
    pub reservations: Vec<ReservationView>,
}

impl ReservationTemplate {
    /// Party sizes offered by the picker.
    #[must_use]
    pub fn party_sizes(&self) -> std::ops::RangeInclusive<i32> {
        1..=self.max_party_size
    }

    #[must_use]
    pub fn party_selected(&self, size: impl ToString) -> bool {
        self.form.party_size.trim() == size.to_string()
    }

    #[must_use]
    pub fn time_selected(&self, slot: &str) -> bool {
        self.form.time == slot
    }

    #[must_use]
    pub fn location_selected(&self, id: &str) -> bool {
        self.form.location == id
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Empty form, with the signed-in user's email filled in.
fn blank_form(user: Option<&CurrentUser>) -> ReservationForm {
    ReservationForm {
        email: user.map(|u| u.email.to_string()).unwrap_or_default(),
        party_size: "2".to_string(),
        ..ReservationForm::default()
    }
}

async fn render(
    state: &AppState,
    mut ctx: PageContext,
    form: ReservationForm,
    errors: Vec<String>,
) -> ReservationTemplate {
    let today = today();
    let mut reservations = Vec::new();

    if let Some(user) = &ctx.user {
        match ReservationService::new(state.backend()).mine(user).await {
            Ok(rows) => {
                reservations = rows
                    .iter()
                    .map(|r| ReservationView::new(r, today))
                    .collect();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load reservations");
                ctx.flashes.push(Flash::error(
                    "Error loading your reservations",
                    e.user_message(),
                ));
            }
        }
    }

    ReservationTemplate {
        ctx,
        form,
        errors,
        locations: LOCATIONS,
        time_slots: TIME_SLOTS,
        max_party_size: MAX_PARTY_SIZE,
        min_date: today.format("%Y-%m-%d").to_string(),
        reservations,
    }
}

/// Display the reservation form and the user's reservations.
#[instrument(skip_all)]
pub async fn page(State(state): State<AppState>, ctx: PageContext) -> impl IntoResponse {
    let form = blank_form(ctx.user.as_ref());
    render(&state, ctx, form, Vec::new()).await
}

/// Create a reservation.
///
/// Invalid input re-renders the form with every problem listed and the
/// visitor's entries kept.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<ReservationForm>,
) -> Response {
    let user = ctx.user.clone();

    let reservation = match form.validate(user.as_ref(), today()) {
        Ok(reservation) => reservation,
        Err(errors) => {
            tracing::info!(count = errors.len(), "Reservation form rejected");
            let page = render(&state, ctx, form, errors).await;
            return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
        }
    };

    match ReservationService::new(state.backend())
        .create(user.as_ref(), &reservation)
        .await
    {
        Ok(created) => {
            add_breadcrumb("reservation", "Table reserved", None);
            super::flash_redirect(
                &session,
                Flash::success("Reservation confirmed!", confirmation_message(&created)),
                "/reservation",
            )
            .await
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create reservation");
            let mut page = render(&state, ctx, form, Vec::new()).await;
            page.ctx
                .flashes
                .push(Flash::error("Reservation failed", e.user_message()));
            (StatusCode::BAD_GATEWAY, page).into_response()
        }
    }
}

/// Cancel one of the user's reservations.
#[instrument(skip(state, session, user))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ReservationId>,
) -> Redirect {
    match ReservationService::new(state.backend())
        .cancel(&user, id)
        .await
    {
        Ok(()) => {
            super::flash_redirect(
                &session,
                Flash::info("Reservation cancelled", "We hope to see you another time"),
                "/reservation",
            )
            .await
        }
        Err(e) => {
            super::flash_failure(&session, "Could not cancel reservation", &e).await;
            Redirect::to("/reservation")
        }
    }
}
