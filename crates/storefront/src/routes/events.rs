//! Event listing and booking route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use eco_brews_core::{BookingStatus, EventBookingId, EventId, Price};

use crate::backend::types::{Event, EventBooking};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::Flash;
use crate::services::EventService;
use crate::services::events::seats_left;
use crate::state::AppState;

/// An upcoming event card.
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub date: String,
    pub time: String,
    pub duration: Option<String>,
    pub location: String,
    pub price: String,
    /// "5 seats left", "Sold out", or empty for uncapped events.
    pub seats: String,
    pub sold_out: bool,
    /// The signed-in user already holds a confirmed booking.
    pub booked: bool,
}

impl EventView {
    fn new(event: &Event, booked: bool) -> Self {
        let seats = seats_left(event);
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            image_url: event.image_url.clone(),
            date: event.event_date.format("%A, %B %-d").to_string(),
            time: event.event_date.format("%-I:%M %p").to_string(),
            duration: event.duration_minutes.map(format_duration),
            location: event
                .location
                .clone()
                .unwrap_or_else(|| "Eco Brews".to_string()),
            price: event
                .price
                .filter(|p| *p > Price::ZERO)
                .map_or_else(|| "Free".to_string(), |p| p.display()),
            seats: match seats {
                Some(0) => "Sold out".to_string(),
                Some(1) => "1 seat left".to_string(),
                Some(n) => format!("{n} seats left"),
                None => String::new(),
            },
            sold_out: seats == Some(0),
            booked,
        }
    }
}

/// `90` → `"1h 30m"`, `45` → `"45m"`.
fn format_duration(minutes: i32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// One of the user's bookings.
pub struct BookingView {
    pub id: EventBookingId,
    pub title: String,
    pub date: String,
    pub location: String,
    pub status: &'static str,
    pub cancellable: bool,
}

impl From<&EventBooking> for BookingView {
    fn from(booking: &EventBooking) -> Self {
        let status = booking.status.unwrap_or_default();
        let (title, date, location, upcoming) = booking.events.as_ref().map_or_else(
            || ("Event no longer listed".to_string(), String::new(), String::new(), false),
            |event| {
                (
                    event.title.clone(),
                    event.event_date.format("%B %-d, %Y at %-I:%M %p").to_string(),
                    event.location.clone().unwrap_or_default(),
                    event.event_date >= chrono::Utc::now(),
                )
            },
        );
        Self {
            id: booking.id,
            title,
            date,
            location,
            status: status.as_str(),
            cancellable: status == BookingStatus::Confirmed && upcoming,
        }
    }
}

/// Events page template.
#[derive(Template, WebTemplate)]
#[template(path = "events/index.html")]
pub struct EventsTemplate {
    pub ctx: PageContext,
    pub events: Vec<EventView>,
    pub bookings: Vec<BookingView>,
    pub unavailable: bool,
}

/// Display upcoming events and, for signed-in users, their bookings.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, mut ctx: PageContext) -> impl IntoResponse {
    let service = EventService::new(state.backend());

    let mut bookings = Vec::new();
    if let Some(user) = &ctx.user {
        match service.my_bookings(user).await {
            Ok(rows) => bookings = rows,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load bookings");
                ctx.flashes
                    .push(Flash::error("Error loading your bookings", e.user_message()));
            }
        }
    }

    let (events, unavailable) = match service.upcoming().await {
        Ok(events) => (events, false),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load events");
            (Vec::new(), true)
        }
    };

    let is_booked = |event: &Event| {
        bookings.iter().any(|b| {
            b.event_id == event.id && b.status.unwrap_or_default() == BookingStatus::Confirmed
        })
    };

    EventsTemplate {
        events: events
            .iter()
            .map(|event| EventView::new(event, is_booked(event)))
            .collect(),
        bookings: bookings.iter().map(BookingView::from).collect(),
        unavailable,
        ctx,
    }
}

/// Book a seat at an event.
#[instrument(skip(state, session, user))]
pub async fn book(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<EventId>,
) -> Redirect {
    match EventService::new(state.backend()).book(&user, id).await {
        Ok(_) => {
            add_breadcrumb("events", "Booked event", None);
            super::flash_redirect(
                &session,
                Flash::success("You're booked!", "We've saved you a seat"),
                "/events",
            )
            .await
        }
        Err(e) => {
            super::flash_failure(&session, "Booking failed", &e).await;
            Redirect::to("/events")
        }
    }
}

/// Cancel one of the user's bookings.
#[instrument(skip(state, session, user))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<EventBookingId>,
) -> Redirect {
    match EventService::new(state.backend())
        .cancel_booking(&user, id)
        .await
    {
        Ok(()) => {
            super::flash_redirect(&session, Flash::info("Booking cancelled", ""), "/events").await
        }
        Err(e) => {
            super::flash_failure(&session, "Could not cancel booking", &e).await;
            Redirect::to("/events")
        }
    }
}
