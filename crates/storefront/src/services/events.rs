//! Café events and the signed-in user's bookings.

use chrono::{DateTime, Utc};
use tracing::instrument;

use eco_brews_core::{BookingStatus, EventBookingId, EventId};

use crate::backend::types::{
    BookingStatusUpdate, Event, EventBooking, NewEventBooking, EVENT_BOOKING_SELECT,
};
use crate::backend::{BackendClient, CacheKey, CacheValue, Order, Table};
use crate::models::CurrentUser;

use super::ServiceError;

/// Event listing and bookings.
pub struct EventService<'a> {
    client: &'a BackendClient,
}

impl<'a> EventService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Active events from now on, soonest first.
    ///
    /// The list is cached; events that started since it was cached are
    /// dropped on read.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self))]
    pub async fn upcoming(&self) -> Result<Vec<Event>, ServiceError> {
        let events = if let Some(CacheValue::Events(events)) =
            self.client.cached(CacheKey::Events).await
        {
            events
        } else {
            let events: Vec<Event> = self
                .client
                .from(Table::Events)
                .select("*")
                .eq("is_active", true)
                .gte("event_date", Utc::now().to_rfc3339())
                .order("event_date", Order::Asc)
                .fetch()
                .await?;
            self.client
                .store(CacheKey::Events, CacheValue::Events(events.clone()))
                .await;
            events
        };

        Ok(not_started(events, Utc::now()))
    }

    /// Book a seat at an event for the signed-in user.
    ///
    /// The event is re-read uncached so the capacity check sees the current
    /// attendee count. Capacity accounting after the insert is the backend's.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown event, `Validation` for an inactive
    /// one, `SoldOut` when full, `AlreadyDone` when already booked, or a
    /// backend error.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn book(
        &self,
        user: &CurrentUser,
        event_id: EventId,
    ) -> Result<EventBooking, ServiceError> {
        let event: Event = self
            .client
            .from(Table::Events)
            .eq("id", event_id)
            .fetch_optional()
            .await?
            .ok_or(ServiceError::NotFound("Event"))?;

        check_bookable(&event, Utc::now())?;

        let existing: Option<EventBooking> = self
            .client
            .from(Table::EventBookings)
            .select(EVENT_BOOKING_SELECT)
            .eq("event_id", event_id)
            .eq("user_id", user.id)
            .eq("status", BookingStatus::Confirmed)
            .as_user(&user.access_token)
            .fetch_optional()
            .await?;
        if existing.is_some() {
            return Err(ServiceError::AlreadyDone(format!(
                "You're already booked for {}",
                event.title
            )));
        }

        let booking: EventBooking = self
            .client
            .from(Table::EventBookings)
            .as_user(&user.access_token)
            .insert(&NewEventBooking {
                event_id,
                user_id: user.id,
                status: BookingStatus::Confirmed,
            })
            .await?;

        self.client.invalidate(CacheKey::Events).await;
        tracing::info!(event = %event.title, booking_id = %booking.id, "Event booked");
        Ok(booking)
    }

    /// The user's bookings with their events, newest booking first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn my_bookings(&self, user: &CurrentUser) -> Result<Vec<EventBooking>, ServiceError> {
        Ok(self
            .client
            .from(Table::EventBookings)
            .select(EVENT_BOOKING_SELECT)
            .eq("user_id", user.id)
            .order("booking_date", Order::Desc)
            .as_user(&user.access_token)
            .fetch()
            .await?)
    }

    /// Cancel one of the user's bookings.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no booking of the user's matched, or a backend
    /// error.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel_booking(
        &self,
        user: &CurrentUser,
        booking_id: EventBookingId,
    ) -> Result<(), ServiceError> {
        let updated: Vec<EventBooking> = self
            .client
            .from(Table::EventBookings)
            .eq("id", booking_id)
            .eq("user_id", user.id)
            .as_user(&user.access_token)
            .update(&BookingStatusUpdate {
                status: BookingStatus::Cancelled,
            })
            .await?;

        if updated.is_empty() {
            return Err(ServiceError::NotFound("Booking"));
        }
        self.client.invalidate(CacheKey::Events).await;
        Ok(())
    }
}

fn not_started(events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
    events.into_iter().filter(|e| e.event_date >= now).collect()
}

/// Seats left, or `None` for an event without a cap.
#[must_use]
pub fn seats_left(event: &Event) -> Option<i32> {
    event
        .max_attendees
        .map(|max| (max - event.current_attendees.unwrap_or(0)).max(0))
}

fn check_bookable(event: &Event, now: DateTime<Utc>) -> Result<(), ServiceError> {
    if !event.is_active.unwrap_or(false) || event.event_date < now {
        return Err(ServiceError::Validation(format!(
            "{} is no longer taking bookings",
            event.title
        )));
    }
    if seats_left(event) == Some(0) {
        return Err(ServiceError::SoldOut(event.title.clone()));
    }
    Ok(())
}
