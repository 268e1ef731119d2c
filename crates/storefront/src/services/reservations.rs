//! Table reservations, for members and guests.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use eco_brews_core::{Email, ReservationId, ReservationStatus};

use crate::backend::types::{NewReservation, Reservation, ReservationStatusUpdate};
use crate::backend::{BackendClient, Order, Table};
use crate::models::CurrentUser;
use crate::site::{self, MAX_PARTY_SIZE};

use super::ServiceError;

/// The reservation form as posted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub party_size: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub special_requests: String,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ReservationForm {
    /// Check every field and build the insert body.
    ///
    /// All problems are collected so the form can show them together.
    ///
    /// # Errors
    ///
    /// Returns the list of field errors when any check fails.
    pub fn validate(
        &self,
        user: Option<&CurrentUser>,
        today: NaiveDate,
    ) -> Result<NewReservation, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Please enter your name".to_string());
        }

        let email = Email::parse(self.email.trim());
        if email.is_err() {
            errors.push("Please enter a valid email address".to_string());
        }

        let party_size = self.party_size.trim().parse::<i32>().ok();
        if !party_size.is_some_and(|n| (1..=MAX_PARTY_SIZE).contains(&n)) {
            errors.push(format!("Party size must be between 1 and {MAX_PARTY_SIZE}"));
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok();
        match date {
            None => errors.push("Please choose a date".to_string()),
            Some(d) if d < today => errors.push("Please choose a date from today on".to_string()),
            Some(_) => {}
        }

        let time = self.time.trim();
        if !site::is_time_slot(time) {
            errors.push("Please choose one of the available times".to_string());
        }

        let location = self.location.trim();
        if site::location(location).is_none() {
            errors.push("Please choose a location".to_string());
        }

        match (errors.is_empty(), email, party_size, date) {
            (true, Ok(email), Some(party_size), Some(reservation_date)) => Ok(NewReservation {
                user_id: user.map(|u| u.id),
                name: name.to_string(),
                email: email.into_inner(),
                phone: non_empty(&self.phone),
                party_size,
                reservation_date,
                reservation_time: time.to_string(),
                location_id: location.to_string(),
                special_requests: non_empty(&self.special_requests),
                status: ReservationStatus::Confirmed,
            }),
            _ => Err(errors),
        }
    }
}

/// Notice shown after a successful booking.
#[must_use]
pub fn confirmation_message(reservation: &Reservation) -> String {
    format!(
        "Your table for {} on {} at {} has been reserved.",
        reservation.party_size,
        reservation.reservation_date.format("%B %-d, %Y"),
        reservation.reservation_time
    )
}

/// Reservation reads and writes.
pub struct ReservationService<'a> {
    client: &'a BackendClient,
}

impl<'a> ReservationService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// The user's reservations, latest date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn mine(&self, user: &CurrentUser) -> Result<Vec<Reservation>, ServiceError> {
        Ok(self
            .client
            .from(Table::Reservations)
            .select("*")
            .eq("user_id", user.id)
            .order("reservation_date", Order::Desc)
            .order("reservation_time", Order::Desc)
            .as_user(&user.access_token)
            .fetch()
            .await?)
    }

    /// Store a validated reservation. Guests insert with the anon key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the row.
    #[instrument(skip(self, user, reservation), fields(party_size = reservation.party_size))]
    pub async fn create(
        &self,
        user: Option<&CurrentUser>,
        reservation: &NewReservation,
    ) -> Result<Reservation, ServiceError> {
        let query = self.client.from(Table::Reservations);
        let query = match user {
            Some(user) => query.as_user(&user.access_token),
            None => query,
        };
        let created: Reservation = query.insert(reservation).await?;

        tracing::info!(
            reservation_id = %created.id,
            location = %created.location_id,
            guest = user.is_none(),
            "Reservation created"
        );
        Ok(created)
    }

    /// Cancel one of the user's confirmed reservations.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when nothing cancellable matched, or a backend error.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel(&self, user: &CurrentUser, id: ReservationId) -> Result<(), ServiceError> {
        let updated: Vec<Reservation> = self
            .client
            .from(Table::Reservations)
            .eq("id", id)
            .eq("user_id", user.id)
            .eq("status", ReservationStatus::Confirmed)
            .as_user(&user.access_token)
            .update(&ReservationStatusUpdate {
                status: ReservationStatus::Cancelled,
            })
            .await?;

        if updated.is_empty() {
            return Err(ServiceError::NotFound("Reservation"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::RawQuery;
    use axum::http::{HeaderMap, Method};
    use axum::routing::any;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::backend::testing::spawn_backend;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn form() -> ReservationForm {
        ReservationForm {
            name: " Ada Lovelace ".to_string(),
            email: "ada@example.com".to_string(),
            phone: String::new(),
            party_size: "4".to_string(),
            date: "2024-06-12".to_string(),
            time: "18:30".to_string(),
            location: "downtown".to_string(),
            special_requests: "Window seat please".to_string(),
        }
    }

    #[test]
    fn test_valid_guest_form() {
        let reservation = form().validate(None, today()).unwrap();
        assert!(reservation.user_id.is_none());
        assert_eq!(reservation.name, "Ada Lovelace");
        assert_eq!(reservation.party_size, 4);
        assert!(reservation.phone.is_none());
        assert_eq!(reservation.special_requests.as_deref(), Some("Window seat please"));
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn test_today_is_allowed() {
        let mut form = form();
        form.date = "2024-06-10".to_string();
        assert!(form.validate(None, today()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let form = ReservationForm {
            party_size: "13".to_string(),
            date: "2024-06-09".to_string(),
            time: "18:45".to_string(),
            location: "moon-base".to_string(),
            email: "not-an-email".to_string(),
            ..ReservationForm::default()
        };
        let errors = form.validate(None, today()).unwrap_err();
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_party_size_bounds() {
        for (size, ok) in [("0", false), ("1", true), ("12", true), ("13", false), ("two", false)] {
            let mut form = form();
            form.party_size = size.to_string();
            assert_eq!(form.validate(None, today()).is_ok(), ok, "party size {size}");
        }
    }

    #[test]
    fn test_confirmation_names_party_date_and_time() {
        let reservation = Reservation {
            id: ReservationId::new(uuid::Uuid::from_u128(3)),
            user_id: None,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            party_size: 4,
            reservation_date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
            reservation_time: "18:30".to_string(),
            location_id: "downtown".to_string(),
            special_requests: None,
            status: Some(ReservationStatus::Confirmed),
            created_at: None,
            updated_at: None,
        };
        assert_eq!(
            confirmation_message(&reservation),
            "Your table for 4 on June 12, 2024 at 18:30 has been reserved."
        );
    }

    type Seen = Arc<Mutex<Vec<(Method, String, String, String)>>>;

    /// Echoes inserted rows back with an id; updates match nothing.
    fn reservations_router(seen: Seen) -> Router {
        Router::new().route(
            "/rest/v1/reservations",
            any(
                move |method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: String| {
                    let seen = seen.clone();
                    async move {
                        let bearer = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        seen.lock().unwrap().push((
                            method.clone(),
                            query.unwrap_or_default(),
                            bearer,
                            body.clone(),
                        ));
                        if method != Method::POST {
                            return axum::Json(serde_json::json!([]));
                        }
                        let mut row: serde_json::Value = serde_json::from_str(&body).unwrap();
                        row["id"] = "6f1c2f0e-4a57-4c71-9e38-0c1f3b6c0a11".into();
                        axum::Json(serde_json::json!([row]))
                    }
                },
            ),
        )
    }

    #[tokio::test]
    async fn test_guest_create_uses_anon_key() {
        let seen = Seen::default();
        let client = spawn_backend(reservations_router(seen.clone())).await;
        let reservation = form().validate(None, today()).unwrap();

        let created = ReservationService::new(&client)
            .create(None, &reservation)
            .await
            .unwrap();
        assert_eq!(created.party_size, 4);
        assert_eq!(created.status, Some(ReservationStatus::Confirmed));

        let seen = seen.lock().unwrap();
        let (_, _, bearer, body) = seen.first().unwrap();
        assert_eq!(bearer, "Bearer test-anon-key");
        let sent: serde_json::Value = serde_json::from_str(body).unwrap();
        assert!(sent["user_id"].is_null());
    }

    #[tokio::test]
    async fn test_cancel_filters_on_owner_and_status() {
        let seen = Seen::default();
        let client = spawn_backend(reservations_router(seen.clone())).await;
        let user = CurrentUser {
            id: eco_brews_core::UserId::new(uuid::Uuid::from_u128(42)),
            email: Email::parse("ada@example.com").unwrap(),
            access_token: "user-jwt".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        };

        let err = ReservationService::new(&client)
            .cancel(&user, ReservationId::new(uuid::Uuid::from_u128(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Reservation")));

        let seen = seen.lock().unwrap();
        let (method, query, bearer, _) = seen.first().unwrap();
        assert_eq!(*method, Method::PATCH);
        assert!(query.contains(&format!("user_id=eq.{}", user.id)));
        assert!(query.ends_with("status=eq.confirmed"));
        assert_eq!(bearer, "Bearer user-jwt");
    }
}
