//! Newsletter sign-ups.

use tracing::instrument;

use eco_brews_core::Email;

use crate::backend::types::NewSubscription;
use crate::backend::{BackendClient, Table};

use super::ServiceError;

/// Result of a sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscribed {
    New,
    /// The address was already on the list.
    Existing,
}

pub struct NewsletterService<'a> {
    client: &'a BackendClient,
}

impl<'a> NewsletterService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient) -> Self {
        Self { client }
    }

    /// Add an address to the list. An address already on it is a success.
    ///
    /// # Errors
    ///
    /// Returns an error for any backend failure other than a duplicate.
    #[instrument(skip(self), fields(email_domain = %email.domain()))]
    pub async fn subscribe(&self, email: &Email) -> Result<Subscribed, ServiceError> {
        let result = self
            .client
            .from(Table::NewsletterSubscriptions)
            .insert_minimal(&NewSubscription {
                email: email.as_str().to_string(),
                is_active: true,
            })
            .await;

        match result {
            Ok(()) => {
                tracing::info!("Newsletter subscription added");
                Ok(Subscribed::New)
            }
            Err(e) if e.is_unique_violation() => Ok(Subscribed::Existing),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    use super::*;
    use crate::backend::testing::spawn_backend;

    fn newsletter_router() -> Router {
        Router::new().route(
            "/rest/v1/newsletter_subscriptions",
            post(|headers: HeaderMap, body: String| async move {
                assert_eq!(headers["prefer"], "return=minimal");
                if body.contains("taken@example.com") {
                    (
                        StatusCode::CONFLICT,
                        r#"{"code":"23505","message":"duplicate key value violates unique constraint \"newsletter_subscriptions_email_key\""}"#,
                    )
                } else if body.contains("broken@example.com") {
                    (StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"boom"}"#)
                } else {
                    (StatusCode::CREATED, "")
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_new_and_duplicate_are_both_success() {
        let client = spawn_backend(newsletter_router()).await;
        let service = NewsletterService::new(&client);

        let fresh = Email::parse("new@example.com").unwrap();
        assert_eq!(service.subscribe(&fresh).await.unwrap(), Subscribed::New);

        let taken = Email::parse("taken@example.com").unwrap();
        assert_eq!(service.subscribe(&taken).await.unwrap(), Subscribed::Existing);
    }

    #[tokio::test]
    async fn test_other_failures_propagate() {
        let client = spawn_backend(newsletter_router()).await;
        let broken = Email::parse("broken@example.com").unwrap();

        let err = NewsletterService::new(&client)
            .subscribe(&broken)
            .await
            .unwrap_err();
        assert!(err.is_internal());
    }
}
