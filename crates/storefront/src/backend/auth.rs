//! Auth interface: password sign-in, sign-up and sign-out.
//!
//! The backend issues JWT access tokens. The storefront keeps the token in the
//! server-side session and sends it as the bearer on user-scoped table
//! requests so row policies apply.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use eco_brews_core::{Email, UserId};

use super::client::{BackendClient, Credential};
use super::BackendError;

/// Tokens issued after a successful sign-in.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// Expiry as a Unix timestamp, when the backend sends one.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

impl AuthSession {
    /// When the access token stops being accepted.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in))
    }
}

/// The account the tokens belong to.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Result of a sign-up.
#[derive(Debug)]
pub enum SignUpOutcome {
    /// Email confirmation is disabled; the user is signed in right away.
    SignedIn(AuthSession),
    /// The account exists but must be confirmed from the emailed link first.
    ConfirmationRequired(AuthUser),
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a serde_json::Value,
}

impl BackendClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidCredentials`] when the backend rejects
    /// the email/password pair, otherwise any request error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<AuthSession, BackendError> {
        let request = self
            .http()
            .post(format!("{}/token?grant_type=password", self.auth_url()))
            .json(&PasswordCredentials {
                email: email.as_str(),
                password,
            });
        let request = self.authorize(request, &Credential::Anon)?;
        let response = request.send().await?;

        let body = match Self::read_response("sign_in", response).await {
            Ok(body) => body,
            Err(BackendError::Api { status: 400, ref error }) if is_bad_credentials(error) => {
                return Err(BackendError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        Ok(serde_json::from_str(&body)?)
    }

    /// Create an account. `metadata` is stored as the user's metadata and is
    /// used by the backend to fill the profile row.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the account (e.g. email already
    /// registered, weak password) or the request fails.
    #[instrument(skip(self, password, metadata), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        metadata: &serde_json::Value,
    ) -> Result<SignUpOutcome, BackendError> {
        let request = self
            .http()
            .post(format!("{}/signup", self.auth_url()))
            .json(&SignUpRequest {
                email: email.as_str(),
                password,
                data: metadata,
            });
        let request = self.authorize(request, &Credential::Anon)?;
        let response = request.send().await?;
        let body = Self::read_response("sign_up", response).await?;

        parse_sign_up(&body)
    }

    /// Revoke the session behind `access_token`.
    ///
    /// An already expired token counts as signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any other reason.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let request = self.http().post(format!("{}/logout", self.auth_url()));
        let request = self.authorize(request, &Credential::User(access_token.to_string()))?;
        let response = request.send().await?;

        match Self::read_response("sign_out", response).await {
            Ok(_) | Err(BackendError::Unauthorized(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn is_bad_credentials(error: &super::ApiError) -> bool {
    error.error.as_deref() == Some("invalid_grant")
        || error.error_code.as_deref() == Some("invalid_credentials")
}

/// Sign-up answers with a session when confirmation is off, or with the bare
/// user (sometimes wrapped in `{"user": ...}`) when it is on.
fn parse_sign_up(body: &str) -> Result<SignUpOutcome, BackendError> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    if value.get("access_token").is_some() {
        return Ok(SignUpOutcome::SignedIn(serde_json::from_value(value)?));
    }

    let user = match value.get("user") {
        Some(user) if user.is_object() => user.clone(),
        _ => value,
    };
    Ok(SignUpOutcome::ConfirmationRequired(serde_json::from_value(
        user,
    )?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;

    use super::*;
    use crate::backend::testing::spawn_backend;

    const USER_ID: &str = "0b7e7d57-1c4e-4d1b-8a5a-4b0c7e1d2f33";

    fn session_json() -> serde_json::Value {
        serde_json::json!({
            "access_token": "jwt",
            "refresh_token": "refresh",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "user": {"id": USER_ID, "email": "ada@example.com", "user_metadata": {"first_name": "Ada"}}
        })
    }

    fn auth_router() -> Router {
        Router::new()
            .route(
                "/auth/v1/token",
                post(|body: String| async move {
                    if body.contains("wrong") {
                        (
                            StatusCode::BAD_REQUEST,
                            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#.to_string(),
                        )
                    } else {
                        (StatusCode::OK, session_json().to_string())
                    }
                }),
            )
            .route(
                "/auth/v1/signup",
                post(|| async {
                    axum::Json(serde_json::json!({
                        "id": USER_ID,
                        "email": "ada@example.com",
                        "confirmation_sent_at": "2024-05-01T10:00:00Z"
                    }))
                }),
            )
            .route(
                "/auth/v1/logout",
                post(|| async { (StatusCode::UNAUTHORIZED, r#"{"msg":"token expired"}"#) }),
            )
    }

    #[tokio::test]
    async fn test_sign_in_returns_session() {
        let client = spawn_backend(auth_router()).await;
        let email = Email::parse("ada@example.com").unwrap();

        let session = client.sign_in(&email, "correct horse").await.unwrap();

        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.user.id.to_string(), USER_ID);
        assert_eq!(session.expires_at().timestamp(), 1_900_000_000);
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_password() {
        let client = spawn_backend(auth_router()).await;
        let email = Email::parse("ada@example.com").unwrap();

        let err = client.sign_in(&email, "wrong").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_sign_up_requiring_confirmation() {
        let client = spawn_backend(auth_router()).await;
        let email = Email::parse("ada@example.com").unwrap();

        let outcome = client
            .sign_up(&email, "correct horse", &serde_json::json!({"first_name": "Ada"}))
            .await
            .unwrap();

        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(ref u) if u.email.as_deref() == Some("ada@example.com")));
    }

    #[tokio::test]
    async fn test_sign_out_with_expired_token() {
        let client = spawn_backend(auth_router()).await;
        client.sign_out("stale").await.unwrap();
    }

    #[test]
    fn test_parse_sign_up_with_session() {
        let outcome = parse_sign_up(&session_json().to_string()).unwrap();
        assert!(matches!(outcome, SignUpOutcome::SignedIn(ref s) if s.refresh_token == "refresh"));
    }

    #[test]
    fn test_parse_sign_up_with_wrapped_user() {
        let body = format!(r#"{{"user":{{"id":"{USER_ID}","email":"ada@example.com"}},"session":null}}"#);
        let outcome = parse_sign_up(&body).unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session: AuthSession = serde_json::from_value(session_json()).unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("jwt"));
        assert!(debug.contains("[REDACTED]"));
    }
}
