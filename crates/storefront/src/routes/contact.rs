//! Contact page route handlers.
//!
//! Accepted messages are written to the log; there is no mail delivery.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, http::StatusCode, response::{IntoResponse, Response}};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use eco_brews_core::Email;

use crate::filters;
use crate::middleware::PageContext;
use crate::models::Flash;
use crate::site::{LOCATIONS, Location};

/// Longest accepted message body.
const MAX_MESSAGE_LEN: usize = 5000;

/// Longest accepted name or subject.
const MAX_FIELD_LEN: usize = 200;

/// Contact form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Every problem with the form, empty when it can be accepted.
    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            problems.push("Please enter your name".to_string());
        } else if name.chars().count() > MAX_FIELD_LEN {
            problems.push(format!("Name can be at most {MAX_FIELD_LEN} characters"));
        }

        if Email::parse(self.email.trim()).is_err() {
            problems.push("Please enter a valid email address".to_string());
        }

        let subject = self.subject.trim();
        if subject.is_empty() {
            problems.push("Please enter a subject".to_string());
        } else if subject.chars().count() > MAX_FIELD_LEN {
            problems.push(format!("Subject can be at most {MAX_FIELD_LEN} characters"));
        }

        let message = self.message.trim();
        if message.is_empty() {
            problems.push("Please enter a message".to_string());
        } else if message.chars().count() > MAX_MESSAGE_LEN {
            problems.push(format!("Message can be at most {MAX_MESSAGE_LEN} characters"));
        }

        problems
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub ctx: PageContext,
    pub locations: &'static [Location],
    pub form: ContactForm,
    pub errors: Vec<String>,
}

/// Display the contact page.
pub async fn page(ctx: PageContext) -> impl IntoResponse {
    let form = ContactForm {
        email: ctx.user_email().to_string(),
        ..ContactForm::default()
    };
    ContactTemplate {
        ctx,
        locations: LOCATIONS,
        form,
        errors: Vec::new(),
    }
}

/// Handle a contact form submission.
///
/// Invalid input re-renders the page with the entries kept.
#[instrument(skip_all)]
pub async fn submit(session: Session, ctx: PageContext, Form(form): Form<ContactForm>) -> Response {
    let errors = form.problems();
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            ContactTemplate {
                ctx,
                locations: LOCATIONS,
                form,
                errors,
            },
        )
            .into_response();
    }

    tracing::info!(
        name = %form.name.trim(),
        email = %form.email.trim(),
        subject = %form.subject.trim(),
        message = %form.message.trim(),
        "Contact message received"
    );

    super::flash_redirect(
        &session,
        Flash::success(
            "Message sent!",
            "Thank you for your message. We'll get back to you soon.",
        ),
        "/contact",
    )
    .await
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, subject: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_valid_form_has_no_problems() {
        let form = form("Ada", "ada@example.com", "Catering", "Do you cater events?");
        assert!(form.problems().is_empty());
    }

    #[test]
    fn test_every_problem_is_reported() {
        let problems = form(" ", "not-an-email", "", "").problems();
        assert_eq!(problems.len(), 4);
    }

    #[test]
    fn test_message_length_is_capped() {
        let long = "a".repeat(MAX_MESSAGE_LEN + 1);
        let problems = form("Ada", "ada@example.com", "Hi", &long).problems();
        assert_eq!(problems, vec![format!("Message can be at most {MAX_MESSAGE_LEN} characters")]);
    }
}
