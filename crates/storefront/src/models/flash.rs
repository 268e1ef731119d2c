//! One-shot notices shown on the next rendered page.
//!
//! Handlers push a [`Flash`] before redirecting; the page context takes and
//! clears them when the next page renders.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::session::keys;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

/// A notice with a short title and a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub title: String,
    pub description: String,
}

impl Flash {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, title, description)
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, title, description)
    }

    fn new(level: FlashLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
        }
    }

    /// CSS modifier class for the notice.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "notice--success",
            FlashLevel::Info => "notice--info",
            FlashLevel::Error => "notice--error",
        }
    }

    /// ARIA role: errors interrupt, everything else is polite.
    #[must_use]
    pub const fn role(&self) -> &'static str {
        match self.level {
            FlashLevel::Error => "alert",
            FlashLevel::Success | FlashLevel::Info => "status",
        }
    }
}

/// Queue a notice for the next page.
///
/// Failures are logged rather than returned; a lost notice must not fail the
/// request that produced it.
pub async fn push(session: &Session, flash: Flash) {
    let mut pending: Vec<Flash> = session
        .get(keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(flash);

    if let Err(e) = session.insert(keys::FLASHES, pending).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take every pending notice, clearing the queue.
pub async fn take(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
