//! The signed-in user's profile row.

use tracing::instrument;

use crate::backend::types::{Profile, ProfileUpdate};
use crate::backend::{BackendClient, Table};
use crate::models::CurrentUser;

use super::ServiceError;

/// Longest accepted first or last name.
const MAX_NAME_LEN: usize = 80;

pub struct ProfileService<'a> {
    client: &'a BackendClient,
    user: &'a CurrentUser,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(client: &'a BackendClient, user: &'a CurrentUser) -> Self {
        Self { client, user }
    }

    /// The profile row, if the backend has created one yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend request fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn get(&self) -> Result<Option<Profile>, ServiceError> {
        Ok(self
            .client
            .from(Table::Profiles)
            .eq("user_id", self.user.id)
            .as_user(&self.user.access_token)
            .fetch_optional()
            .await?)
    }

    /// Set the first and last name, creating the row if missing.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an over-long name, or a backend error.
    #[instrument(skip(self, first_name, last_name), fields(user_id = %self.user.id))]
    pub async fn update(&self, first_name: &str, last_name: &str) -> Result<Profile, ServiceError> {
        let update = ProfileUpdate {
            user_id: self.user.id,
            email: self.user.email.as_str().to_string(),
            first_name: clean_name(first_name)?,
            last_name: clean_name(last_name)?,
        };

        Ok(self
            .client
            .from(Table::Profiles)
            .as_user(&self.user.access_token)
            .upsert(&update, "user_id")
            .await?)
    }
}

fn clean_name(name: &str) -> Result<Option<String>, ServiceError> {
    let name = name.trim();
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::Validation(format!(
            "Names can be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok((!name.is_empty()).then(|| name.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  Ada ").unwrap().as_deref(), Some("Ada"));
        assert_eq!(clean_name("   ").unwrap(), None);
        assert!(clean_name(&"x".repeat(81)).is_err());
    }
}
