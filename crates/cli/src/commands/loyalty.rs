//! Manual loyalty adjustments.

use tracing::info;

use eco_brews_core::UserId;
use eco_brews_storefront::services::LoyaltyService;

/// Credit `points` to a member's balance and record the ledger entry.
///
/// Runs with the service-role key, so the member does not need to be signed
/// in. A missing account is created at `Seed` first.
///
/// # Errors
///
/// Returns an error if the service key is missing, `points` is not positive,
/// or the backend rejects the write.
pub async fn award(user: UserId, points: i64, reason: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = super::backend_client()?;
    if !client.has_service_key() {
        return Err("BACKEND_SERVICE_KEY not set".into());
    }

    let account = LoyaltyService::for_service(&client, user)
        .add_points(points, reason)
        .await?;

    info!(
        user_id = %user,
        points,
        balance = account.points,
        tier = account.tier.as_deref().unwrap_or_default(),
        "Points awarded"
    );
    Ok(())
}
