//! Backend reachability check.

use tracing::info;

/// Ping the backend's auth health endpoint.
///
/// # Errors
///
/// Returns an error if configuration is missing or the backend is unhealthy.
pub async fn backend() -> Result<(), Box<dyn std::error::Error>> {
    let client = super::backend_client()?;
    client.health().await?;
    info!(service_key = client.has_service_key(), "Backend is healthy");
    Ok(())
}
