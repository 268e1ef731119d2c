//! Subcommand implementations.

pub mod check;
pub mod loyalty;
pub mod seed;

use eco_brews_storefront::backend::BackendClient;
use eco_brews_storefront::config::BackendConfig;

/// Backend client from the same environment variables the storefront reads.
///
/// # Errors
///
/// Returns an error if the backend settings are missing or invalid.
pub fn backend_client() -> Result<BackendClient, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = BackendConfig::from_env()?;
    Ok(BackendClient::new(&config))
}
