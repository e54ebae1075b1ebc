use crate::HEALTH_ENDPOINT;

use std::time::Duration;

use log::debug;
use reqwest::Client;

const CHECK_HEALTH_DURATION: Duration = Duration::from_secs(3);

/// Check if a project server is responding.
///
/// Performs a GET request to {base_url}/api/health with a 3-second timeout.
///
/// # Arguments
///
/// * `base_url` - Base URL of the server (e.g., "http://localhost:8070")
///
/// # Returns
///
/// * `true` - If the server responds with HTTP 2xx
/// * `false` - If the request fails or times out
pub async fn check_health(base_url: &str) -> bool {
    let url = format!("{base_url}{HEALTH_ENDPOINT}");
    let client = Client::new();

    match client.get(&url).timeout(CHECK_HEALTH_DURATION).send().await {
        Ok(resp) if resp.status().is_success() => {
            debug!("Health check succeeded for {base_url}");
            true
        }
        Ok(resp) => {
            debug!(
                "Health check failed for {base_url}: status={}",
                resp.status()
            );
            false
        }
        Err(e) => {
            debug!("Health check failed for {base_url}: {e}");
            false
        }
    }
}
