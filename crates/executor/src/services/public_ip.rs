use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

const IPIFY_URL: &str = "https://api.ipify.org?format=json";

#[derive(Debug, Deserialize)]
struct IpifyResponse {
    ip: String,
}

/// Outbound IP as seen by the internet. Exchange API keys are usually
/// restricted to a whitelist, so this is logged at startup.
pub async fn log_public_ip() {
    let client = match Client::builder().timeout(Duration::from_secs(5)).build() {
        Ok(client) => client,
        Err(e) => {
            warn!("Could not build HTTP client for IP lookup: {}", e);
            return;
        }
    };

    let result = async {
        client
            .get(IPIFY_URL)
            .send()
            .await?
            .error_for_status()?
            .json::<IpifyResponse>()
            .await
    }
    .await;

    match result {
        Ok(resp) => info!("Public IP: {}", resp.ip),
        Err(e) => warn!("Failed to resolve public IP: {}", e),
    }
}
