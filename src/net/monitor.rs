use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::Connectivity;

/// Reachability check against a well-known endpoint.
///
/// Link state alone is not enough to call a network usable (captive portals,
/// dead upstreams), so this sends a real HEAD request with a short timeout
/// and only a 200 counts as online.
pub struct NetworkMonitor {
    client: Client,
    probe_url: String,
}

impl NetworkMonitor {
    pub fn new(probe_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(1))
            .connect_timeout(Duration::from_secs(1))
            .user_agent("skygaze/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client, probe_url }
    }
}

#[async_trait]
impl Connectivity for NetworkMonitor {
    async fn is_online(&self) -> bool {
        match self.client.head(&self.probe_url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!("Reachability probe failed: {e}");
                false
            }
        }
    }
}
