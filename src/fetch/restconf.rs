use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{ConfigSource, FetchMethod};
use crate::models::DeviceDescriptor;

const NATIVE_CONFIG_PATH: &str = "/restconf/data/Cisco-IOS-XE-native:native";

/// Fetches the native configuration tree over RESTCONF.
/// The payload is passed through as-is; there is no parsed form.
pub struct RestconfSource {
    client: Client,
}

impl RestconfSource {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            // Lab devices present self-signed certificates
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

pub fn restconf_url(host: &str) -> String {
    format!("https://{}{}", host, NATIVE_CONFIG_PATH)
}

#[async_trait]
impl ConfigSource for RestconfSource {
    fn method(&self) -> FetchMethod {
        FetchMethod::Restconf
    }

    async fn fetch(&self, device: &DeviceDescriptor) -> Result<String> {
        let resp = self
            .client
            .get(restconf_url(&device.host))
            .basic_auth(&device.username, Some(&device.password))
            .header("Accept", "application/yang-data+json")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("RESTCONF error {}: {}", status, body));
        }

        Ok(resp.text().await?)
    }
}
