use anyhow::Result;
use async_trait::async_trait;

use super::{ConfigSource, FetchMethod};
use crate::models::DeviceDescriptor;

/// Fetches the running datastore with a NETCONF <get-config>.
/// The XML reply is passed through as-is; there is no parsed form.
pub struct NetconfSource {
    port: u16,
    timeout_secs: u64,
}

impl NetconfSource {
    pub fn new(port: u16, timeout_secs: u64) -> Self {
        Self { port, timeout_secs }
    }
}

#[async_trait]
impl ConfigSource for NetconfSource {
    fn method(&self) -> FetchMethod {
        FetchMethod::Netconf
    }

    async fn fetch(&self, device: &DeviceDescriptor) -> Result<String> {
        crate::utils::netconf_get_config_async(
            &device.host,
            self.port,
            &device.username,
            &device.password,
            self.timeout_secs,
        )
        .await
        .map_err(|e| anyhow::anyhow!(e))
    }
}
