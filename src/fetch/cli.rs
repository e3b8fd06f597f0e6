use anyhow::Result;
use async_trait::async_trait;

use super::{ConfigSource, FetchMethod};
use crate::models::{DeviceDescriptor, ParsedConfig};
use crate::parser;

/// Fetches the running configuration with a CLI command over SSH
pub struct CliSource {
    command_override: Option<String>,
    timeout_secs: u64,
}

impl CliSource {
    pub fn new(command_override: Option<String>, timeout_secs: u64) -> Self {
        Self {
            command_override,
            timeout_secs,
        }
    }

    /// Determine the command for a device, preferring the configured override
    pub fn command_for(&self, device_type: &str) -> String {
        if let Some(cmd) = &self.command_override {
            return cmd.clone();
        }
        default_command(device_type).to_string()
    }
}

fn default_command(device_type: &str) -> &'static str {
    let kind = device_type.to_lowercase();
    if kind.starts_with("juniper") {
        "show configuration | display set"
    } else if kind.starts_with("linux") {
        "cat /etc/network/interfaces"
    } else {
        "show running-config"
    }
}

#[async_trait]
impl ConfigSource for CliSource {
    fn method(&self) -> FetchMethod {
        FetchMethod::Cli
    }

    async fn fetch(&self, device: &DeviceDescriptor) -> Result<String> {
        let command = self.command_for(&device.device_type);
        tracing::debug!(
            "Running '{}' on {} ({}, {})",
            command,
            device.name,
            device.host,
            device.device_type
        );

        let output = crate::utils::ssh_run_command_async(
            &device.host,
            device.ssh_port(),
            &device.username,
            &device.password,
            &command,
            self.timeout_secs,
        )
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

        if output.trim().is_empty() {
            anyhow::bail!("empty configuration returned by {}", device.host);
        }
        Ok(output)
    }

    fn parse(&self, raw: &str) -> Option<ParsedConfig> {
        Some(parser::parse_running_config(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_for_device_type() {
        let source = CliSource::new(None, 30);
        assert_eq!(source.command_for("cisco_ios"), "show running-config");
        assert_eq!(source.command_for("arista_eos"), "show running-config");
        assert_eq!(source.command_for("juniper_junos"), "show configuration | display set");

        let source = CliSource::new(Some("show startup-config".to_string()), 30);
        assert_eq!(source.command_for("juniper_junos"), "show startup-config");
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_errors() {
        let source = CliSource::new(None, 2);
        let device = DeviceDescriptor {
            device_type: "cisco_ios".to_string(),
            host: "127.0.0.1".to_string(),
            username: "cisco".to_string(),
            password: "cisco".to_string(),
            name: "R1".to_string(),
            port: Some(1),
        };
        assert!(source.fetch(&device).await.is_err());
    }
}
