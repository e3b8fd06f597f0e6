use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::models::{DeviceDescriptor, EnvironmentProfile};

/// Inventory is the device list of one environment plus its profile
#[derive(Debug, Clone, Deserialize)]
pub struct Inventory {
    pub profile: EnvironmentProfile,
    #[serde(default)]
    pub devices: Vec<DeviceDescriptor>,
}

impl Inventory {
    /// Load and validate an inventory file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid inventory file {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let inventory: Inventory = serde_json::from_str(content)?;
        inventory.validate()?;
        Ok(inventory)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                anyhow::bail!("device with host {} has an empty name", device.host);
            }
            if device.host.trim().is_empty() {
                anyhow::bail!("device {} has an empty host", device.name);
            }
            if !seen.insert(device.name.as_str()) {
                anyhow::bail!("duplicate device name: {}", device.name);
            }
        }
        if self.devices.is_empty() {
            tracing::warn!("Inventory contains no devices");
        }
        Ok(())
    }
}
