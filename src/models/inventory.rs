use serde::{Deserialize, Serialize};

/// Connection parameters for a single network device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Transport/platform kind, e.g. "cisco_ios"
    pub device_type: String,
    pub host: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl DeviceDescriptor {
    pub fn ssh_port(&self) -> u16 {
        self.port.unwrap_or(22)
    }
}

/// Reference to a device type by model name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRef {
    pub model: String,
}

/// Reference to a Nautobot object by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
}

impl NameRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// InventoryRecord is the device metadata pushed to Nautobot, keyed by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub name: String,
    pub device_type: ModelRef,
    pub manufacturer: String,
    pub role: NameRef,
    pub location: NameRef,
    pub status: NameRef,
    pub serial: String,
}

fn default_status() -> String {
    "Active".to_string()
}

/// Field values shared by every device of one environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentProfile {
    pub manufacturer: String,
    pub model: String,
    pub role: String,
    pub location: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub serial: String,
}

impl EnvironmentProfile {
    /// Build the inventory record for a device of this environment
    pub fn record_for(&self, device_name: &str) -> InventoryRecord {
        InventoryRecord {
            name: device_name.to_string(),
            device_type: ModelRef {
                model: self.model.clone(),
            },
            manufacturer: self.manufacturer.clone(),
            role: NameRef::new(&self.role),
            location: NameRef::new(&self.location),
            status: NameRef::new(&self.status),
            serial: self.serial.clone(),
        }
    }
}
