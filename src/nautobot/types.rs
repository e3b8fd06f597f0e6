use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Nautobot API types ---

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: i32,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbManufacturer {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbDeviceType {
    pub id: Uuid,
    pub model: String,
}

/// Named reference data: roles, locations, statuses, namespaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbNamed {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbDevice {
    pub id: Uuid,
    pub name: Option<String>,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub local_config_context_data: Option<serde_json::Value>,
    #[serde(default)]
    pub location: Option<serde_json::Value>,
}

impl NbDevice {
    /// Location ID, whether the API returned a bare ID or a nested object
    pub fn location_id(&self) -> Option<Uuid> {
        let value = self.location.as_ref()?;
        value.get("id").unwrap_or(value).as_str()?.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbInterface {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbVlan {
    pub id: Uuid,
    pub vid: u16,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbIpAddress {
    pub id: Uuid,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbIpToInterface {
    pub id: Uuid,
}

// --- Write request types ---

#[derive(Debug, Serialize)]
pub(crate) struct ManufacturerCreate {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceTypeCreate {
    pub manufacturer: Uuid,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleCreate {
    pub name: String,
    pub content_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceWrite {
    pub name: String,
    pub device_type: Uuid,
    pub role: Uuid,
    pub location: Uuid,
    pub status: Uuid,
    pub serial: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct InterfaceWrite {
    pub device: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub iface_type: String,
    pub status: Uuid,
    pub enabled: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VlanWrite {
    pub vid: u16,
    pub name: String,
    pub status: Uuid,
    pub location: Uuid,
}

#[derive(Debug, Serialize)]
pub(crate) struct IpAddressCreate {
    pub address: String,
    pub status: Uuid,
    pub namespace: Uuid,
    #[serde(rename = "type")]
    pub ip_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct IpToInterfaceCreate {
    pub ip_address: Uuid,
    pub interface: Uuid,
}

#[derive(Debug, Serialize)]
pub(crate) struct InterfaceVlanPatch {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub untagged_vlan: Option<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tagged_vlans: Vec<Uuid>,
}

// --- Results ---

/// Outcome of a device create-or-update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Created(Uuid),
    Updated(Uuid),
}

impl PushOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            PushOutcome::Created(id) | PushOutcome::Updated(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncCounts {
    pub created: i32,
    pub updated: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SyncCounts {
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} errors",
            self.created,
            self.updated,
            self.errors.len()
        )
    }
}

// --- Errors ---

/// Non-success response from the Nautobot API
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nautobot API error {}: {}", self.status, self.body)
    }
}

impl std::error::Error for ApiError {}

/// Reference data that must already exist in Nautobot
#[derive(Debug)]
pub struct MissingReference {
    pub kind: String,
    pub name: String,
}

impl MissingReference {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

impl std::fmt::Display for MissingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found in Nautobot: {}", self.kind, self.name)
    }
}

impl std::error::Error for MissingReference {}
