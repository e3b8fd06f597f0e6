use serde::{Deserialize, Serialize};

/// Switchport mode of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortMode {
    Access,
    Trunk,
    Routed,
}

/// Interface parsed from a running configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Primary IPv4 address in CIDR form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    pub enabled: bool,
    pub mode: PortMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_vlan: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trunk_vlans: Vec<u16>,
}

/// VLAN parsed from a running configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRecord {
    pub id: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Access ports carrying this VLAN untagged
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Trunk ports carrying this VLAN tagged
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_ports: Vec<String>,
}

impl VlanRecord {
    /// Name to use when the configuration does not set one (IOS default naming)
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("VLAN{:04}", self.id))
    }
}

/// Structured view of a running configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<InterfaceRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vlans: Vec<VlanRecord>,
}

impl ParsedConfig {
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.vlans.is_empty()
    }
}
