use regex_lite::Regex;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

use crate::models::{InterfaceRecord, ParsedConfig, PortMode, VlanRecord};

/// Line patterns recognized in an IOS-style running configuration
struct Patterns {
    interface: Regex,
    vlan: Regex,
    name: Regex,
    description: Regex,
    ip_address: Regex,
    mode: Regex,
    access_vlan: Regex,
    trunk_vlans: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex_lite::Error> {
        Ok(Self {
            interface: Regex::new(r"^interface\s+(\S+(?:\s+\S+)?)\s*$")?,
            vlan: Regex::new(r"^vlan\s+(\d[\d,\-\s]*)$")?,
            name: Regex::new(r"^\s+name\s+(.+?)\s*$")?,
            description: Regex::new(r"^\s+description\s+(.+?)\s*$")?,
            ip_address: Regex::new(
                r"^\s+ip address\s+(\d+\.\d+\.\d+\.\d+)\s+(\d+\.\d+\.\d+\.\d+)(\s+secondary)?\s*$",
            )?,
            mode: Regex::new(r"^\s+switchport mode\s+(access|trunk)\s*$")?,
            access_vlan: Regex::new(r"^\s+switchport access vlan\s+(\d+)\s*$")?,
            trunk_vlans: Regex::new(
                r"^\s+switchport trunk allowed vlan\s+(?:add\s+)?(\d[\d,\-]*)\s*$",
            )?,
        })
    }
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| match Patterns::compile() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!("Failed to compile config patterns: {}", e);
                None
            }
        })
        .as_ref()
}

/// Block currently being read
enum Block {
    None,
    Interface(PendingInterface),
    Vlan(Vec<u16>),
}

struct PendingInterface {
    name: String,
    description: Option<String>,
    ipv4_address: Option<String>,
    enabled: bool,
    mode: Option<PortMode>,
    access_vlan: Option<u16>,
    trunk_vlans: Vec<u16>,
}

impl PendingInterface {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            ipv4_address: None,
            enabled: true,
            mode: None,
            access_vlan: None,
            trunk_vlans: Vec::new(),
        }
    }

    fn finish(self) -> InterfaceRecord {
        let mode = self.mode.unwrap_or(if self.access_vlan.is_some() {
            PortMode::Access
        } else if !self.trunk_vlans.is_empty() {
            PortMode::Trunk
        } else {
            PortMode::Routed
        });

        InterfaceRecord {
            name: self.name,
            description: self.description,
            ipv4_address: self.ipv4_address,
            enabled: self.enabled,
            mode,
            access_vlan: self.access_vlan,
            trunk_vlans: self.trunk_vlans,
        }
    }
}

/// Convert a dotted netmask to a prefix length. Non-contiguous masks yield None.
pub fn mask_to_prefix(mask: &str) -> Option<u32> {
    let bits = u32::from(mask.parse::<Ipv4Addr>().ok()?);
    if bits.leading_ones() + bits.trailing_zeros() == 32 {
        Some(bits.leading_ones())
    } else {
        None
    }
}

/// Expand a VLAN list such as "10,20-22" into individual IDs.
/// Invalid entries and IDs outside 1-4094 are dropped.
pub fn expand_vlan_list(list: &str) -> Vec<u16> {
    let mut ids = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) = (start.trim().parse::<u16>(), end.trim().parse::<u16>())
                else {
                    continue;
                };
                if start > end {
                    continue;
                }
                ids.extend((start..=end).filter(|id| valid_vlan(*id)));
            }
            None => {
                if let Ok(id) = part.parse::<u16>() {
                    if valid_vlan(id) {
                        ids.push(id);
                    }
                }
            }
        }
    }
    ids
}

fn valid_vlan(id: u16) -> bool {
    (1..=4094).contains(&id)
}

/// Parse a running configuration into interfaces and VLANs.
/// Unrecognized lines are ignored; this never fails.
pub fn parse_running_config(raw: &str) -> ParsedConfig {
    let Some(p) = patterns() else {
        return ParsedConfig::default();
    };

    let mut interfaces: Vec<InterfaceRecord> = Vec::new();
    let mut vlan_names: BTreeMap<u16, Option<String>> = BTreeMap::new();
    let mut block = Block::None;

    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        let indented = line.starts_with(' ') || line.starts_with('\t');

        if !indented || line.trim().is_empty() {
            // Top-level line closes any open block
            if let Block::Interface(pending) = std::mem::replace(&mut block, Block::None) {
                interfaces.push(pending.finish());
            }

            if let Some(caps) = p.interface.captures(line) {
                block = Block::Interface(PendingInterface::new(&caps[1]));
            } else if let Some(caps) = p.vlan.captures(line) {
                let ids = expand_vlan_list(&caps[1].replace(' ', ""));
                for id in &ids {
                    vlan_names.entry(*id).or_insert(None);
                }
                block = Block::Vlan(ids);
            }
            continue;
        }

        match &mut block {
            Block::Interface(iface) => apply_interface_line(p, iface, line),
            Block::Vlan(ids) => {
                // A name only makes sense for a single-VLAN block
                if let (Some(caps), [id]) = (p.name.captures(line), ids.as_slice()) {
                    vlan_names.insert(*id, Some(caps[1].to_string()));
                }
            }
            Block::None => {}
        }
    }

    if let Block::Interface(pending) = block {
        interfaces.push(pending.finish());
    }

    let vlans = collect_vlans(vlan_names, &interfaces);
    ParsedConfig { interfaces, vlans }
}

fn apply_interface_line(p: &Patterns, iface: &mut PendingInterface, line: &str) {
    let trimmed = line.trim();
    if trimmed == "shutdown" {
        iface.enabled = false;
    } else if trimmed == "no shutdown" {
        iface.enabled = true;
    } else if trimmed == "no ip address" {
        iface.ipv4_address = None;
    } else if let Some(caps) = p.description.captures(line) {
        iface.description = Some(caps[1].to_string());
    } else if let Some(caps) = p.ip_address.captures(line) {
        if caps.get(3).is_some() {
            return; // secondary
        }
        let address = caps[1].parse::<Ipv4Addr>();
        if let (Ok(address), Some(prefix)) = (address, mask_to_prefix(&caps[2])) {
            iface.ipv4_address = Some(format!("{}/{}", address, prefix));
        }
    } else if let Some(caps) = p.mode.captures(line) {
        iface.mode = Some(if &caps[1] == "trunk" {
            PortMode::Trunk
        } else {
            PortMode::Access
        });
    } else if let Some(caps) = p.access_vlan.captures(line) {
        if let Ok(id) = caps[1].parse::<u16>() {
            if valid_vlan(id) {
                iface.access_vlan = Some(id);
            }
        }
    } else if let Some(caps) = p.trunk_vlans.captures(line) {
        for id in expand_vlan_list(&caps[1]) {
            if !iface.trunk_vlans.contains(&id) {
                iface.trunk_vlans.push(id);
            }
        }
    }
}

/// Merge declared VLANs with port membership taken from interfaces
fn collect_vlans(
    mut vlan_names: BTreeMap<u16, Option<String>>,
    interfaces: &[InterfaceRecord],
) -> Vec<VlanRecord> {
    for iface in interfaces {
        match iface.mode {
            PortMode::Access => {
                if let Some(id) = iface.access_vlan {
                    vlan_names.entry(id).or_insert(None);
                }
            }
            PortMode::Trunk => {
                for id in &iface.trunk_vlans {
                    vlan_names.entry(*id).or_insert(None);
                }
            }
            PortMode::Routed => {}
        }
    }

    vlan_names
        .into_iter()
        .map(|(id, name)| VlanRecord {
            id,
            name,
            ports: interfaces
                .iter()
                .filter(|i| i.mode == PortMode::Access && i.access_vlan == Some(id))
                .map(|i| i.name.clone())
                .collect(),
            tagged_ports: interfaces
                .iter()
                .filter(|i| i.mode == PortMode::Trunk && i.trunk_vlans.contains(&id))
                .map(|i| i.name.clone())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Building configuration...

Current configuration : 1234 bytes
!
version 12.4
hostname R1
!
vlan 10
 name USERS
!
vlan 20
 name VOICE
!
interface FastEthernet0/0
 description Uplink to ISP
 ip address 192.168.0.220 255.255.255.0
 duplex auto
 speed auto
!
interface FastEthernet0/1
 no ip address
 shutdown
!
interface FastEthernet1/0
 switchport access vlan 10
 switchport mode access
!
interface FastEthernet1/1
 switchport mode trunk
 switchport trunk allowed vlan 10,20,30-31
!
router ospf 1
 network 192.168.0.0 0.0.0.255 area 0
!
line vty 0 4
 login local
!
end
";

    #[test]
    fn test_interface_count_matches_headers() {
        let parsed = parse_running_config(SAMPLE);
        let names: Vec<&str> = parsed.interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["FastEthernet0/0", "FastEthernet0/1", "FastEthernet1/0", "FastEthernet1/1"]
        );
    }

    #[test]
    fn test_interface_addressing_and_status() {
        let parsed = parse_running_config(SAMPLE);
        let fa00 = &parsed.interfaces[0];
        assert_eq!(fa00.description.as_deref(), Some("Uplink to ISP"));
        assert_eq!(fa00.ipv4_address.as_deref(), Some("192.168.0.220/24"));
        assert!(fa00.enabled);
        assert_eq!(fa00.mode, PortMode::Routed);

        let fa01 = &parsed.interfaces[1];
        assert_eq!(fa01.ipv4_address, None);
        assert!(!fa01.enabled);
    }

    #[test]
    fn test_vlans_and_membership() {
        let parsed = parse_running_config(SAMPLE);
        let ids: Vec<u16> = parsed.vlans.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![10, 20, 30, 31]);

        let users = &parsed.vlans[0];
        assert_eq!(users.name.as_deref(), Some("USERS"));
        assert_eq!(users.ports, vec!["FastEthernet1/0"]);
        assert_eq!(users.tagged_ports, vec!["FastEthernet1/1"]);

        let v30 = &parsed.vlans[2];
        assert_eq!(v30.name, None);
        assert_eq!(v30.display_name(), "VLAN0030");
        assert!(v30.ports.is_empty());
    }

    #[test]
    fn test_unrecognized_syntax_is_absent() {
        let parsed = parse_running_config("router bgp 65000\n neighbor 1.1.1.1 remote-as 65001\nfoo bar\n");
        assert!(parsed.is_empty());
        let json = serde_json::to_value(&parsed).unwrap();
        assert!(json.get("interfaces").is_none());
        assert!(json.get("vlans").is_none());
    }

    #[test]
    fn test_malformed_input_does_not_panic() {
        let garbage = "interface\n ip address 999.1.1.1 255.255.255.0\nvlan 99999\n name X\n\u{0}\u{1}\r\n  \tinterface Gi0/0\n switchport access vlan abc\n";
        let parsed = parse_running_config(garbage);
        assert!(parsed.interfaces.is_empty());
        assert!(parsed.vlans.is_empty());
        assert!(parse_running_config("").is_empty());
    }

    #[test]
    fn test_invalid_mask_is_ignored() {
        let parsed = parse_running_config("interface Gi0/0\n ip address 10.0.0.1 255.0.255.0\n");
        assert_eq!(parsed.interfaces.len(), 1);
        assert_eq!(parsed.interfaces[0].ipv4_address, None);
    }

    #[test]
    fn test_secondary_address_keeps_primary() {
        let cfg = "interface Gi0/0\n ip address 10.0.0.1 255.255.255.252\n ip address 10.1.0.1 255.255.255.0 secondary\n";
        let parsed = parse_running_config(cfg);
        assert_eq!(parsed.interfaces[0].ipv4_address.as_deref(), Some("10.0.0.1/30"));
    }

    #[test]
    fn test_block_ends_at_top_level_line() {
        let cfg = "interface Gi0/0\nhostname R1\n description not part of the interface\n";
        let parsed = parse_running_config(cfg);
        assert_eq!(parsed.interfaces.len(), 1);
        assert_eq!(parsed.interfaces[0].description, None);
    }

    #[test]
    fn test_mask_to_prefix() {
        assert_eq!(mask_to_prefix("255.255.255.0"), Some(24));
        assert_eq!(mask_to_prefix("255.255.255.255"), Some(32));
        assert_eq!(mask_to_prefix("0.0.0.0"), Some(0));
        assert_eq!(mask_to_prefix("255.255.0.255"), None);
        assert_eq!(mask_to_prefix("not-a-mask"), None);
    }

    #[test]
    fn test_expand_vlan_list() {
        assert_eq!(expand_vlan_list("10,20-22"), vec![10, 20, 21, 22]);
        assert_eq!(expand_vlan_list("0,4095,5"), vec![5]);
        assert_eq!(expand_vlan_list("30-20,x,7"), vec![7]);
        assert!(expand_vlan_list("").is_empty());
    }

    #[test]
    fn test_vlan_range_declaration() {
        let parsed = parse_running_config("vlan 100,200-201\n name ignored\n!\n");
        let ids: Vec<u16> = parsed.vlans.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![100, 200, 201]);
        assert!(parsed.vlans.iter().all(|v| v.name.is_none()));
    }
}
