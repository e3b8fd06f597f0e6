use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{InterfaceRecord, PortMode, VlanRecord};

use super::client::NautobotClient;
use super::types::{InterfaceVlanPatch, InterfaceWrite, NbInterface, SyncCounts, VlanWrite};

const ACTIVE_STATUS: &str = "Active";
const IP_NAMESPACE: &str = "Global";

/// Map an interface name to a Nautobot interface type
pub fn interface_type(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.starts_with("port-channel") || lower.starts_with("bundle-ether") {
        "lag"
    } else if lower.starts_with("loopback")
        || lower.starts_with("vlan")
        || lower.starts_with("tunnel")
        || lower.contains('.')
    {
        "virtual"
    } else {
        "other"
    }
}

fn port_mode_to_nautobot(mode: PortMode) -> Option<String> {
    match mode {
        PortMode::Access => Some("access".to_string()),
        PortMode::Trunk => Some("tagged".to_string()),
        PortMode::Routed => None,
    }
}

/// Create or update the parsed interfaces of a device, attaching IPv4 addresses
pub async fn push_interfaces(
    nb: &NautobotClient,
    device_id: Uuid,
    interfaces: &[InterfaceRecord],
) -> SyncCounts {
    let mut counts = SyncCounts::default();

    let status = match nb.status_id(ACTIVE_STATUS).await {
        Ok(id) => id,
        Err(e) => {
            counts.errors.push(format!("status lookup: {}", e));
            return counts;
        }
    };

    let existing = match nb.list_interfaces_by_device(device_id).await {
        Ok(list) => list,
        Err(e) => {
            counts.errors.push(format!("interface lookup: {}", e));
            return counts;
        }
    };

    // Only resolved when some interface carries an address
    let mut namespace: Option<Uuid> = None;

    for iface in interfaces {
        let body = InterfaceWrite {
            device: device_id,
            name: iface.name.clone(),
            iface_type: interface_type(&iface.name).to_string(),
            status,
            enabled: iface.enabled,
            description: iface.description.clone().unwrap_or_default(),
            mode: port_mode_to_nautobot(iface.mode),
        };

        let result = match existing.iter().find(|e| e.name == iface.name) {
            Some(found) => nb.update_interface(found.id, &body).await.map(|i| (i, false)),
            None => nb.create_interface(&body).await.map(|i| (i, true)),
        };

        let nb_iface = match result {
            Ok((nb_iface, created)) => {
                if created {
                    counts.created += 1;
                } else {
                    counts.updated += 1;
                }
                nb_iface
            }
            Err(e) => {
                counts.errors.push(format!("{}: {}", iface.name, e));
                continue;
            }
        };

        let Some(address) = &iface.ipv4_address else {
            continue;
        };

        let ns = match namespace {
            Some(ns) => ns,
            None => match nb.namespace_id(IP_NAMESPACE).await {
                Ok(ns) => {
                    namespace = Some(ns);
                    ns
                }
                Err(e) => {
                    counts.errors.push(format!("{}: ip {}: {}", iface.name, address, e));
                    continue;
                }
            },
        };

        if let Err(e) = nb.assign_ip_address(nb_iface.id, address, status, ns).await {
            counts.errors.push(format!("{}: ip {}: {}", iface.name, address, e));
        }
    }

    counts
}

/// Create or update the parsed VLANs and apply port membership to the device's interfaces
pub async fn push_vlans(nb: &NautobotClient, device_id: Uuid, vlans: &[VlanRecord]) -> SyncCounts {
    let mut counts = SyncCounts::default();

    let status = match nb.status_id(ACTIVE_STATUS).await {
        Ok(id) => id,
        Err(e) => {
            counts.errors.push(format!("status lookup: {}", e));
            return counts;
        }
    };

    let location = match nb.device_location(device_id).await {
        Ok(id) => id,
        Err(e) => {
            counts.errors.push(format!("location lookup: {}", e));
            return counts;
        }
    };

    let interfaces = match nb.list_interfaces_by_device(device_id).await {
        Ok(list) => list,
        Err(e) => {
            counts.errors.push(format!("interface lookup: {}", e));
            return counts;
        }
    };

    let mut untagged: BTreeMap<String, Uuid> = BTreeMap::new();
    let mut tagged: BTreeMap<String, Vec<Uuid>> = BTreeMap::new();

    for vlan in vlans {
        let body = VlanWrite {
            vid: vlan.id,
            name: vlan.display_name(),
            status,
            location,
        };

        let result = match nb.find_vlan(vlan.id, location).await {
            Ok(Some(found)) if found.name == body.name => Ok(found.id),
            Ok(Some(found)) => match nb.update_vlan(found.id, &body).await {
                Ok(updated) => {
                    counts.updated += 1;
                    Ok(updated.id)
                }
                Err(e) => Err(e),
            },
            Ok(None) => match nb.create_vlan(&body).await {
                Ok(created) => {
                    counts.created += 1;
                    Ok(created.id)
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let vlan_id = match result {
            Ok(id) => id,
            Err(e) => {
                counts.errors.push(format!("vlan {}: {}", vlan.id, e));
                continue;
            }
        };

        for port in &vlan.ports {
            untagged.insert(port.clone(), vlan_id);
        }
        for port in &vlan.tagged_ports {
            tagged.entry(port.clone()).or_default().push(vlan_id);
        }
    }

    for (port, vlan_id) in &untagged {
        let patch = InterfaceVlanPatch {
            mode: "access".to_string(),
            untagged_vlan: Some(*vlan_id),
            tagged_vlans: Vec::new(),
        };
        apply_membership(nb, &interfaces, port, &patch, &mut counts).await;
    }

    for (port, vlan_ids) in tagged {
        let patch = InterfaceVlanPatch {
            mode: "tagged".to_string(),
            untagged_vlan: None,
            tagged_vlans: vlan_ids,
        };
        apply_membership(nb, &interfaces, &port, &patch, &mut counts).await;
    }

    counts
}

async fn apply_membership(
    nb: &NautobotClient,
    interfaces: &[NbInterface],
    port: &str,
    patch: &InterfaceVlanPatch,
    counts: &mut SyncCounts,
) {
    let Some(iface) = interfaces.iter().find(|i| i.name == port) else {
        counts.errors.push(format!("{}: interface not found in Nautobot", port));
        return;
    };

    if let Err(e) = nb.set_interface_vlans(iface.id, patch).await {
        counts.errors.push(format!("{}: vlan membership: {}", port, e));
    }
}
